use cardly_derive::api_model;
use cardly_domain::component::ComponentKind;
use cardly_domain::tier::Tier;
use serde::Deserialize;
use serde_json::Value;
use surrealdb::types::SurrealValue;
use utoipa::IntoParams;

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct CardRow {
    pub uid: String,
    pub owner: String,
    pub slug: String,
    pub title: String,
    pub headline: Option<String>,
    pub accent_color: Option<String>,
    pub published: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct ComponentRow {
    pub uid: String,
    pub card: String,
    pub kind: String,
    pub position: i64,
    pub enabled: bool,
    pub title: Option<String>,
    pub data: String,
    pub created_at: i64,
    pub updated_at: i64,
}

// --- API models ---

#[api_model]
#[derive(Clone, PartialEq, Eq)]
pub struct Card {
    pub id: String,
    pub owner: String,
    #[schema(example = "ada-lovelace")]
    pub slug: String,
    pub title: String,
    pub headline: Option<String>,
    #[schema(example = "#3355ff")]
    pub accent_color: Option<String>,
    pub published: bool,
    /// Public page address.
    pub url: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[api_model]
#[derive(Clone, PartialEq)]
pub struct Component {
    pub id: String,
    pub card: String,
    #[schema(value_type = String, example = "links")]
    pub kind: ComponentKind,
    pub position: u32,
    pub enabled: bool,
    pub title: Option<String>,
    #[schema(value_type = Object)]
    pub content: Value,
    pub created_at: i64,
    pub updated_at: i64,
}

#[api_model]
#[derive(Clone, PartialEq)]
pub struct CardDetail {
    pub card: Card,
    pub components: Vec<Component>,
}

#[api_model]
pub struct CreateCardRequest {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub accent_color: Option<String>,
}

/// Absent fields stay unchanged; an empty `headline` or `accentColor` clears it.
#[api_model]
#[derive(Default)]
pub struct UpdateCardRequest {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub accent_color: Option<String>,
}

#[api_model]
pub struct AddComponentRequest {
    #[schema(value_type = String, example = "links")]
    pub kind: ComponentKind,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "empty_object")]
    #[schema(value_type = Object)]
    pub content: Value,
}

#[api_model]
#[derive(Default)]
pub struct UpdateComponentRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub content: Option<Value>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

#[api_model]
pub struct ReorderRequest {
    /// Every component id of the card, in the new order.
    pub order: Vec<String>,
}

#[api_model]
#[derive(Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    #[schema(value_type = String)]
    pub kind: ComponentKind,
    pub allowed: bool,
    #[schema(value_type = String)]
    pub min_tier: Tier,
}

#[api_model]
#[derive(Clone, PartialEq)]
pub struct PublicComponent {
    #[schema(value_type = String)]
    pub kind: ComponentKind,
    pub title: Option<String>,
    #[schema(value_type = Object)]
    pub content: Value,
}

/// A published card as visitors see it.
#[api_model]
#[derive(Clone, PartialEq)]
pub struct PublicCard {
    pub slug: String,
    pub title: String,
    pub headline: Option<String>,
    pub accent_color: Option<String>,
    /// Whether the "Powered by" footer is shown.
    pub branding: bool,
    pub components: Vec<PublicComponent>,
}

/// What [`Cards::enforce_entitlements`](crate::Cards::enforce_entitlements) changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnforcementReport {
    pub disabled_components: Vec<String>,
    pub unpublished_cards: Vec<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VisitQuery {
    /// Anonymous visitor session used for unique-visitor counts.
    pub session: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OutboundQuery {
    /// Destination; must be one of the card's published links.
    pub url: String,
    pub session: Option<String>,
}

pub(crate) fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}
