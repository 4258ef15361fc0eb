use cardly_derive::api_model;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use strum::{Display, EnumString, IntoStaticStr};
use surrealdb::types::SurrealValue;
use utoipa::{IntoParams, ToSchema};

/// How a contact reached the owner.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, IntoStaticStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ContactSource {
    /// Submitted through a card's form component.
    #[default]
    Form,
    /// Left by a visitor swapping details with the card owner.
    Exchange,
}

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct ContactRow {
    pub uid: String,
    pub card: String,
    pub owner: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub fields: String,
    pub source: String,
    pub is_read: bool,
    pub created_at: i64,
}

// --- API models ---

#[api_model]
#[derive(Clone, PartialEq)]
pub struct Contact {
    pub id: String,
    pub card: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Every submitted form value, keyed by field name.
    #[schema(value_type = Object)]
    pub fields: Value,
    #[schema(value_type = String, example = "form")]
    pub source: ContactSource,
    pub read: bool,
    pub created_at: i64,
}

#[api_model]
pub struct CaptureRequest {
    pub fields: BTreeMap<String, String>,
    /// Honeypot; real visitors leave it empty.
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "form")]
    pub source: Option<ContactSource>,
}

#[api_model]
pub struct MarkReadRequest {
    pub read: bool,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ContactQuery {
    /// Only contacts captured on this card.
    pub card: Option<String>,
    /// Only contacts not yet marked as read.
    #[serde(default)]
    pub unread: bool,
}
