use cardly_derive::api_model;
use cardly_domain::tier::{Entitlements, Tier};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use surrealdb::types::SurrealValue;
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, IntoStaticStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BillingInterval {
    Monthly,
    Yearly,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, IntoStaticStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Canceled,
    Incomplete,
}

impl SubscriptionStatus {
    /// Maps a provider status onto the statuses tracked here.
    #[must_use]
    pub fn from_provider(status: &str) -> Self {
        match status {
            "active" => Self::Active,
            "trialing" => Self::Trialing,
            "past_due" | "unpaid" => Self::PastDue,
            "incomplete" => Self::Incomplete,
            _ => Self::Canceled,
        }
    }
}

/// A user's subscription as tracked locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub owner: String,
    pub tier: Tier,
    pub status: SubscriptionStatus,
    pub interval: Option<BillingInterval>,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
    pub current_period_end: Option<i64>,
    pub cancel_at_period_end: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct SubscriptionRow {
    pub owner: String,
    pub tier: String,
    pub status: String,
    pub billing_interval: Option<String>,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
    pub current_period_end: Option<i64>,
    pub cancel_at_period_end: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<&Subscription> for SubscriptionRow {
    fn from(sub: &Subscription) -> Self {
        Self {
            owner: sub.owner.clone(),
            tier: sub.tier.as_str().to_owned(),
            status: sub.status.to_string(),
            billing_interval: sub.interval.map(|i| i.to_string()),
            customer_id: sub.customer_id.clone(),
            subscription_id: sub.subscription_id.clone(),
            current_period_end: sub.current_period_end,
            cancel_at_period_end: sub.cancel_at_period_end,
            created_at: sub.created_at,
            updated_at: sub.updated_at,
        }
    }
}

impl From<SubscriptionRow> for Subscription {
    fn from(row: SubscriptionRow) -> Self {
        Self {
            tier: row.tier.parse().unwrap_or(Tier::Free),
            status: row.status.parse().unwrap_or(SubscriptionStatus::Canceled),
            interval: row.billing_interval.and_then(|i| i.parse().ok()),
            owner: row.owner,
            customer_id: row.customer_id,
            subscription_id: row.subscription_id,
            current_period_end: row.current_period_end,
            cancel_at_period_end: row.cancel_at_period_end,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct PaymentRow {
    pub uid: String,
    pub owner: String,
    pub invoice_id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct WebhookEventRow {
    pub event_id: String,
    pub event_type: String,
    pub processed_at: i64,
}

// --- API models ---

#[api_model]
#[derive(Clone, PartialEq, Eq)]
pub struct EntitlementsView {
    pub component_kinds: Vec<String>,
    pub max_components_per_card: u32,
    pub max_cards: u32,
    pub max_nfc_tags: u32,
    pub analytics_history_days: u32,
    pub storage_quota_bytes: u64,
    pub experiments: bool,
    pub remove_branding: bool,
}

impl From<Entitlements> for EntitlementsView {
    fn from(e: Entitlements) -> Self {
        Self {
            component_kinds: e.component_kinds.kinds().map(|k| k.as_str().to_owned()).collect(),
            max_components_per_card: e.max_components_per_card,
            max_cards: e.max_cards,
            max_nfc_tags: e.max_nfc_tags,
            analytics_history_days: e.analytics_history_days,
            storage_quota_bytes: e.storage_quota_bytes,
            experiments: e.experiments,
            remove_branding: e.remove_branding,
        }
    }
}

#[api_model]
#[derive(Clone, PartialEq, Eq)]
pub struct Plan {
    #[schema(value_type = String, example = "PRO")]
    pub tier: Tier,
    pub name: String,
    /// Price per month in cents.
    pub monthly_cents: u32,
    /// Price per year in cents.
    pub yearly_cents: u32,
    pub entitlements: EntitlementsView,
}

#[api_model]
#[derive(Clone, PartialEq, Eq)]
pub struct SubscriptionView {
    /// Subscribed tier, regardless of payment state.
    #[schema(value_type = String)]
    pub tier: Tier,
    /// Tier currently in force.
    #[schema(value_type = String)]
    pub effective_tier: Tier,
    pub status: Option<SubscriptionStatus>,
    pub interval: Option<BillingInterval>,
    pub current_period_end: Option<i64>,
    pub cancel_at_period_end: bool,
    pub entitlements: EntitlementsView,
}

#[api_model]
pub struct CheckoutRequest {
    #[schema(value_type = String, example = "PRO")]
    pub tier: Tier,
    pub interval: BillingInterval,
}

#[api_model]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: String,
}

#[api_model]
#[derive(Clone, PartialEq, Eq)]
pub struct Payment {
    pub id: String,
    pub invoice_id: String,
    /// Amount in the smallest currency unit.
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub created_at: i64,
}

impl From<PaymentRow> for Payment {
    fn from(row: PaymentRow) -> Self {
        Self {
            id: row.uid,
            invoice_id: row.invoice_id,
            amount: row.amount,
            currency: row.currency,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

#[api_model]
pub struct GrantRequest {
    /// User id receiving the plan.
    pub user: String,
    #[schema(value_type = String, example = "PREMIUM")]
    pub tier: Tier,
    /// Length of the grant in days.
    pub days: u32,
}

#[api_model]
pub struct WebhookAck {
    pub received: bool,
    /// `false` when the event id was already processed.
    pub processed: bool,
}
