//! Billing feature slice.
//!
//! Tracks one subscription per user, derives the tier in force from it, creates Stripe
//! checkout sessions and keeps local state in sync through signed webhooks. Other slices
//! ask [`Billing::effective_tier`] before enforcing limits.

mod error;
mod handlers;
mod migrations;
mod model;
mod plans;
mod service;
mod stripe;
mod webhook;

pub use crate::error::{BillingError, BillingErrorExt};
pub use crate::migrations::MIGRATIONS;
pub use crate::model::{
    BillingInterval, CheckoutRequest, CheckoutResponse, EntitlementsView, GrantRequest, Payment,
    Plan, Subscription, SubscriptionStatus, SubscriptionView, WebhookAck,
};
pub use crate::plans::{effective_tier, plan_for_price, plans, price_for};
pub use crate::stripe::{sign_payload, verify_signature};

use crate::stripe::StripeClient;
use cardly_database::Database;
use cardly_domain::config::BillingConfig;
use cardly_event_bus::EventBus;
use cardly_kernel::server::{ApiState, SliceContext};
use utoipa_axum::router::OpenApiRouter;

/// Billing feature state
#[cardly_derive::cardly_slice]
#[derive(Debug)]
pub struct Billing {
    db: Database,
    config: BillingConfig,
    events: EventBus,
    stripe: Option<StripeClient>,
}

/// Builds the billing slice. Checkout stays disabled without a provider key.
pub fn init(ctx: &SliceContext) -> Billing {
    let config = ctx.config.billing.clone();
    let stripe = config
        .stripe_secret_key
        .as_deref()
        .filter(|key| !key.is_empty())
        .map(|key| StripeClient::new(key, config.api_base.as_str()));

    if stripe.is_none() {
        tracing::warn!("Billing provider key not configured; checkout is disabled");
    }
    tracing::info!("Billing slice initialized");

    Billing::new(BillingInner {
        db: ctx.database.clone(),
        config,
        events: ctx.events.clone(),
        stripe,
    })
}

pub fn router() -> OpenApiRouter<ApiState> {
    handlers::router()
}
