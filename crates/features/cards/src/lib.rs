//! Cards feature slice.
//!
//! Owners build cards from ordered components. What they may add depends on the tier in
//! force (see [`cardly_domain::tier::Entitlements`]); when the tier drops, the
//! `SubscriptionChanged` listener switches off whatever no longer fits. Published cards are
//! served as HTML pages, JSON and vCards.

mod content;
mod enforcement;
mod error;
mod handlers;
mod migrations;
mod model;
mod public;
mod render;
mod service;
mod vcard;

pub use crate::content::{FieldType, FormField, MAX_CONTENT_BYTES, form_fields};
pub use crate::error::{CardsError, CardsErrorExt};
pub use crate::migrations::MIGRATIONS;
pub use crate::model::{
    AddComponentRequest, Card, CardDetail, CatalogEntry, Component, CreateCardRequest,
    EnforcementReport, OutboundQuery, PublicCard, PublicComponent, ReorderRequest,
    UpdateCardRequest, UpdateComponentRequest, VisitQuery,
};
pub use crate::vcard::build as build_vcard;

use cardly_billing::Billing;
use cardly_database::Database;
use cardly_domain::config::ServerConfig;
use cardly_event_bus::EventBus;
use cardly_kernel::server::{ApiState, SliceContext};
use cardly_settings::Settings;
use utoipa_axum::router::OpenApiRouter;

/// Cards feature state
#[cardly_derive::cardly_slice]
#[derive(Debug)]
pub struct Cards {
    db: Database,
    billing: Billing,
    settings: Settings,
    events: EventBus,
    public: ServerConfig,
}

/// Builds the cards slice. Call [`Cards::listen`] afterwards to enforce tier changes.
pub fn init(ctx: &SliceContext, billing: Billing, settings: Settings) -> Cards {
    tracing::info!("Cards slice initialized");
    Cards::new(CardsInner {
        db: ctx.database.clone(),
        billing,
        settings,
        events: ctx.events.clone(),
        public: ctx.config.server.clone(),
    })
}

pub fn router() -> OpenApiRouter<ApiState> {
    handlers::router()
}
