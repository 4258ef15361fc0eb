//! Contacts feature slice.
//!
//! Visitors leave their details through the `form` component of a published card. The
//! owner gets an e-mail, sees the submissions in an inbox and can export them as CSV.

mod error;
mod export;
mod handlers;
mod migrations;
mod model;
mod service;

pub use crate::error::{ContactsError, ContactsErrorExt};
pub use crate::export::CSV_CONTENT_TYPE;
pub use crate::migrations::MIGRATIONS;
pub use crate::model::{CaptureRequest, Contact, ContactQuery, ContactSource, MarkReadRequest};
pub use crate::service::MAX_FIELD_CHARS;

use cardly_cards::Cards;
use cardly_database::Database;
use cardly_domain::config::ServerConfig;
use cardly_event_bus::EventBus;
use cardly_identity::Identity;
use cardly_kernel::mail::Mailer;
use cardly_kernel::server::{ApiState, SliceContext};
use utoipa_axum::router::OpenApiRouter;

/// Contacts feature state
#[cardly_derive::cardly_slice]
#[derive(Debug)]
pub struct Contacts {
    db: Database,
    cards: Cards,
    identity: Identity,
    events: EventBus,
    mailer: Mailer,
    public: ServerConfig,
}

pub fn init(ctx: &SliceContext, cards: Cards, identity: Identity) -> Contacts {
    tracing::info!("Contacts slice initialized");
    Contacts::new(ContactsInner {
        db: ctx.database.clone(),
        cards,
        identity,
        events: ctx.events.clone(),
        mailer: ctx.mailer.clone(),
        public: ctx.config.server.clone(),
    })
}

pub fn router() -> OpenApiRouter<ApiState> {
    handlers::router()
}
