//! NFC feature slice. Physical tags carry a URL ending in their UID; a tap resolves the
//! UID to the linked card and redirects there.

mod error;
mod handlers;
mod migrations;
mod model;
mod service;
pub mod tag_uid;

pub use crate::error::{NfcError, NfcErrorExt};
pub use crate::migrations::MIGRATIONS;
pub use crate::model::{NfcTag, RegisterTagRequest, UpdateTagRequest};
pub use crate::service::MAX_LABEL_CHARS;

use cardly_billing::Billing;
use cardly_cards::Cards;
use cardly_database::Database;
use cardly_event_bus::EventBus;
use cardly_kernel::server::{ApiState, SliceContext};
use utoipa_axum::router::OpenApiRouter;

/// NFC feature state
#[cardly_derive::cardly_slice]
#[derive(Debug)]
pub struct Nfc {
    db: Database,
    cards: Cards,
    billing: Billing,
    events: EventBus,
}

pub fn init(ctx: &SliceContext, cards: Cards, billing: Billing) -> Nfc {
    tracing::info!("NFC slice initialized");
    Nfc::new(NfcInner { db: ctx.database.clone(), cards, billing, events: ctx.events.clone() })
}

pub fn router() -> OpenApiRouter<ApiState> {
    handlers::router()
}
