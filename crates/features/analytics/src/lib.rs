//! Analytics feature slice.
//!
//! Card events arrive two ways: from the bus (views, taps, link clicks and contacts
//! raised by other slices) and in batches from clients that queued them while offline.
//! Summaries feed the owner's dashboard charts.

mod error;
mod handlers;
mod listeners;
mod migrations;
mod model;
mod service;

pub use crate::error::{AnalyticsError, AnalyticsErrorExt};
pub use crate::migrations::MIGRATIONS;
pub use crate::model::{
    Counts, DailyCounts, EventKind, IngestEvent, IngestRequest, IngestResponse, Summary,
    SummaryQuery, TargetCount,
};
pub use crate::service::{DEFAULT_SUMMARY_DAYS, MAX_BATCH, MAX_EVENT_AGE, TOP_TARGETS};

use cardly_billing::Billing;
use cardly_cards::Cards;
use cardly_database::Database;
use cardly_event_bus::EventBus;
use cardly_kernel::server::{ApiState, SliceContext};
use utoipa_axum::router::OpenApiRouter;

/// Analytics feature state
#[cardly_derive::cardly_slice]
#[derive(Debug)]
pub struct Analytics {
    db: Database,
    cards: Cards,
    billing: Billing,
    events: EventBus,
}

/// Builds the analytics slice. Call [`Analytics::listen`] to record bus events.
pub fn init(ctx: &SliceContext, cards: Cards, billing: Billing) -> Analytics {
    tracing::info!("Analytics slice initialized");
    Analytics::new(AnalyticsInner { db: ctx.database.clone(), cards, billing, events: ctx.events.clone() })
}

pub fn router() -> OpenApiRouter<ApiState> {
    handlers::router()
}
