use cardly_derive::api_model;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use surrealdb::types::SurrealValue;
use utoipa::{IntoParams, ToSchema};

/// What a visitor did with a card.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, IntoStaticStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EventKind {
    View,
    Tap,
    Click,
    Share,
    Vcard,
    Contact,
}

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct EventRow {
    pub card: String,
    pub owner: String,
    pub kind: String,
    pub target: Option<String>,
    pub session: Option<String>,
    pub occurred_at: i64,
}

// --- API models ---

#[api_model]
#[derive(Clone)]
pub struct IngestEvent {
    pub slug: String,
    #[schema(value_type = String, example = "share")]
    pub kind: EventKind,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub session: Option<String>,
    /// Unix seconds when the client recorded the event; now when absent.
    #[serde(default)]
    pub occurred_at: Option<i64>,
}

#[api_model]
pub struct IngestRequest {
    pub events: Vec<IngestEvent>,
}

#[api_model]
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct IngestResponse {
    pub accepted: u32,
    pub rejected: u32,
}

/// Event counts by kind.
#[api_model]
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub view: u64,
    pub tap: u64,
    pub click: u64,
    pub share: u64,
    pub vcard: u64,
    pub contact: u64,
}

impl Counts {
    pub(crate) fn add(&mut self, kind: EventKind) {
        let slot = match kind {
            EventKind::View => &mut self.view,
            EventKind::Tap => &mut self.tap,
            EventKind::Click => &mut self.click,
            EventKind::Share => &mut self.share,
            EventKind::Vcard => &mut self.vcard,
            EventKind::Contact => &mut self.contact,
        };
        *slot += 1;
    }

    #[must_use]
    pub const fn total(&self) -> u64 {
        self.view + self.tap + self.click + self.share + self.vcard + self.contact
    }
}

#[api_model]
#[derive(Clone, PartialEq, Eq)]
pub struct DailyCounts {
    #[schema(example = "2026-01-31")]
    pub date: String,
    pub counts: Counts,
}

#[api_model]
#[derive(Clone, PartialEq, Eq)]
pub struct TargetCount {
    pub target: String,
    pub clicks: u64,
}

#[api_model]
#[derive(Clone, PartialEq, Eq)]
pub struct Summary {
    pub card: String,
    /// Days covered after clamping to the plan's history limit.
    pub days: u32,
    pub totals: Counts,
    /// One entry per day, oldest first, including days without events.
    pub series: Vec<DailyCounts>,
    pub top_targets: Vec<TargetCount>,
    pub unique_sessions: u64,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SummaryQuery {
    /// Days to cover, 30 by default.
    pub days: Option<u32>,
}
