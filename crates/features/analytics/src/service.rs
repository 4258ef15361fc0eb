use crate::Analytics;
use crate::error::AnalyticsError;
use crate::model::{
    Counts, DailyCounts, EventKind, EventRow, IngestEvent, IngestResponse, Summary, TargetCount,
};
use cardly_cards::Card;
use cardly_kernel::time;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

pub const MAX_BATCH: usize = 100;
/// Offline events older than this are dropped on ingest.
pub const MAX_EVENT_AGE: i64 = 7 * time::DAY;
pub const DEFAULT_SUMMARY_DAYS: u32 = 30;
pub const TOP_TARGETS: usize = 10;

const MAX_TEXT_CHARS: usize = 2_048;

const EVENT_FIELDS: &str = "card, owner, kind, target, session, occurred_at";

/// Future timestamps become `now`; `None` means the event is too old to keep.
pub(crate) fn clamp_timestamp(occurred_at: Option<i64>, now: i64) -> Option<i64> {
    match occurred_at {
        None => Some(now),
        Some(at) if at > now => Some(now),
        Some(at) if now.saturating_sub(at) > MAX_EVENT_AGE => None,
        Some(at) => Some(at),
    }
}

fn bounded(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(|v| v.chars().take(MAX_TEXT_CHARS).collect())
}

/// Aggregates `rows` into a summary of the `days` days ending with day index `today`.
pub(crate) fn summarize(card: &str, rows: &[EventRow], today: i64, days: u32) -> Summary {
    let first_day = today - i64::from(days) + 1;
    let mut totals = Counts::default();
    let mut per_day: HashMap<i64, Counts> = HashMap::new();
    let mut targets: HashMap<&str, u64> = HashMap::new();
    let mut sessions: HashSet<&str> = HashSet::new();

    for row in rows {
        let Ok(kind) = row.kind.parse::<EventKind>() else { continue };
        let day = time::day_index(row.occurred_at);
        if day < first_day || day > today {
            continue;
        }
        totals.add(kind);
        per_day.entry(day).or_default().add(kind);
        if let Some(session) = row.session.as_deref() {
            sessions.insert(session);
        }
        if let (EventKind::Click, Some(target)) = (kind, row.target.as_deref()) {
            *targets.entry(target).or_default() += 1;
        }
    }

    let series = (first_day..=today)
        .map(|day| DailyCounts {
            date: time::day_label(day),
            counts: per_day.get(&day).copied().unwrap_or_default(),
        })
        .collect();

    let mut top_targets: Vec<TargetCount> = targets
        .into_iter()
        .map(|(target, clicks)| TargetCount { target: target.to_owned(), clicks })
        .collect();
    top_targets.sort_by(|a, b| b.clicks.cmp(&a.clicks).then_with(|| a.target.cmp(&b.target)));
    top_targets.truncate(TOP_TARGETS);

    Summary {
        card: card.to_owned(),
        days,
        totals,
        series,
        top_targets,
        unique_sessions: u64::try_from(sessions.len()).unwrap_or(u64::MAX),
    }
}

impl Analytics {
    /// Stores one event for `card`.
    pub async fn record(
        &self,
        card: &str,
        owner: &str,
        kind: EventKind,
        target: Option<String>,
        session: Option<String>,
        occurred_at: i64,
    ) -> Result<(), AnalyticsError> {
        let row = EventRow {
            card: card.to_owned(),
            owner: owner.to_owned(),
            kind: kind.to_string(),
            target: bounded(target),
            session: bounded(session),
            occurred_at,
        };
        self.db.query("CREATE card_event CONTENT $row").bind(("row", row)).await?.check()?;
        Ok(())
    }

    /// Accepts a batch of client-side events, typically flushed from an offline queue.
    /// Events for unknown or unpublished cards and events older than a week are rejected.
    pub async fn ingest(&self, events: Vec<IngestEvent>) -> Result<IngestResponse, AnalyticsError> {
        if events.len() > MAX_BATCH {
            return Err(AnalyticsError::validation(format!("a batch holds at most {MAX_BATCH} events")));
        }

        let now = time::now();
        let mut cards: HashMap<String, Option<Card>> = HashMap::new();
        let mut rows = Vec::with_capacity(events.len());
        let mut rejected = 0u32;

        for event in events {
            let Some(occurred_at) = clamp_timestamp(event.occurred_at, now) else {
                rejected += 1;
                continue;
            };
            if !cards.contains_key(&event.slug) {
                let card = self.cards.find_by_slug(&event.slug).await?.filter(|c| c.published);
                cards.insert(event.slug.clone(), card);
            }
            let Some(Some(card)) = cards.get(&event.slug) else {
                rejected += 1;
                continue;
            };
            rows.push(EventRow {
                card: card.id.clone(),
                owner: card.owner.clone(),
                kind: event.kind.to_string(),
                target: bounded(event.target),
                session: bounded(event.session),
                occurred_at,
            });
        }

        let accepted = u32::try_from(rows.len()).unwrap_or(u32::MAX);
        if !rows.is_empty() {
            self.db
                .query(
                    "BEGIN TRANSACTION;
                    FOR $row IN $rows { CREATE card_event CONTENT $row; };
                    COMMIT TRANSACTION;",
                )
                .bind(("rows", rows))
                .await?
                .check()?;
        }
        debug!(accepted, rejected, "Event batch ingested");
        Ok(IngestResponse { accepted, rejected })
    }

    /// Totals, a zero-filled daily series, top click targets and unique sessions for
    /// one of the owner's cards. `days` is clamped to the plan's history.
    pub async fn summary(&self, owner: &str, card: &str, days: Option<u32>) -> Result<Summary, AnalyticsError> {
        let card = self.cards.find_owned(owner, card).await.map_err(AnalyticsError::from_lookup)?;
        let history = self.billing.entitlements(owner).await?.analytics_history_days;
        let days = days.unwrap_or(DEFAULT_SUMMARY_DAYS).clamp(1, history.max(1));

        let today = time::day_index(time::now());
        let since = (today - i64::from(days) + 1) * time::DAY;
        let rows: Vec<EventRow> = self
            .db
            .query(format!("SELECT {EVENT_FIELDS} FROM card_event WHERE card = $card AND occurred_at >= $since"))
            .bind(("card", card.id.clone()))
            .bind(("since", since))
            .await?
            .take(0)?;

        info!(card = %card.id, days, events = rows.len(), "Analytics summary built");
        Ok(summarize(&card.id, &rows, today, days))
    }
}
