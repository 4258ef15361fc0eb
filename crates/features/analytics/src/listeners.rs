//! Records events published by other slices.

use crate::Analytics;
use crate::error::AnalyticsError;
use crate::model::EventKind;
use cardly_domain::events::{CardTapped, CardViewed, ContactCaptured, LinkClicked};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::error;

impl Analytics {
    /// Starts one listener per recorded event type.
    pub fn listen(&self) -> Result<Vec<JoinHandle<()>>, AnalyticsError> {
        let bus = self.events.clone();
        let analytics = self.clone();
        let views = bus.listen::<CardViewed, _, _>("analytics.views", move |event: Arc<CardViewed>| {
            let analytics = analytics.clone();
            async move {
                let result = analytics
                    .record(&event.card, &event.owner, EventKind::View, None, event.session.clone(), event.occurred_at)
                    .await;
                log_failure(result, EventKind::View);
            }
        })?;

        let analytics = self.clone();
        let taps = bus.listen::<CardTapped, _, _>("analytics.taps", move |event: Arc<CardTapped>| {
            let analytics = analytics.clone();
            async move {
                let result = analytics
                    .record(&event.card, &event.owner, EventKind::Tap, Some(event.tag.clone()), None, event.occurred_at)
                    .await;
                log_failure(result, EventKind::Tap);
            }
        })?;

        let analytics = self.clone();
        let clicks = bus.listen::<LinkClicked, _, _>("analytics.clicks", move |event: Arc<LinkClicked>| {
            let analytics = analytics.clone();
            async move {
                let result = analytics
                    .record(
                        &event.card,
                        &event.owner,
                        EventKind::Click,
                        Some(event.target.clone()),
                        event.session.clone(),
                        event.occurred_at,
                    )
                    .await;
                log_failure(result, EventKind::Click);
            }
        })?;

        let analytics = self.clone();
        let contacts = bus.listen::<ContactCaptured, _, _>("analytics.contacts", move |event: Arc<ContactCaptured>| {
            let analytics = analytics.clone();
            async move {
                let result = analytics
                    .record(&event.card, &event.owner, EventKind::Contact, None, None, event.occurred_at)
                    .await;
                log_failure(result, EventKind::Contact);
            }
        })?;

        Ok(vec![views, taps, clicks, contacts])
    }
}

fn log_failure(result: Result<(), AnalyticsError>, kind: EventKind) {
    if let Err(err) = result {
        error!(kind = %kind, error = %err, "Failed to record card event");
    }
}
