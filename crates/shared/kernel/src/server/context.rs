use crate::mail::Mailer;
use cardly_database::Database;
use cardly_domain::config::ApiConfig;
use cardly_event_bus::EventBus;

/// Infrastructure handed to each slice's `init`.
#[derive(Debug, Clone)]
pub struct SliceContext {
    pub config: ApiConfig,
    pub database: Database,
    pub events: EventBus,
    pub mailer: Mailer,
}
