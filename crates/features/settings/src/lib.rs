//! Settings feature slice.
//!
//! Admin-managed key/value settings with JSON values. Other slices read them through the
//! typed getters on [`Settings`] (for example `registration.open`).

mod error;
mod handlers;
mod migrations;
mod model;
mod service;

pub use crate::error::{SettingsError, SettingsErrorExt};
pub use crate::migrations::MIGRATIONS;
pub use crate::model::{PutSettingRequest, Setting};
pub use crate::service::{MAX_VALUE_BYTES, is_valid_key};

use cardly_database::Database;
use cardly_kernel::server::{ApiState, SliceContext};
use utoipa_axum::router::OpenApiRouter;

/// Settings feature state
#[cardly_derive::cardly_slice]
#[derive(Debug)]
pub struct Settings {
    db: Database,
}

/// Builds the settings slice.
pub fn init(ctx: &SliceContext) -> Settings {
    tracing::info!("Settings slice initialized");
    Settings::new(SettingsInner { db: ctx.database.clone() })
}

pub fn router() -> OpenApiRouter<ApiState> {
    handlers::router()
}
