//! Uploads feature slice. Files are sniffed by content, checked against the owner's
//! storage quota and written to sandboxed storage under the owner's namespace.

mod error;
mod handlers;
mod migrations;
mod model;
mod service;
pub mod sniff;

pub use crate::error::{UploadsError, UploadsErrorExt};
pub use crate::migrations::MIGRATIONS;
pub use crate::model::{StorageUsage, Upload, UploadForm, UploadPurpose};
pub use crate::service::{MAX_NAME_CHARS, sanitize_name};

use cardly_billing::Billing;
use cardly_database::Database;
use cardly_domain::config::ServerConfig;
use cardly_kernel::server::{ApiState, SliceContext};
use cardly_storage::Storage;
use utoipa_axum::router::OpenApiRouter;

/// Uploads feature state
#[cardly_derive::cardly_slice]
#[derive(Debug)]
pub struct Uploads {
    db: Database,
    storage: Storage,
    billing: Billing,
    public: ServerConfig,
    max_bytes: usize,
}

/// Opens the storage root from `storage.data_dir` and builds the slice.
///
/// # Errors
/// The storage root cannot be created or resolved.
pub async fn init(ctx: &SliceContext, billing: Billing) -> Result<Uploads, UploadsError> {
    let storage = Storage::builder()
        .root(ctx.config.storage.data_dir.clone())
        .connect()
        .await
        .context("Opening upload storage")?;
    tracing::info!(root = %storage.root().display(), "Uploads slice initialized");
    Ok(Uploads::new(UploadsInner {
        db: ctx.database.clone(),
        storage,
        billing,
        public: ctx.config.server.clone(),
        max_bytes: ctx.config.server.max_upload_bytes,
    }))
}

pub fn router() -> OpenApiRouter<ApiState> {
    handlers::router()
}
