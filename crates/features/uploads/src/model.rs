use cardly_derive::api_model;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use surrealdb::types::SurrealValue;
use utoipa::ToSchema;

/// Where an upload is meant to be shown.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, IntoStaticStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UploadPurpose {
    Avatar,
    Gallery,
    Cover,
    /// Downloadable file; the only purpose that accepts PDF.
    #[default]
    Attachment,
}

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct UploadRow {
    pub uid: String,
    pub owner: String,
    pub purpose: String,
    pub content_type: String,
    pub file_name: String,
    pub size: i64,
    pub checksum: String,
    pub original_name: Option<String>,
    pub created_at: i64,
}

/// Multipart body of `POST /api/uploads`.
#[derive(Debug, Default, ToSchema)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    #[schema(value_type = Option<String>, example = "avatar")]
    pub purpose: Option<UploadPurpose>,
    /// File name as sent by the client.
    #[schema(ignore)]
    pub file_name: Option<String>,
}

// --- API models ---

#[api_model]
#[derive(Clone, PartialEq, Eq)]
pub struct Upload {
    pub id: String,
    #[schema(value_type = String, example = "avatar")]
    pub purpose: UploadPurpose,
    #[schema(example = "image/png")]
    pub content_type: String,
    pub size: i64,
    /// SHA-256 of the stored bytes, hex encoded.
    pub checksum: String,
    pub original_name: Option<String>,
    /// Public address of the file.
    pub url: String,
    pub created_at: i64,
}

#[api_model]
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct StorageUsage {
    pub used_bytes: u64,
    pub quota_bytes: u64,
    pub files: u64,
}
