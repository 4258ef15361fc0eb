use cardly_derive::api_model;
use surrealdb::types::SurrealValue;

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct TagRow {
    pub uid: String,
    pub owner: String,
    pub card: String,
    pub label: Option<String>,
    pub active: bool,
    pub tap_count: i64,
    pub last_tapped_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<TagRow> for NfcTag {
    fn from(row: TagRow) -> Self {
        Self {
            uid: row.uid,
            card: row.card,
            label: row.label,
            active: row.active,
            tap_count: row.tap_count,
            last_tapped_at: row.last_tapped_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// --- API models ---

#[api_model]
#[derive(Clone, PartialEq, Eq)]
pub struct NfcTag {
    /// Normalized hex UID.
    #[schema(example = "04A22BC15E8000")]
    pub uid: String,
    pub card: String,
    pub label: Option<String>,
    pub active: bool,
    pub tap_count: i64,
    pub last_tapped_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[api_model]
pub struct RegisterTagRequest {
    #[schema(example = "04:A2:2B:C1:5E:80:00")]
    pub uid: String,
    pub card: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[api_model]
#[derive(Default)]
pub struct UpdateTagRequest {
    #[serde(default)]
    pub card: Option<String>,
    /// Blank clears the label.
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}
