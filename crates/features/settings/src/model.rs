use cardly_derive::api_model;
use serde_json::Value;
use surrealdb::types::SurrealValue;

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct SettingRow {
    pub name: String,
    pub payload: String,
    pub public: bool,
    pub updated_at: i64,
    pub updated_by: Option<String>,
}

/// A system setting.
#[api_model]
#[derive(Clone, PartialEq)]
pub struct Setting {
    pub key: String,
    #[schema(value_type = Object)]
    pub value: Value,
    pub public: bool,
    pub updated_at: i64,
    pub updated_by: Option<String>,
}

#[api_model]
pub struct PutSettingRequest {
    #[schema(value_type = Object)]
    pub value: Value,
    #[serde(default)]
    pub public: bool,
}
