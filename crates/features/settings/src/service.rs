use crate::error::SettingsError;
use crate::model::{Setting, SettingRow};
use crate::Settings;
use cardly_kernel::time;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Serialized values above this size are rejected.
pub const MAX_VALUE_BYTES: usize = 8 * 1024;
pub const MAX_KEY_LENGTH: usize = 64;

const SELECT: &str = "SELECT name, payload, public, updated_at, updated_by FROM setting";

/// `[a-z0-9_.]{1,64}`.
#[must_use]
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= MAX_KEY_LENGTH
        && key.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'.')
}

fn validate_key(key: &str) -> Result<(), SettingsError> {
    if is_valid_key(key) {
        Ok(())
    } else {
        Err(SettingsError::Validation {
            message: format!("invalid setting key '{key}'").into(),
            context: Some("keys use lowercase letters, digits, '_' and '.'".into()),
        })
    }
}

impl SettingRow {
    fn into_setting(self) -> Result<Setting, SettingsError> {
        Ok(Setting {
            value: serde_json::from_str(&self.payload)?,
            key: self.name,
            public: self.public,
            updated_at: self.updated_at,
            updated_by: self.updated_by,
        })
    }
}

impl Settings {
    pub async fn list(&self) -> Result<Vec<Setting>, SettingsError> {
        let rows: Vec<SettingRow> =
            self.db.query(format!("{SELECT} ORDER BY name")).await?.take(0)?;
        rows.into_iter().map(SettingRow::into_setting).collect()
    }

    /// Settings flagged `public`, safe to expose without authentication.
    pub async fn public_settings(&self) -> Result<Vec<Setting>, SettingsError> {
        let rows: Vec<SettingRow> = self
            .db
            .query(format!("{SELECT} WHERE public = true ORDER BY name"))
            .await?
            .take(0)?;
        rows.into_iter().map(SettingRow::into_setting).collect()
    }

    pub async fn get(&self, key: &str) -> Result<Option<Setting>, SettingsError> {
        let rows: Vec<SettingRow> = self
            .db
            .query(format!("{SELECT} WHERE name = $name LIMIT 1"))
            .bind(("name", key.to_owned()))
            .await?
            .take(0)?;
        rows.into_iter().next().map(SettingRow::into_setting).transpose()
    }

    /// Creates or replaces a setting.
    pub async fn put(
        &self,
        key: &str,
        value: Value,
        public: bool,
        updated_by: Option<&str>,
    ) -> Result<Setting, SettingsError> {
        validate_key(key)?;
        let payload = serde_json::to_string(&value)?;
        if payload.len() > MAX_VALUE_BYTES {
            return Err(SettingsError::Validation {
                message: format!("setting value exceeds {MAX_VALUE_BYTES} bytes").into(),
                context: None,
            });
        }

        let row = SettingRow {
            name: key.to_owned(),
            payload,
            public,
            updated_at: time::now(),
            updated_by: updated_by.map(str::to_owned),
        };

        let exists = self.get(key).await?.is_some();
        let query = if exists {
            "UPDATE setting SET payload = $row.payload, public = $row.public, \
             updated_at = $row.updated_at, updated_by = $row.updated_by WHERE name = $row.name"
        } else {
            "CREATE setting CONTENT $row"
        };
        self.db.query(query).bind(("row", row.clone())).await?.check()?;

        info!(key, public, "Setting stored");
        row.into_setting()
    }

    pub async fn delete(&self, key: &str) -> Result<(), SettingsError> {
        if self.get(key).await?.is_none() {
            return Err(SettingsError::NotFound {
                message: format!("setting '{key}' not found").into(),
                context: None,
            });
        }
        self.db
            .query("DELETE setting WHERE name = $name")
            .bind(("name", key.to_owned()))
            .await?
            .check()?;
        info!(key, "Setting deleted");
        Ok(())
    }

    /// Reads a boolean setting. Missing keys and non-boolean values yield `default`;
    /// read failures are returned so callers never fall back silently.
    ///
    /// # Errors
    /// The settings table cannot be read.
    pub async fn get_bool(&self, key: &str, default: bool) -> Result<bool, SettingsError> {
        bool_or(key, self.get(key).await, default)
    }

    /// Reads a string setting, `None` when missing or not a string.
    pub async fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key).await {
            Ok(Some(Setting { value: Value::String(value), .. })) => Some(value),
            _ => None,
        }
    }
}

fn bool_or(
    key: &str,
    read: Result<Option<Setting>, SettingsError>,
    default: bool,
) -> Result<bool, SettingsError> {
    match read {
        Ok(Some(Setting { value: Value::Bool(value), .. })) => Ok(value),
        Ok(Some(_)) => {
            debug!(key, "Setting is not a boolean, using default");
            Ok(default)
        }
        Ok(None) => Ok(default),
        Err(err) => {
            warn!(key, error = %err, "Setting could not be read");
            Err(err)
        }
    }
}
