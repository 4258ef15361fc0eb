use crate::Uploads;
use crate::error::UploadsError;
use crate::model::{StorageUsage, Upload, UploadForm, UploadPurpose, UploadRow};
use crate::sniff::{self, FileKind};
use cardly_kernel::{safe_nanoid, time};
use cardly_storage::{NamespacedStorage, StorageError};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

pub const MAX_NAME_CHARS: usize = 120;

const UPLOAD_FIELDS: &str =
    "uid, owner, purpose, content_type, file_name, size, checksum, original_name, created_at";

/// Strips directories and anything outside `[A-Za-z0-9._-]` from a client file name.
#[must_use]
pub fn sanitize_name(raw: &str) -> Option<String> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .take(MAX_NAME_CHARS)
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    (!cleaned.is_empty()).then(|| cleaned.to_owned())
}

fn checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

impl Uploads {
    /// Validates and stores a file for `owner`.
    pub async fn upload(&self, owner: &str, form: UploadForm) -> Result<Upload, UploadsError> {
        let purpose = form.purpose.unwrap_or_default();
        let size = form.file.len();
        if size == 0 {
            return Err(UploadsError::validation("file is empty"));
        }
        if size > self.max_bytes {
            return Err(UploadsError::TooLarge {
                message: format!("file exceeds the {} byte limit", self.max_bytes).into(),
                context: None,
            });
        }

        let kind = sniff::detect(&form.file)
            .ok_or_else(|| UploadsError::unsupported("only PNG, JPEG, GIF, WEBP and PDF files are accepted"))?;
        if !kind.is_image() && purpose != UploadPurpose::Attachment {
            return Err(UploadsError::unsupported(format!("{purpose} uploads must be images")));
        }

        let entitlements = self.billing.entitlements(owner).await?;
        let usage = self.usage_bytes(owner).await?;
        let size = u64::try_from(size).unwrap_or(u64::MAX);
        if usage.saturating_add(size) > entitlements.storage_quota_bytes {
            return Err(UploadsError::QuotaExceeded {
                message: format!(
                    "the {} plan includes {} bytes of storage",
                    entitlements.tier, entitlements.storage_quota_bytes
                )
                .into(),
                context: Some(format!("{usage} bytes in use").into()),
            });
        }

        let uid = safe_nanoid!();
        let file_name = format!("{uid}.{}", kind.extension());
        let files = self.files(owner)?;
        files.write(&file_name, &form.file).await?;

        let row = UploadRow {
            uid,
            owner: owner.to_owned(),
            purpose: <&str>::from(purpose).to_owned(),
            content_type: kind.mime().to_owned(),
            file_name,
            size: i64::try_from(size).unwrap_or(i64::MAX),
            checksum: checksum(&form.file),
            original_name: form.file_name.as_deref().and_then(sanitize_name),
            created_at: time::now(),
        };
        if let Err(err) = self.insert(&row).await {
            if let Err(cleanup) = files.delete(&row.file_name).await {
                warn!(file = %row.file_name, error = %cleanup, "Orphaned upload left on disk");
            }
            return Err(err);
        }

        info!(upload = %row.uid, owner, purpose = %purpose, size, "File uploaded");
        Ok(self.to_upload(row))
    }

    pub async fn list(&self, owner: &str) -> Result<Vec<Upload>, UploadsError> {
        let rows: Vec<UploadRow> = self
            .db
            .query(format!("SELECT {UPLOAD_FIELDS} FROM upload WHERE owner = $owner ORDER BY created_at DESC"))
            .bind(("owner", owner.to_owned()))
            .await?
            .take(0)?;
        Ok(rows.into_iter().map(|row| self.to_upload(row)).collect())
    }

    pub async fn usage(&self, owner: &str) -> Result<StorageUsage, UploadsError> {
        let sizes = self.sizes(owner).await?;
        let entitlements = self.billing.entitlements(owner).await?;
        Ok(StorageUsage {
            used_bytes: sizes.iter().copied().map(to_u64).sum(),
            quota_bytes: entitlements.storage_quota_bytes,
            files: u64::try_from(sizes.len()).unwrap_or(u64::MAX),
        })
    }

    /// Deletes the record and its file. A file already gone from disk is tolerated.
    pub async fn delete(&self, owner: &str, id: &str) -> Result<(), UploadsError> {
        let row = self
            .find(id)
            .await?
            .filter(|row| row.owner == owner)
            .ok_or_else(|| UploadsError::not_found("upload"))?;
        self.db.query("DELETE upload WHERE uid = $uid").bind(("uid", row.uid.clone())).await?.check()?;
        match self.files(owner)?.delete(&row.file_name).await {
            Ok(()) | Err(StorageError::FileNotFound { .. }) => {}
            Err(err) => warn!(upload = %row.uid, error = %err, "Upload file could not be removed"),
        }
        info!(upload = %row.uid, owner, "Upload deleted");
        Ok(())
    }

    /// Loads a file for public delivery: its content type and bytes.
    pub async fn serve(&self, id: &str) -> Result<(&'static str, Vec<u8>), UploadsError> {
        let row = self.find(id).await?.ok_or_else(|| UploadsError::not_found("file"))?;
        let kind = FileKind::from_mime(&row.content_type).ok_or_else(|| UploadsError::Internal {
            message: "stored content type is not servable".into(),
            context: Some(row.content_type.clone().into()),
        })?;
        let bytes = self.files(&row.owner)?.read(&row.file_name).await.map_err(UploadsError::from_read)?;
        debug!(upload = %row.uid, size = bytes.len(), "File served");
        Ok((kind.mime(), bytes))
    }

    async fn insert(&self, row: &UploadRow) -> Result<(), UploadsError> {
        self.db.query("CREATE upload CONTENT $row").bind(("row", row.clone())).await?.check()?;
        Ok(())
    }

    fn files(&self, owner: &str) -> Result<NamespacedStorage, UploadsError> {
        Ok(self.storage.namespace(owner)?)
    }

    async fn find(&self, id: &str) -> Result<Option<UploadRow>, UploadsError> {
        Ok(self
            .db
            .query(format!("SELECT {UPLOAD_FIELDS} FROM upload WHERE uid = $uid LIMIT 1"))
            .bind(("uid", id.to_owned()))
            .await?
            .take(0)?)
    }

    async fn sizes(&self, owner: &str) -> Result<Vec<i64>, UploadsError> {
        Ok(self
            .db
            .query("SELECT VALUE size FROM upload WHERE owner = $owner")
            .bind(("owner", owner.to_owned()))
            .await?
            .take(0)?)
    }

    async fn usage_bytes(&self, owner: &str) -> Result<u64, UploadsError> {
        Ok(self.sizes(owner).await?.into_iter().map(to_u64).sum())
    }

    fn to_upload(&self, row: UploadRow) -> Upload {
        Upload {
            url: self.public.public_link(&format!("/files/{}", row.uid)),
            purpose: row.purpose.parse().unwrap_or_default(),
            id: row.uid,
            content_type: row.content_type,
            size: row.size,
            checksum: row.checksum,
            original_name: row.original_name,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_lose_directories_and_odd_characters() {
        assert_eq!(sanitize_name("photo.png").as_deref(), Some("photo.png"));
        assert_eq!(sanitize_name("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(sanitize_name("C:\\Users\\me\\CV final.pdf").as_deref(), Some("CV_final.pdf"));
        assert_eq!(sanitize_name("<script>.png").as_deref(), Some("script.png"));
        assert_eq!(sanitize_name(".hidden").as_deref(), Some("hidden"));
        assert_eq!(sanitize_name("dir/"), None);
        assert_eq!(sanitize_name("ñ"), None);
    }

    #[test]
    fn long_names_are_truncated() {
        let name = sanitize_name(&"a".repeat(500)).unwrap();
        assert_eq!(name.len(), MAX_NAME_CHARS);
    }

    #[test]
    fn checksum_is_sha256_hex() {
        assert_eq!(
            checksum(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
