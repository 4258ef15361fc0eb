use crate::engine::Storage;
use crate::error::StorageError;
use std::fmt;
use std::path::{Path, PathBuf};

const MAX_NAMESPACE_LEN: usize = 64;

/// A validated namespace directory name: 1-64 characters of `[A-Za-z0-9_-]`.
/// Case is preserved, so generated record ids can be used directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespaceName(String);

impl TryFrom<&str> for NamespaceName {
    type Error = StorageError;

    fn try_from(value: &str) -> Result<Self, StorageError> {
        if value.is_empty() || value.len() > MAX_NAMESPACE_LEN {
            return Err(StorageError::InvalidNamespace {
                message: value.to_owned().into(),
                context: Some("Namespace must be 1-64 characters".into()),
            });
        }
        if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(StorageError::InvalidNamespace {
                message: value.to_owned().into(),
                context: Some("Namespace contains illegal characters".into()),
            });
        }
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for NamespaceName {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self, StorageError> {
        Self::try_from(value.as_str())
    }
}

impl TryFrom<&String> for NamespaceName {
    type Error = StorageError;

    fn try_from(value: &String) -> Result<Self, StorageError> {
        Self::try_from(value.as_str())
    }
}

impl AsRef<str> for NamespaceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NamespaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A scoped view of [`Storage`]. Paths are prefixed with the namespace and sharded
/// by the first four characters of the file name.
#[derive(Debug, Clone)]
pub struct NamespacedStorage {
    storage: Storage,
    namespace: NamespaceName,
}

impl NamespacedStorage {
    pub(crate) const fn new(storage: Storage, namespace: NamespaceName) -> Self {
        Self { storage, namespace }
    }

    #[must_use]
    pub const fn name(&self) -> &NamespaceName {
        &self.namespace
    }

    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<PathBuf, StorageError> {
        self.storage.resolve_sharded(Some(&self.namespace), path)
    }

    pub async fn read(&self, path: impl AsRef<Path>) -> Result<Vec<u8>, StorageError> {
        self.storage.read_resolved(self.resolve(path)?).await
    }

    pub async fn write(&self, path: impl AsRef<Path>, data: &[u8]) -> Result<(), StorageError> {
        self.storage.write_resolved(self.resolve(path)?, data).await
    }

    pub async fn delete(&self, path: impl AsRef<Path>) -> Result<(), StorageError> {
        self.storage.delete_resolved(self.resolve(path)?).await
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> Result<bool, StorageError> {
        Ok(self.resolve(path)?.exists())
    }
}
