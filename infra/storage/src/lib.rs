//! Sandboxed file storage for user uploads.
//!
//! * **Sandbox**: every path is resolved relative to a canonical root; absolute paths,
//!   `..` escapes and symlinks leading outside the root are rejected.
//! * **Atomic writes**: unique temp file, `fsync`, then `rename`.
//! * **Namespaces and sharding**: `<root>/<namespace>/<ab>/<cd>/<abcd...>` keeps
//!   directories small.
//! * **Self-healing**: stale temp files left by a crash are purged on connect.
//!
//! ```rust
//! use cardly_storage::{Storage, StorageError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), StorageError> {
//!     # let tmp = tempfile::tempdir().unwrap();
//!     let storage = Storage::builder().root(tmp.path().join("data")).connect().await?;
//!
//!     let files = storage.namespace("u8Kd2mQpX3zA")?;
//!     files.write("avatar.png", b"png bytes").await?;
//!     assert_eq!(files.read("avatar.png").await?, b"png bytes");
//!     Ok(())
//! }
//! ```

mod builder;
mod engine;
mod error;
mod maintenance;
mod namespace;
mod security;

pub use builder::StorageBuilder;
pub use engine::Storage;
pub use error::{StorageError, StorageErrorExt};
pub use namespace::{NamespaceName, NamespacedStorage};
