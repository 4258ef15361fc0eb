//! # Database Infrastructure
//!
//! Initializes the shared [SurrealDB](https://surrealdb.com) connection and applies
//! the schema migrations declared by each feature slice.
//!
//! * **Engine agnostic**: `mem://`, `rocksdb://`, `ws://` and `http://` through the `any` engine.
//! * **Resilient connectivity**: health checks retried with exponential backoff.
//! * **Checksummed migrations**: see [`Migration`].
//!
//! ```rust
//! use cardly_database::{Database, DatabaseError, Migration};
//!
//! const MIGRATIONS: &[Migration] = &[Migration::new(
//!     "cards",
//!     "0001",
//!     "DEFINE TABLE IF NOT EXISTS card SCHEMALESS;",
//! )];
//!
//! #[tokio::main]
//! async fn main() -> Result<(), DatabaseError> {
//!     let db = Database::builder()
//!         .url("mem://")
//!         .session("cardly", "main")
//!         .migrations(MIGRATIONS.iter().copied())
//!         .init()
//!         .await?;
//!     db.health().await?;
//!     Ok(())
//! }
//! ```

mod error;
mod migrations;

pub use error::{DatabaseError, DatabaseErrorExt};
pub use migrations::{Migration, MigrationReport, checksum};

use migrations::MigrationRunner;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;
use surrealdb::Surreal;
use surrealdb::engine::any::{Any, connect};
use surrealdb::opt::auth::Root;
use tracing::{info, instrument, trace, warn};

const HEALTH_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Thread-safe handle to the `SurrealDB` session. Derefs to [`Surreal<Any>`].
#[derive(Debug, Clone)]
pub struct Database {
    inner: Arc<Surreal<Any>>,
}

impl Database {
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    /// Applies pending migrations in order and verifies the checksums of applied ones.
    ///
    /// # Errors
    /// [`DatabaseError::Migration`] on a failing script or a checksum mismatch.
    pub async fn migrate(&self, migrations: &[Migration]) -> Result<MigrationReport, DatabaseError> {
        let report = MigrationRunner::new(&self.inner).run(migrations).await?;
        for skipped in &report.skipped {
            trace!(slice = skipped.slice, version = skipped.version, "Migration already applied");
        }
        for applied in &report.applied {
            info!(slice = applied.slice, version = applied.version, "Applied migration");
        }
        Ok(report)
    }
}

impl Deref for Database {
    type Target = Surreal<Any>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Fluent builder for the database connection.
#[must_use = "builders do nothing unless you call .init()"]
#[derive(Debug, Default)]
pub struct DatabaseBuilder {
    url: Option<String>,
    ns: Option<String>,
    db: Option<String>,
    auth: Option<(String, String)>,
    migrations: Vec<Migration>,
}

impl DatabaseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the namespace and database name.
    pub fn session(mut self, namespace: impl Into<String>, database: impl Into<String>) -> Self {
        self.ns = Some(namespace.into());
        self.db = Some(database.into());
        self
    }

    /// Signs in as a root user after connecting.
    pub fn auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some((username.into(), password.into()));
        self
    }

    /// Migrations to apply during `init`, in order.
    pub fn migrations(mut self, migrations: impl IntoIterator<Item = Migration>) -> Self {
        self.migrations.extend(migrations);
        self
    }

    /// Connects, waits for the engine to become healthy, authenticates, selects the
    /// session and applies pending migrations.
    ///
    /// # Errors
    /// * [`DatabaseError::Validation`] if URL, namespace or database are missing.
    /// * [`DatabaseError::Connection`] if the engine fails to start or stays unhealthy.
    /// * [`DatabaseError::Auth`] if the credentials are rejected.
    /// * [`DatabaseError::Migration`] if a migration fails or was tampered with.
    #[instrument(skip(self), fields(url = self.url, ns = self.ns, db = self.db))]
    pub async fn init(self) -> Result<Database, DatabaseError> {
        let missing = |what: &'static str| DatabaseError::Validation {
            message: format!("{what} is required").into(),
            context: None,
        };
        let url = self.url.ok_or_else(|| missing("URL"))?;
        let ns = self.ns.ok_or_else(|| missing("Namespace"))?;
        let db = self.db.ok_or_else(|| missing("Database"))?;

        let instance = connect(&url).await.map_err(|e| DatabaseError::Connection {
            message: e.to_string().into(),
            context: Some("Initializing engine".into()),
        })?;

        let mut delay = INITIAL_BACKOFF;
        for attempt in 1..=HEALTH_ATTEMPTS {
            if instance.health().await.is_ok() {
                break;
            }
            if attempt == HEALTH_ATTEMPTS {
                return Err(DatabaseError::Connection {
                    message: "Unhealthy after retries".into(),
                    context: Some(url.into()),
                });
            }
            warn!(attempt, ?delay, "Database not ready, retrying...");
            tokio::time::sleep(delay).await;
            delay *= 2;
        }

        if let Some((username, password)) = self.auth {
            instance.signin(Root { username, password }).await.map_err(|e| {
                DatabaseError::Auth { message: e.to_string().into(), context: Some(url.into()) }
            })?;
        }

        instance.use_ns(&ns).use_db(&db).await.context("Activating session")?;

        let version =
            instance.version().await.map_or_else(|_| "unknown".to_owned(), |v| v.to_string());
        info!(namespace = %ns, database = %db, %version, "SurrealDB connection established");

        let database = Database { inner: Arc::new(instance) };
        database.migrate(&self.migrations).await?;

        Ok(database)
    }
}
