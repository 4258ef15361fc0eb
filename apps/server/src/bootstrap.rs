use anyhow::{Context, Result};
use cardly::domain::config::ApiConfig;
use cardly::kernel::mail::Mailer;
use cardly::kernel::server::{ApiState, SliceContext};
use cardly_database::Database;
use cardly_event_bus::EventBus;
use tracing::info;

/// Connects the database, runs every slice migration and builds the slices.
pub async fn assemble(config: ApiConfig) -> Result<ApiState> {
    let database = connect(&config).await?;
    let ctx = SliceContext {
        config,
        database,
        events: EventBus::new(),
        mailer: Mailer::log(),
    };

    let slices = cardly::init(&ctx).await.context("Platform bootstrap failed")?;
    info!(slices = slices.len(), "Feature slices ready");

    let SliceContext { config, database, events, mailer } = ctx;
    ApiState::builder()
        .config(config)
        .db(database)
        .events(events)
        .mailer(mailer)
        .register_slices(slices)
        .build()
        .context("Assembling API state")
}

async fn connect(config: &ApiConfig) -> Result<Database> {
    let db = &config.database;
    let builder = Database::builder()
        .url(&db.url)
        .session(&db.namespace, &db.database)
        .migrations(cardly::migrations());
    let builder = match &db.credentials {
        Some(creds) => builder.auth(&creds.username, &creds.password),
        None => builder,
    };
    builder.init().await.with_context(|| format!("Connecting to database at {}", db.url))
}
