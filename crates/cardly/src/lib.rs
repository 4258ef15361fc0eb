//! Facade crate for Cardly features and shared modules.
//! Re-exports domain/kernel primitives and aggregates slice initialization.
//! Keep this crate thin: it composes other crates and holds no business logic.
//!
//! ## Usage
//! - Run [`migrations`] when opening the database.
//! - Call [`init`] to build every slice, then register the result in the
//!   [`ApiState`](kernel::server::ApiState) and serve [`router`].

use cardly_database::Migration;
use cardly_domain::registry::InitializedSlice;
use cardly_kernel::server::{ApiState, SliceContext};
use std::borrow::Cow;
use tracing::info;
use utoipa_axum::router::OpenApiRouter;

pub use cardly_domain as domain;
pub use cardly_kernel as kernel;

pub mod server {
    pub mod router {
        pub use cardly_kernel::server::system_router;
    }
}

/// Feature slices, in dependency order.
pub mod features {
    pub use cardly_analytics as analytics;
    pub use cardly_billing as billing;
    pub use cardly_cards as cards;
    pub use cardly_contacts as contacts;
    pub use cardly_experiments as experiments;
    pub use cardly_identity as identity;
    pub use cardly_nfc as nfc;
    pub use cardly_settings as settings;
    pub use cardly_uploads as uploads;

    pub const ENABLED: &[&str] = &[
        "settings",
        "billing",
        "identity",
        "cards",
        "contacts",
        "nfc",
        "analytics",
        "experiments",
        "uploads",
    ];

    #[must_use]
    pub fn is_enabled(name: &str) -> bool {
        ENABLED.contains(&name)
    }
}

use features::{analytics, billing, cards, contacts, experiments, identity, nfc, settings, uploads};

#[cardly_derive::cardly_error]
pub enum PlatformError {
    #[error("Identity bootstrap failed{}: {source}", format_context(.context))]
    Identity {
        #[source]
        source: identity::IdentityError,
        context: Option<Cow<'static, str>>,
    },

    #[error("Cards bootstrap failed{}: {source}", format_context(.context))]
    Cards {
        #[source]
        source: cards::CardsError,
        context: Option<Cow<'static, str>>,
    },

    #[error("Analytics bootstrap failed{}: {source}", format_context(.context))]
    Analytics {
        #[source]
        source: analytics::AnalyticsError,
        context: Option<Cow<'static, str>>,
    },

    #[error("Uploads bootstrap failed{}: {source}", format_context(.context))]
    Uploads {
        #[source]
        source: uploads::UploadsError,
        context: Option<Cow<'static, str>>,
    },
}

/// Every slice migration, in the order slices depend on each other.
#[must_use]
pub fn migrations() -> Vec<Migration> {
    [
        settings::MIGRATIONS,
        billing::MIGRATIONS,
        identity::MIGRATIONS,
        cards::MIGRATIONS,
        contacts::MIGRATIONS,
        nfc::MIGRATIONS,
        analytics::MIGRATIONS,
        experiments::MIGRATIONS,
        uploads::MIGRATIONS,
    ]
    .into_iter()
    .flatten()
    .copied()
    .collect()
}

/// Builds every slice and starts the event bus subscribers.
///
/// Must be called inside a Tokio runtime.
///
/// # Errors
/// A slice cannot be configured, a listener cannot subscribe, or the upload
/// storage root is unusable.
pub async fn init(ctx: &SliceContext) -> std::result::Result<Vec<InitializedSlice>, PlatformError> {
    let settings = settings::init(ctx);
    let billing = billing::init(ctx);
    let identity = identity::init(ctx, settings.clone())?;
    let cards = cards::init(ctx, billing.clone(), settings.clone());
    let contacts = contacts::init(ctx, cards.clone(), identity.clone());
    let nfc = nfc::init(ctx, cards.clone(), billing.clone());
    let analytics = analytics::init(ctx, cards.clone(), billing.clone());
    let experiments = experiments::init(ctx);
    let uploads = uploads::init(ctx, billing.clone()).await?;

    let mut listeners = analytics.listen().context("Starting analytics listeners")?;
    listeners.push(cards.listen().context("Starting entitlement enforcement")?);
    info!(listeners = listeners.len(), "Event listeners started");

    let slices = vec![
        InitializedSlice::new(settings),
        InitializedSlice::new(billing),
        InitializedSlice::new(identity),
        InitializedSlice::new(cards),
        InitializedSlice::new(contacts),
        InitializedSlice::new(nfc),
        InitializedSlice::new(analytics),
        InitializedSlice::new(experiments),
        InitializedSlice::new(uploads),
    ];
    info!(slices = slices.len(), "Platform initialized");
    Ok(slices)
}

/// All slice routes plus the system routes.
pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .merge(server::router::system_router())
        .merge(settings::router())
        .merge(billing::router())
        .merge(identity::router())
        .merge(cards::router())
        .merge(contacts::router())
        .merge(nfc::router())
        .merge(analytics::router())
        .merge(experiments::router())
        .merge(uploads::router())
}
