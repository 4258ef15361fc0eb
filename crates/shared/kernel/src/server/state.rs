use crate::mail::Mailer;
use crate::security::{JwtCodec, SecurityError};
use axum::extract::FromRef;
use cardly_database::Database;
use cardly_domain::config::ApiConfig;
use cardly_domain::registry::{FeatureSlice, InitializedSlice};
use cardly_event_bus::EventBus;
use fxhash::FxHashMap;
use std::any::{TypeId, type_name};
use std::borrow::Cow;
use std::ops::Deref;
use std::sync::Arc;

#[cardly_derive::cardly_error]
pub enum ApiStateError {
    #[error("Incomplete API state{}: {message}", format_context(.context))]
    Incomplete { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[api_status(INTERNAL_SERVER_ERROR)]
    #[error("Slice not registered{}: {message}", format_context(.context))]
    MissingSlice { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("API state security error{}: {source}", format_context(.context))]
    Security {
        #[source]
        source: SecurityError,
        context: Option<Cow<'static, str>>,
    },
}

/// Everything a handler can reach through [`ApiState`]'s `Deref`.
#[derive(Debug)]
pub struct ApiStateInner {
    pub config: ApiConfig,
    pub database: Database,
    pub events: EventBus,
    pub mailer: Mailer,
    pub jwt: JwtCodec,
    slices: FxHashMap<TypeId, InitializedSlice>,
}

/// Router state: infrastructure handles plus the initialized feature slices, keyed by type.
#[derive(Debug, Clone)]
pub struct ApiState(Arc<ApiStateInner>);

impl ApiState {
    #[must_use]
    pub fn builder() -> ApiStateBuilder {
        ApiStateBuilder::default()
    }

    #[must_use]
    pub fn get_slice<T: FeatureSlice>(&self) -> Option<&T> {
        self.0.slices.get(&TypeId::of::<T>())?.downcast_ref::<T>()
    }

    /// Like [`Self::get_slice`], but a missing slice becomes a 500 for the caller.
    ///
    /// # Errors
    /// [`ApiStateError::MissingSlice`] naming `T`.
    pub fn try_get_slice<T: FeatureSlice>(&self) -> std::result::Result<&T, ApiStateError> {
        self.get_slice::<T>().ok_or_else(|| ApiStateError::MissingSlice {
            message: type_name::<T>().into(),
            context: None,
        })
    }

    pub fn slice_ids(&self) -> impl Iterator<Item = &TypeId> {
        self.0.slices.keys()
    }
}

impl Deref for ApiState {
    type Target = ApiStateInner;

    fn deref(&self) -> &ApiStateInner {
        &self.0
    }
}

macro_rules! state_part {
    ($($ty:ty => $field:ident),* $(,)?) => {
        $(impl FromRef<ApiState> for $ty {
            fn from_ref(state: &ApiState) -> Self {
                state.0.$field.clone()
            }
        })*
    };
}

state_part!(ApiConfig => config, Database => database, EventBus => events, Mailer => mailer);

/// Collects the parts of an [`ApiState`]. Config and database are required; the
/// event bus and mailer fall back to their defaults.
#[derive(Debug, Default)]
pub struct ApiStateBuilder {
    config: Option<ApiConfig>,
    database: Option<Database>,
    events: Option<EventBus>,
    mailer: Option<Mailer>,
    slices: Vec<InitializedSlice>,
}

impl ApiStateBuilder {
    #[must_use]
    pub fn config(self, config: ApiConfig) -> Self {
        Self { config: Some(config), ..self }
    }

    #[must_use]
    pub fn db(self, database: Database) -> Self {
        Self { database: Some(database), ..self }
    }

    #[must_use]
    pub fn events(self, events: EventBus) -> Self {
        Self { events: Some(events), ..self }
    }

    #[must_use]
    pub fn mailer(self, mailer: Mailer) -> Self {
        Self { mailer: Some(mailer), ..self }
    }

    #[must_use]
    pub fn register_slice(self, slice: InitializedSlice) -> Self {
        self.register_slices([slice])
    }

    /// Registering the same slice type twice keeps the later one.
    #[must_use]
    pub fn register_slices<I>(mut self, slices: I) -> Self
    where
        I: IntoIterator<Item = InitializedSlice>,
    {
        self.slices.extend(slices);
        self
    }

    /// # Errors
    /// Missing config or database, or JWT settings the codec rejects.
    pub fn build(self) -> std::result::Result<ApiState, ApiStateError> {
        let config = required(self.config, "config")?;
        let database = required(self.database, "database")?;
        let jwt = JwtCodec::new(&config.security.jwt).context("Building JWT codec")?;

        Ok(ApiState(Arc::new(ApiStateInner {
            config,
            database,
            events: self.events.unwrap_or_default(),
            mailer: self.mailer.unwrap_or_default(),
            jwt,
            slices: self.slices.into_iter().map(|slice| (slice.id, slice)).collect(),
        })))
    }
}

fn required<T>(part: Option<T>, name: &'static str) -> std::result::Result<T, ApiStateError> {
    part.ok_or_else(|| ApiStateError::Incomplete {
        message: format!("{name} not provided").into(),
        context: None,
    })
}
