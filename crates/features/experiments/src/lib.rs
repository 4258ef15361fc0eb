//! Experiments feature slice: admin-defined A/B tests with weighted variants. Each
//! visitor session sticks to the variant it was first given.

mod error;
mod handlers;
mod migrations;
mod model;
mod picker;
mod service;

pub use crate::error::{ExperimentsError, ExperimentsErrorExt};
pub use crate::migrations::MIGRATIONS;
pub use crate::model::{
    AssignRequest, Assignment, ConvertRequest, ConvertResponse, CreateExperimentRequest,
    Experiment, ExperimentResults, ExperimentStatus, GoalCount, UpdateExperimentRequest, Variant,
    VariantResult,
};
pub use crate::picker::{MAX_VARIANTS, MAX_WEIGHT, MIN_VARIANTS};
pub use crate::service::{DEFAULT_GOAL, MAX_NAME_CHARS, MAX_SESSION_CHARS};

use cardly_database::Database;
use cardly_kernel::server::{ApiState, SliceContext};
use moka::sync::Cache;
use std::time::Duration;
use utoipa_axum::router::OpenApiRouter;

/// Experiments feature state
#[cardly_derive::cardly_slice]
#[derive(Debug)]
pub struct Experiments {
    db: Database,
    /// `(experiment, session) → variant`, in front of the assignment table.
    assignments: Cache<(String, String), String>,
}

pub fn init(ctx: &SliceContext) -> Experiments {
    let config = &ctx.config.experiments;
    let assignments = Cache::builder()
        .max_capacity(config.assignment_cache_capacity)
        .time_to_live(Duration::from_secs(config.assignment_cache_ttl_seconds.max(1)))
        .build();
    tracing::info!(capacity = config.assignment_cache_capacity, "Experiments slice initialized");
    Experiments::new(ExperimentsInner { db: ctx.database.clone(), assignments })
}

pub fn router() -> OpenApiRouter<ApiState> {
    handlers::router()
}
