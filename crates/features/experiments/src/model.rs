use cardly_derive::api_model;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use surrealdb::types::SurrealValue;
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, IntoStaticStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExperimentStatus {
    Draft,
    Running,
    Paused,
    Completed,
}

impl ExperimentStatus {
    /// `draft → running ⇄ paused → completed`; completed is final.
    #[must_use]
    pub const fn can_become(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Running)
                | (Self::Running, Self::Paused | Self::Completed)
                | (Self::Paused, Self::Running | Self::Completed)
        )
    }
}

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct ExperimentRow {
    /// The experiment key.
    pub slug: String,
    pub name: String,
    pub status: String,
    pub variants: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct AssignmentRow {
    pub experiment: String,
    pub session: String,
    pub variant: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, SurrealValue)]
pub(crate) struct ConversionRow {
    pub experiment: String,
    pub session: String,
    pub variant: String,
    pub goal: String,
    pub created_at: i64,
}

// --- API models ---

#[api_model]
#[derive(Clone, PartialEq, Eq)]
pub struct Variant {
    #[schema(example = "control")]
    pub key: String,
    /// Relative share of traffic.
    pub weight: u32,
}

#[api_model]
#[derive(Clone, PartialEq, Eq)]
pub struct Experiment {
    pub key: String,
    pub name: String,
    #[schema(value_type = String, example = "running")]
    pub status: ExperimentStatus,
    /// The first variant is the control.
    pub variants: Vec<Variant>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[api_model]
pub struct CreateExperimentRequest {
    pub key: String,
    pub name: String,
    pub variants: Vec<Variant>,
}

#[api_model]
#[derive(Default)]
pub struct UpdateExperimentRequest {
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub status: Option<ExperimentStatus>,
    /// Only while the experiment is a draft.
    #[serde(default)]
    pub variants: Option<Vec<Variant>>,
}

#[api_model]
pub struct AssignRequest {
    pub session: String,
}

#[api_model]
#[derive(Clone, PartialEq, Eq)]
pub struct Assignment {
    pub experiment: String,
    pub variant: String,
    /// `false` when the experiment is not running and the control was served untracked.
    pub tracked: bool,
}

#[api_model]
pub struct ConvertRequest {
    pub session: String,
    /// Defaults to `default`.
    #[serde(default)]
    pub goal: Option<String>,
}

#[api_model]
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ConvertResponse {
    /// `false` when this session already converted on this goal.
    pub recorded: bool,
}

#[api_model]
#[derive(Clone, PartialEq, Eq)]
pub struct GoalCount {
    pub goal: String,
    pub conversions: u64,
}

#[api_model]
#[derive(Clone, PartialEq)]
pub struct VariantResult {
    pub key: String,
    pub weight: u32,
    pub assignments: u64,
    pub conversions: u64,
    pub goals: Vec<GoalCount>,
    /// Converted sessions over assigned sessions, 0 without assignments.
    pub conversion_rate: f64,
}

#[api_model]
#[derive(Clone, PartialEq)]
pub struct ExperimentResults {
    pub experiment: String,
    #[schema(value_type = String)]
    pub status: ExperimentStatus,
    pub variants: Vec<VariantResult>,
}
