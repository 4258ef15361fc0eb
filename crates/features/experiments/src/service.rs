use crate::Experiments;
use crate::error::ExperimentsError;
use crate::model::{
    AssignmentRow, Assignment, ConversionRow, ConvertResponse, CreateExperimentRequest, Experiment,
    ExperimentResults, ExperimentRow, ExperimentStatus, GoalCount, UpdateExperimentRequest,
    Variant, VariantResult,
};
use crate::picker;
use cardly_domain::slug;
use cardly_kernel::time;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

pub const DEFAULT_GOAL: &str = "default";
pub const MAX_NAME_CHARS: usize = 80;
pub const MAX_SESSION_CHARS: usize = 128;

const EXPERIMENT_FIELDS: &str = "slug, name, status, variants, created_at, updated_at";

impl ExperimentRow {
    fn into_experiment(self) -> Result<Experiment, ExperimentsError> {
        let status = self.status.parse().map_err(|_| ExperimentsError::Internal {
            message: format!("unknown status '{}'", self.status).into(),
            context: Some(self.slug.clone().into()),
        })?;
        Ok(Experiment {
            variants: serde_json::from_str(&self.variants)?,
            key: self.slug,
            name: self.name,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn validate_name(name: &str) -> Result<String, ExperimentsError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
        return Err(ExperimentsError::validation("name must be 1 to 80 characters"));
    }
    Ok(name.to_owned())
}

fn validate_variants(variants: &[Variant]) -> Result<(), ExperimentsError> {
    picker::validate_variants(variants).map_err(ExperimentsError::validation)
}

fn validate_session(session: &str) -> Result<String, ExperimentsError> {
    let session = session.trim();
    if session.is_empty() || session.len() > MAX_SESSION_CHARS {
        return Err(ExperimentsError::validation("session must be 1 to 128 characters"));
    }
    Ok(session.to_owned())
}

fn validate_goal(goal: Option<&str>) -> Result<String, ExperimentsError> {
    let goal = goal.map(str::trim).filter(|g| !g.is_empty()).unwrap_or(DEFAULT_GOAL);
    let valid = goal.len() <= 64
        && goal.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'_' | b'.' | b'-'));
    if valid {
        Ok(goal.to_owned())
    } else {
        Err(ExperimentsError::validation("goal must be up to 64 of a-z, 0-9, '_', '.' and '-'"))
    }
}

/// Share of `converted` among `assigned`, 0 when nothing was assigned.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn rate(converted: u64, assigned: u64) -> f64 {
    if assigned == 0 { 0.0 } else { converted as f64 / assigned as f64 }
}

impl Experiments {
    // --- Admin ---

    pub async fn create(&self, request: CreateExperimentRequest) -> Result<Experiment, ExperimentsError> {
        let key = slug::normalize(&request.key);
        slug::validate(&key).map_err(ExperimentsError::validation)?;
        let name = validate_name(&request.name)?;
        validate_variants(&request.variants)?;
        if self.find(&key).await?.is_some() {
            return Err(ExperimentsError::conflict(format!("experiment '{key}' already exists")));
        }

        let now = time::now();
        let row = ExperimentRow {
            slug: key,
            name,
            status: ExperimentStatus::Draft.to_string(),
            variants: serde_json::to_string(&request.variants)?,
            created_at: now,
            updated_at: now,
        };
        self.db.query("CREATE experiment CONTENT $row").bind(("row", row.clone())).await?.check()?;
        info!(experiment = %row.slug, "Experiment created");
        row.into_experiment()
    }

    pub async fn list(&self) -> Result<Vec<Experiment>, ExperimentsError> {
        let rows: Vec<ExperimentRow> = self
            .db
            .query(format!("SELECT {EXPERIMENT_FIELDS} FROM experiment ORDER BY created_at DESC"))
            .await?
            .take(0)?;
        rows.into_iter().map(ExperimentRow::into_experiment).collect()
    }

    pub async fn get(&self, key: &str) -> Result<Experiment, ExperimentsError> {
        self.find(key).await?.ok_or_else(|| ExperimentsError::not_found("experiment"))
    }

    /// Changes status and/or variants. Variants are frozen once the experiment left
    /// `draft`.
    pub async fn update(&self, key: &str, request: UpdateExperimentRequest) -> Result<Experiment, ExperimentsError> {
        let mut experiment = self.get(key).await?;

        if let Some(variants) = request.variants {
            if experiment.status != ExperimentStatus::Draft {
                return Err(ExperimentsError::conflict("variants can only change while the experiment is a draft"));
            }
            validate_variants(&variants)?;
            experiment.variants = variants;
        }
        if let Some(status) = request.status.filter(|s| *s != experiment.status) {
            if !experiment.status.can_become(status) {
                return Err(ExperimentsError::conflict(format!(
                    "cannot move a {} experiment to {status}",
                    experiment.status
                )));
            }
            experiment.status = status;
        }
        experiment.updated_at = time::now();

        self.db
            .query("UPDATE experiment SET status = $status, variants = $variants, updated_at = $now WHERE slug = $key")
            .bind(("status", experiment.status.to_string()))
            .bind(("variants", serde_json::to_string(&experiment.variants)?))
            .bind(("now", experiment.updated_at))
            .bind(("key", experiment.key.clone()))
            .await?
            .check()?;
        info!(experiment = %experiment.key, status = %experiment.status, "Experiment updated");
        Ok(experiment)
    }

    pub async fn set_status(&self, key: &str, status: ExperimentStatus) -> Result<Experiment, ExperimentsError> {
        self.update(key, UpdateExperimentRequest { status: Some(status), variants: None }).await
    }

    pub async fn results(&self, key: &str) -> Result<ExperimentResults, ExperimentsError> {
        let experiment = self.get(key).await?;
        let assignments: Vec<AssignmentRow> = self
            .db
            .query("SELECT experiment, session, variant, created_at FROM assignment WHERE experiment = $key")
            .bind(("key", experiment.key.clone()))
            .await?
            .take(0)?;
        let conversions: Vec<ConversionRow> = self
            .db
            .query("SELECT experiment, session, variant, goal, created_at FROM conversion WHERE experiment = $key")
            .bind(("key", experiment.key.clone()))
            .await?
            .take(0)?;

        let variants = experiment
            .variants
            .iter()
            .map(|variant| {
                let assigned = assignments.iter().filter(|a| a.variant == variant.key).count();
                let converted: Vec<&ConversionRow> =
                    conversions.iter().filter(|c| c.variant == variant.key).collect();
                let mut goals: BTreeMap<&str, u64> = BTreeMap::new();
                for conversion in &converted {
                    *goals.entry(conversion.goal.as_str()).or_default() += 1;
                }
                let sessions: HashSet<&str> = converted.iter().map(|c| c.session.as_str()).collect();
                let assigned = u64::try_from(assigned).unwrap_or(u64::MAX);
                VariantResult {
                    key: variant.key.clone(),
                    weight: variant.weight,
                    assignments: assigned,
                    conversions: u64::try_from(converted.len()).unwrap_or(u64::MAX),
                    goals: goals
                        .into_iter()
                        .map(|(goal, conversions)| GoalCount { goal: goal.to_owned(), conversions })
                        .collect(),
                    conversion_rate: rate(u64::try_from(sessions.len()).unwrap_or(u64::MAX), assigned),
                }
            })
            .collect();

        Ok(ExperimentResults { experiment: experiment.key, status: experiment.status, variants })
    }

    // --- Public ---

    /// Variant for `session`. Stable for the lifetime of the experiment: served from the
    /// cache, then the stored assignment, else picked by weight and stored.
    pub async fn assign(&self, key: &str, session: &str) -> Result<Assignment, ExperimentsError> {
        let session = validate_session(session)?;
        let experiment = self.get(key).await?;
        let control = experiment
            .variants
            .first()
            .ok_or_else(|| ExperimentsError::Internal { message: "experiment has no variants".into(), context: None })?;

        if experiment.status != ExperimentStatus::Running {
            return Ok(Assignment { experiment: experiment.key, variant: control.key.clone(), tracked: false });
        }

        let cache_key = (experiment.key.clone(), session.clone());
        if let Some(variant) = self.assignments.get(&cache_key) {
            return Ok(Assignment { experiment: experiment.key, variant, tracked: true });
        }

        let variant = match self.stored_assignment(&experiment.key, &session).await? {
            Some(row) => row.variant,
            None => {
                let picked = picker::pick(&experiment.variants).unwrap_or(control).key.clone();
                self.store_assignment(&experiment.key, &session, picked).await?
            }
        };
        self.assignments.insert(cache_key, variant.clone());
        Ok(Assignment { experiment: experiment.key, variant, tracked: true })
    }

    /// Records a conversion for an assigned session. Repeats per goal are ignored.
    pub async fn convert(&self, key: &str, session: &str, goal: Option<&str>) -> Result<ConvertResponse, ExperimentsError> {
        let session = validate_session(session)?;
        let goal = validate_goal(goal)?;
        let experiment = self.get(key).await?;
        let assignment = self
            .stored_assignment(&experiment.key, &session)
            .await?
            .ok_or_else(|| ExperimentsError::not_found("assignment"))?;

        let existing: Vec<String> = self
            .db
            .query("SELECT VALUE goal FROM conversion WHERE experiment = $key AND session = $session AND goal = $goal")
            .bind(("key", experiment.key.clone()))
            .bind(("session", session.clone()))
            .bind(("goal", goal.clone()))
            .await?
            .take(0)?;
        if !existing.is_empty() {
            debug!(experiment = %experiment.key, goal = %goal, "Conversion already recorded");
            return Ok(ConvertResponse { recorded: false });
        }

        let row = ConversionRow {
            experiment: experiment.key,
            session,
            variant: assignment.variant,
            goal,
            created_at: time::now(),
        };
        self.db.query("CREATE conversion CONTENT $row").bind(("row", row)).await?.check()?;
        Ok(ConvertResponse { recorded: true })
    }

    async fn find(&self, key: &str) -> Result<Option<Experiment>, ExperimentsError> {
        let row: Option<ExperimentRow> = self
            .db
            .query(format!("SELECT {EXPERIMENT_FIELDS} FROM experiment WHERE slug = $key LIMIT 1"))
            .bind(("key", key.to_owned()))
            .await?
            .take(0)?;
        row.map(ExperimentRow::into_experiment).transpose()
    }

    async fn stored_assignment(&self, key: &str, session: &str) -> Result<Option<AssignmentRow>, ExperimentsError> {
        Ok(self
            .db
            .query("SELECT experiment, session, variant, created_at FROM assignment WHERE experiment = $key AND session = $session LIMIT 1")
            .bind(("key", key.to_owned()))
            .bind(("session", session.to_owned()))
            .await?
            .take(0)?)
    }

    /// Persists `variant`, or returns the variant a concurrent request stored first.
    async fn store_assignment(&self, key: &str, session: &str, variant: String) -> Result<String, ExperimentsError> {
        let row = AssignmentRow {
            experiment: key.to_owned(),
            session: session.to_owned(),
            variant,
            created_at: time::now(),
        };
        let created = self.db.query("CREATE assignment CONTENT $row").bind(("row", row.clone())).await?.check();
        match created {
            Ok(_) => {
                debug!(experiment = %key, variant = %row.variant, "Variant assigned");
                Ok(row.variant)
            }
            Err(err) => match self.stored_assignment(key, session).await? {
                Some(existing) => Ok(existing.variant),
                None => Err(err.into()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goals_default_and_validate() {
        assert_eq!(validate_goal(None).unwrap(), DEFAULT_GOAL);
        assert_eq!(validate_goal(Some(" signup ")).unwrap(), "signup");
        assert!(validate_goal(Some("Sign Up")).is_err());
    }

    #[test]
    fn rates_handle_empty_variants() {
        assert!((rate(0, 0) - 0.0).abs() < f64::EPSILON);
        assert!((rate(1, 4) - 0.25).abs() < f64::EPSILON);
    }
}
