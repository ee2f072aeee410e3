//! Trial records and the append-only archive of a tuning run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// A concrete value sampled for one hyperparameter flag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl ParamValue {
    /// Numeric view used by the sampler's density model. Booleans map to
    /// 0/1 so categorical flags still have a consistent embedding.
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Bool(v) => {
                if *v {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Int(v) => *v as f64,
            Self::Float(v) => *v,
        }
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

/// One sampled value per flag of a search space, in the space's flag order.
///
/// Immutable once produced by the sampler; the order matters because the
/// argument encoder walks it when building the worker command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Assignment(Vec<(String, ParamValue)>);

impl Assignment {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, flag: impl Into<String>, value: ParamValue) {
        self.0.push((flag.into(), value));
    }

    pub fn get(&self, flag: &str) -> Option<ParamValue> {
        self.0.iter().find(|(name, _)| name == flag).map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ParamValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all continuous-valued entries. Integer and boolean flags do
    /// not contribute. Used only as the near-tie secondary metric.
    pub fn args_sum(&self) -> f64 {
        self.0
            .iter()
            .filter_map(|(_, value)| match value {
                ParamValue::Float(v) => Some(*v),
                _ => None,
            })
            .sum()
    }
}

impl FromIterator<(String, ParamValue)> for Assignment {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialStatus {
    Success,
    Failure,
}

/// One evaluation of a sampled assignment against the external worker.
///
/// Never mutated after creation: the evaluator builds the finished record in
/// one shot once the worker has resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub id: Uuid,
    /// Evaluation order within the run (0-indexed).
    pub number: usize,
    pub assignment: Assignment,
    pub status: TrialStatus,
    /// Path to the trajectory log the worker wrote. Failed trials have none.
    pub artifact: Option<PathBuf>,
    /// Scalar ranking value; lower is better. Present only on success.
    pub loss: Option<f64>,
    /// Secondary near-tie metric (sum of continuous parameters).
    pub args_sum: Option<f64>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl Trial {
    pub fn success(
        number: usize,
        assignment: Assignment,
        artifact: PathBuf,
        loss: f64,
        started_at: DateTime<Utc>,
    ) -> Self {
        let args_sum = assignment.args_sum();
        Self {
            id: Uuid::new_v4(),
            number,
            assignment,
            status: TrialStatus::Success,
            artifact: Some(artifact),
            loss: Some(loss),
            args_sum: Some(args_sum),
            error: None,
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn failure(
        number: usize,
        assignment: Assignment,
        error: String,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            number,
            assignment,
            status: TrialStatus::Failure,
            artifact: None,
            loss: None,
            args_sum: None,
            error: Some(error),
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TrialStatus::Success
    }
}

/// Append-only sequence of trials, in evaluation order.
///
/// Owned by the search driver while the run is live; handed to the selector
/// read-only afterwards. Iteration order is evaluation order, which is what
/// gives the earliest-seen trial precedence on exact loss ties.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrialArchive {
    trials: Vec<Trial>,
}

impl TrialArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, trial: Trial) {
        self.trials.push(trial);
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Trial> {
        self.trials.iter()
    }

    /// Trials that produced an artifact and a loss, in evaluation order.
    pub fn successes(&self) -> impl Iterator<Item = &Trial> {
        self.trials.iter().filter(|t| t.is_success())
    }
}
