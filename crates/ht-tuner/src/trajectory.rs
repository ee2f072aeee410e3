//! Trajectory log parsing and loss computation.
//!
//! The worker writes a tab-separated log with one row per optimization step
//! per run (`Name`, `Iteration`, `Step`, `Best value`). We collapse it into
//! a per-step mean across runs, truncated to the function's step budget,
//! and rank trials by a blend of late-stage average quality and best-ever
//! quality.

use ht_types::EvalError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Spacing of the steps sampled into the loss's average component.
const LOSS_SAMPLE_STRIDE: i64 = 50;

/// Weight of the sampled average; the remainder goes to the minimum.
const LOSS_MEAN_WEIGHT: f64 = 0.01;

#[derive(Debug, Deserialize)]
struct LogRow {
    #[serde(rename = "Step")]
    step: i64,
    #[serde(rename = "Best value")]
    best_value: f64,
}

/// Per-step mean of best-value-so-far across all runs of one trial,
/// ordered by step.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanTrajectory {
    steps: Vec<i64>,
    means: Vec<f64>,
}

impl MeanTrajectory {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn mean_at(&self, step: i64) -> Option<f64> {
        self.steps
            .iter()
            .position(|&s| s == step)
            .map(|i| self.means[i])
    }

    /// Scalar ranking value: `0.01 * mean(means at every 50th step) +
    /// 0.99 * min(means)`. Strongly favors the best observed value while
    /// still penalizing noisy or unstable trajectories.
    pub fn loss(&self) -> f64 {
        let sampled: Vec<f64> = self
            .steps
            .iter()
            .zip(&self.means)
            .filter(|(step, _)| *step % LOSS_SAMPLE_STRIDE == 0)
            .map(|(_, mean)| *mean)
            .collect();

        let sampled_mean = if sampled.is_empty() {
            // Degenerate logs with no sampled step fall back to all steps.
            self.means.iter().sum::<f64>() / self.means.len() as f64
        } else {
            sampled.iter().sum::<f64>() / sampled.len() as f64
        };

        let best = self.means.iter().copied().fold(f64::INFINITY, f64::min);

        LOSS_MEAN_WEIGHT * sampled_mean + (1.0 - LOSS_MEAN_WEIGHT) * best
    }
}

/// Load a trajectory log and collapse it to a per-step mean, keeping only
/// rows with `Step < max_steps`.
pub fn load_mean_trajectory(path: &Path, max_steps: u32) -> Result<MeanTrajectory, EvalError> {
    let unparsable = |message: String| EvalError::UnparsableArtifact {
        path: path.display().to_string(),
        message,
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_path(path)
        .map_err(|e| unparsable(e.to_string()))?;

    let mut by_step: BTreeMap<i64, (f64, u64)> = BTreeMap::new();
    for row in reader.deserialize() {
        let row: LogRow = row.map_err(|e| unparsable(e.to_string()))?;
        if row.step >= i64::from(max_steps) {
            continue;
        }
        let entry = by_step.entry(row.step).or_insert((0.0, 0));
        entry.0 += row.best_value;
        entry.1 += 1;
    }

    if by_step.is_empty() {
        return Err(unparsable("no trajectory rows within the step budget".into()));
    }

    let mut steps = Vec::with_capacity(by_step.len());
    let mut means = Vec::with_capacity(by_step.len());
    for (step, (sum, count)) in by_step {
        steps.push(step);
        means.push(sum / count as f64);
    }

    Ok(MeanTrajectory { steps, means })
}
