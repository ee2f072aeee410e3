//! Best-trial selection and artifact cleanup.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use ht_types::{Trial, TrialArchive, TuneError, TuneResult};

/// Tolerance for treating two losses as tied: close when
/// `|a - b| <= max(rel * max(|a|, |b|), abs)`. Widen the relative tolerance
/// to prefer simpler parameterizations more aggressively.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionPolicy {
    pub rel_tolerance: f64,
    pub abs_tolerance: f64,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            rel_tolerance: 1e-9,
            abs_tolerance: 0.0,
        }
    }
}

impl SelectionPolicy {
    pub fn with_rel_tolerance(rel_tolerance: f64) -> Self {
        Self {
            rel_tolerance,
            ..Self::default()
        }
    }

    fn is_close(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= (self.rel_tolerance * a.abs().max(b.abs())).max(self.abs_tolerance)
    }
}

/// Pick the winning trial: minimum loss (earliest on exact ties), then
/// promote any near-tied trial with a strictly smaller `args_sum`. The
/// result is loss-optimal up to the tolerance and simplicity-optimal among
/// the near-ties.
pub fn select<'a>(archive: &'a TrialArchive, policy: &SelectionPolicy) -> TuneResult<&'a Trial> {
    let mut winner: Option<(&Trial, f64)> = None;
    for trial in archive.successes() {
        let Some(loss) = trial.loss else { continue };
        match winner {
            Some((_, best)) if loss >= best => {}
            _ => winner = Some((trial, loss)),
        }
    }

    let (mut winner, mut best_loss) = winner.ok_or(TuneError::NoSuccessfulTrials {
        total: archive.len(),
    })?;
    let mut best_args_sum = winner.args_sum.unwrap_or(f64::INFINITY);

    for trial in archive.successes() {
        let (Some(loss), Some(args_sum)) = (trial.loss, trial.args_sum) else {
            continue;
        };
        // Compared against the current winner, so promotions chain.
        if policy.is_close(best_loss, loss) && args_sum < best_args_sum {
            winner = trial;
            best_loss = loss;
            best_args_sum = args_sum;
        }
    }

    Ok(winner)
}

/// Select the winner and delete every other successful trial's artifact
/// pair (the trajectory log and its `.json` metadata sibling). Returns the
/// winning artifact path, the run's sole durable output.
pub fn select_and_cleanup(archive: &TrialArchive, policy: &SelectionPolicy) -> TuneResult<PathBuf> {
    let winner = select(archive, policy)?;
    let winner_artifact = winner
        .artifact
        .clone()
        .ok_or_else(|| TuneError::Config("winning trial has no artifact path".into()))?;

    for trial in archive.successes() {
        let Some(artifact) = trial.artifact.as_deref() else {
            continue;
        };
        if artifact == winner_artifact.as_path() {
            continue;
        }
        remove_artifact_pair(artifact);
    }

    info!(
        winner = %winner_artifact.display(),
        loss = ?winner.loss,
        args_sum = ?winner.args_sum,
        "selected winning trial"
    );
    Ok(winner_artifact)
}

fn remove_artifact_pair(artifact: &Path) {
    for path in [artifact.to_path_buf(), artifact.with_extension("json")] {
        match fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "removed losing artifact"),
            // Already gone is fine; the worker may not have written both.
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove artifact"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ht_types::{Assignment, ParamValue, Trial};
    use tempfile::TempDir;

    fn success(number: usize, loss: f64, args_sum: f64, artifact: &str) -> Trial {
        let mut assignment = Assignment::new();
        assignment.push("--step", ParamValue::Float(args_sum));
        Trial::success(number, assignment, PathBuf::from(artifact), loss, Utc::now())
    }

    #[test]
    fn empty_archive_has_no_winner() {
        let archive = TrialArchive::new();
        let err = select(&archive, &SelectionPolicy::default()).unwrap_err();
        match err {
            TuneError::NoSuccessfulTrials { total } => assert_eq!(total, 0),
            other => panic!("expected NoSuccessfulTrials, got {other:?}"),
        }
    }

    #[test]
    fn all_failures_has_no_winner() {
        let mut archive = TrialArchive::new();
        for i in 0..3 {
            archive.push(Trial::failure(i, Assignment::new(), "boom".into(), Utc::now()));
        }
        let err = select(&archive, &SelectionPolicy::default()).unwrap_err();
        match err {
            TuneError::NoSuccessfulTrials { total } => assert_eq!(total, 3),
            other => panic!("expected NoSuccessfulTrials, got {other:?}"),
        }
    }

    #[test]
    fn minimum_loss_wins_outside_tolerance() {
        let mut archive = TrialArchive::new();
        archive.push(success(0, 3.0, 0.1, "a.csv"));
        archive.push(success(1, 1.0, 9.9, "b.csv"));
        archive.push(success(2, 2.0, 0.2, "c.csv"));

        let winner = select(&archive, &SelectionPolicy::default()).unwrap();
        assert_eq!(winner.number, 1);
    }

    #[test]
    fn exact_tie_keeps_the_earliest_trial() {
        let mut archive = TrialArchive::new();
        archive.push(success(0, 1.0, 2.0, "a.csv"));
        archive.push(success(1, 1.0, 2.0, "b.csv"));

        let winner = select(&archive, &SelectionPolicy::default()).unwrap();
        assert_eq!(winner.number, 0);
    }

    #[test]
    fn near_tie_promotes_smaller_args_sum() {
        // Losses 1.000 and 1.0005 are tied under a 1e-3 relative tolerance;
        // 2.0 is not, so its tiny args_sum is irrelevant.
        let mut archive = TrialArchive::new();
        archive.push(success(0, 1.000, 3.0, "a.csv"));
        archive.push(success(1, 1.0005, 1.0, "b.csv"));
        archive.push(success(2, 2.0, 0.5, "c.csv"));

        let policy = SelectionPolicy::with_rel_tolerance(1e-3);
        let winner = select(&archive, &policy).unwrap();
        assert_eq!(winner.number, 1);
        assert_eq!(winner.args_sum, Some(1.0));
    }

    #[test]
    fn exact_tie_with_smaller_args_sum_promotes() {
        let mut archive = TrialArchive::new();
        archive.push(success(0, 1.0, 2.0, "a.csv"));
        archive.push(success(1, 1.0, 0.5, "b.csv"));

        let winner = select(&archive, &SelectionPolicy::default()).unwrap();
        assert_eq!(winner.number, 1);
    }

    #[test]
    fn cleanup_keeps_exactly_the_winners_pair() {
        let dir = TempDir::new().unwrap();
        let mut archive = TrialArchive::new();

        for (i, (loss, name)) in [(2.0, "a"), (1.0, "b"), (3.0, "c")].iter().enumerate() {
            let csv = dir.path().join(format!("{name}.csv"));
            let json = dir.path().join(format!("{name}.json"));
            std::fs::write(&csv, "log").unwrap();
            std::fs::write(&json, "{}").unwrap();
            archive.push(success(i, *loss, 1.0, &csv.display().to_string()));
        }
        archive.push(Trial::failure(3, Assignment::new(), "boom".into(), Utc::now()));

        let winner = select_and_cleanup(&archive, &SelectionPolicy::default()).unwrap();
        assert_eq!(winner, dir.path().join("b.csv"));

        assert!(dir.path().join("b.csv").exists());
        assert!(dir.path().join("b.json").exists());
        for name in ["a", "c"] {
            assert!(!dir.path().join(format!("{name}.csv")).exists());
            assert!(!dir.path().join(format!("{name}.json")).exists());
        }
    }

    #[test]
    fn cleanup_tolerates_already_missing_files() {
        let dir = TempDir::new().unwrap();
        let mut archive = TrialArchive::new();

        let winner_csv = dir.path().join("win.csv");
        std::fs::write(&winner_csv, "log").unwrap();
        archive.push(success(0, 1.0, 1.0, &winner_csv.display().to_string()));
        // Loser whose files were never written.
        archive.push(success(
            1,
            2.0,
            1.0,
            &dir.path().join("ghost.csv").display().to_string(),
        ));

        let winner = select_and_cleanup(&archive, &SelectionPolicy::default()).unwrap();
        assert_eq!(winner, winner_csv);
        assert!(winner_csv.exists());
    }
}
