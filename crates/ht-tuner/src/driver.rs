//! The sequential search loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use ht_types::{Algorithm, Function, TrialArchive, TuneError, TuneResult};

use crate::evaluate::TrialRunner;
use crate::registry::search_space;
use crate::sampler::TpeSampler;

/// Cooperative cancellation flag, checked between trials. Cancelling stops
/// the loop after the in-flight trial resolves; the partial archive still
/// goes through selection.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Drives propose → evaluate → record, strictly sequentially: the sampler
/// is informed by every prior trial before the next proposal is made.
pub struct SearchDriver<R: TrialRunner> {
    runner: R,
    sampler: TpeSampler,
    cancel: CancelToken,
}

impl<R: TrialRunner> SearchDriver<R> {
    pub fn new(runner: R, sampler: TpeSampler) -> Self {
        Self {
            runner,
            sampler,
            cancel: CancelToken::new(),
        }
    }

    /// Handle for aborting the loop from outside (e.g. a signal handler).
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run the full search. The registry's budget override, when present,
    /// supersedes `max_evaluations`. Failed trials consume budget like any
    /// other; only run-level problems surface as errors.
    pub async fn search(
        &mut self,
        algorithm: Algorithm,
        function: Function,
        times: u32,
        max_evaluations: usize,
    ) -> TuneResult<TrialArchive> {
        let spec = search_space(algorithm, function).ok_or_else(|| {
            TuneError::UnknownSearchSpace {
                algorithm: algorithm.id().to_string(),
                function: function.id().to_string(),
            }
        })?;
        let budget = spec.max_evaluations.unwrap_or(max_evaluations);
        info!(%algorithm, %function, budget, times, "starting hyperparameter search");

        let mut archive = TrialArchive::new();
        for number in 0..budget {
            if self.cancel.is_cancelled() {
                warn!(completed = archive.len(), "search cancelled, selecting over completed trials");
                break;
            }

            let assignment = self.sampler.suggest(&spec.space);
            let trial = self
                .runner
                .run(algorithm, function, times, number, assignment.clone())
                .await;

            if let Some(loss) = trial.loss {
                self.sampler.observe(assignment, loss);
            }
            archive.push(trial);
        }

        info!(
            trials = archive.len(),
            successes = archive.successes().count(),
            "search finished"
        );
        Ok(archive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use ht_types::{Assignment, Trial};
    use std::path::PathBuf;
    use std::sync::atomic::AtomicUsize;

    struct StubRunner {
        calls: AtomicUsize,
        fail: bool,
    }

    impl StubRunner {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl TrialRunner for StubRunner {
        async fn run(
            &self,
            _algorithm: Algorithm,
            _function: Function,
            _times: u32,
            number: usize,
            assignment: Assignment,
        ) -> Trial {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Trial::failure(number, assignment, "stub failure".into(), Utc::now())
            } else {
                Trial::success(
                    number,
                    assignment,
                    PathBuf::from(format!("trial-{number}.csv")),
                    number as f64,
                    Utc::now(),
                )
            }
        }
    }

    fn driver(fail: bool) -> SearchDriver<StubRunner> {
        SearchDriver::new(StubRunner::new(fail), TpeSampler::new(1))
    }

    #[tokio::test]
    async fn zero_budget_yields_an_empty_archive() {
        let mut driver = driver(false);
        let archive = driver
            .search(Algorithm::HillClimbing, Function::Rastrigin, 5, 0)
            .await
            .unwrap();
        assert!(archive.is_empty());
        assert_eq!(driver.runner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn budget_override_supersedes_the_default() {
        let mut driver = driver(false);
        let archive = driver
            .search(Algorithm::HillClimbingAdSs, Function::Rastrigin, 5, 350)
            .await
            .unwrap();
        assert_eq!(archive.len(), 50);
    }

    #[tokio::test]
    async fn default_budget_applies_without_override() {
        let mut driver = driver(false);
        let archive = driver
            .search(Algorithm::HillClimbing, Function::Rosenbrock, 5, 7)
            .await
            .unwrap();
        assert_eq!(archive.len(), 7);
        assert_eq!(archive.successes().count(), 7);
    }

    #[tokio::test]
    async fn failures_still_consume_budget() {
        let mut driver = driver(true);
        let archive = driver
            .search(Algorithm::DifferenceEvolution, Function::Rastrigin, 5, 9)
            .await
            .unwrap();
        assert_eq!(archive.len(), 9);
        assert_eq!(archive.successes().count(), 0);
        assert_eq!(driver.runner.calls.load(Ordering::SeqCst), 9);
    }

    #[tokio::test]
    async fn unknown_space_is_a_startup_error() {
        let mut driver = driver(false);
        let err = driver
            .search(Algorithm::MonteCarlo, Function::Rastrigin, 5, 10)
            .await
            .unwrap_err();
        match err {
            TuneError::UnknownSearchSpace { algorithm, .. } => {
                assert_eq!(algorithm, "MONTE_CARLO")
            }
            other => panic!("expected UnknownSearchSpace, got {other:?}"),
        }
        assert_eq!(driver.runner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancellation_stops_the_loop_early() {
        let mut driver = driver(false);
        driver.cancel_token().cancel();
        let archive = driver
            .search(Algorithm::HillClimbing, Function::Rastrigin, 5, 100)
            .await
            .unwrap();
        assert!(archive.is_empty());
    }

    #[tokio::test]
    async fn trial_numbers_follow_evaluation_order() {
        let mut driver = driver(false);
        let archive = driver
            .search(Algorithm::ParticleSwarmOptimization, Function::Rosenbrock, 5, 5)
            .await
            .unwrap();
        let numbers: Vec<usize> = archive.iter().map(|t| t.number).collect();
        assert_eq!(numbers, vec![0, 1, 2, 3, 4]);
    }
}
