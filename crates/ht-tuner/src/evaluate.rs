//! Per-trial evaluation: worker invocation, bounded wait, artifact parsing.

use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time;
use tracing::{debug, info, warn};

use ht_types::{Algorithm, Assignment, EvalError, Function, Trial};

use crate::encode::build_invocation;
use crate::trajectory::load_mean_trajectory;

/// Hard wall-clock bound per worker invocation, measured from spawn.
pub const DEFAULT_WORKER_TIMEOUT: Duration = Duration::from_secs(15);

/// How to reach the external worker.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    /// Leading command tokens (binary plus any fixed arguments).
    pub command: Vec<String>,
    pub timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            command: vec!["java".into(), "-jar".into(), "worker.jar".into()],
            timeout: DEFAULT_WORKER_TIMEOUT,
        }
    }
}

impl WorkerConfig {
    /// Default worker command, overridable via `HYPERTUNE_WORKER`
    /// (whitespace-separated tokens).
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var("HYPERTUNE_WORKER") {
            let tokens: Vec<String> = raw.split_whitespace().map(str::to_string).collect();
            if !tokens.is_empty() {
                config.command = tokens;
            }
        }
        config
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Seam between the search driver and trial execution, so the driver can be
/// exercised with a stub runner in tests.
#[async_trait]
pub trait TrialRunner: Send + Sync {
    async fn run(
        &self,
        algorithm: Algorithm,
        function: Function,
        times: u32,
        number: usize,
        assignment: Assignment,
    ) -> Trial;
}

/// Subprocess-backed trial evaluation.
pub struct TrialEvaluator {
    config: WorkerConfig,
}

impl TrialEvaluator {
    pub fn new(config: WorkerConfig) -> Self {
        Self { config }
    }

    async fn run_worker(&self, tokens: &[String]) -> Result<std::process::Output, EvalError> {
        let (program, args) = tokens.split_first().ok_or_else(|| {
            EvalError::Process(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "empty worker command",
            ))
        })?;

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // On timeout the wait future is dropped along with the child handle;
        // kill_on_drop then terminates and reaps the worker, so no orphan
        // survives this call.
        match time::timeout(self.config.timeout, child.wait_with_output()).await {
            Ok(output) => Ok(output?),
            Err(_) => Err(EvalError::WorkerTimeout {
                timeout_seconds: self.config.timeout.as_secs(),
            }),
        }
    }

    async fn evaluate(
        &self,
        algorithm: Algorithm,
        function: Function,
        times: u32,
        assignment: &Assignment,
    ) -> Result<(PathBuf, f64), EvalError> {
        let tokens = build_invocation(&self.config.command, algorithm, function, times, assignment);
        debug!(command = ?tokens, "spawning worker");

        let output = self.run_worker(&tokens).await?;

        // Any diagnostic text on stderr marks the trial failed, whatever the
        // exit status says.
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        if !stderr.is_empty() {
            return Err(EvalError::WorkerReportedError {
                stderr: stderr.to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let first_line = stdout.lines().next().unwrap_or("").trim();
        if first_line.is_empty() {
            return Err(EvalError::UnparsableArtifact {
                path: "<stdout>".into(),
                message: "worker printed no artifact path".into(),
            });
        }

        let artifact = PathBuf::from(first_line);
        let trajectory = load_mean_trajectory(&artifact, function.step_budget())?;
        Ok((artifact, trajectory.loss()))
    }
}

#[async_trait]
impl TrialRunner for TrialEvaluator {
    async fn run(
        &self,
        algorithm: Algorithm,
        function: Function,
        times: u32,
        number: usize,
        assignment: Assignment,
    ) -> Trial {
        let started_at = Utc::now();
        match self.evaluate(algorithm, function, times, &assignment).await {
            Ok((artifact, loss)) => {
                info!(trial = number, loss, artifact = %artifact.display(), "trial succeeded");
                Trial::success(number, assignment, artifact, loss, started_at)
            }
            Err(err) => {
                warn!(trial = number, error = %err, "trial failed");
                Trial::failure(number, assignment, err.to_string(), started_at)
            }
        }
    }
}
