use thiserror::Error;

/// Run-level error type for HyperTune.
///
/// Individual trial failures never surface here; they are absorbed into
/// FAILURE-status trials by the evaluator. Only errors that abort the whole
/// run (bad identifiers, an archive with no successes, IO trouble during
/// cleanup) use this type.
#[derive(Error, Debug)]
pub enum TuneError {
    #[error("Unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("No search space registered for algorithm {algorithm} on {function}")]
    UnknownSearchSpace {
        algorithm: String,
        function: String,
    },

    #[error("No successful trials in archive ({total} trials, all failed)")]
    NoSuccessfulTrials { total: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-trial evaluation error. Every variant resolves to a FAILURE trial;
/// none of them propagate out of the evaluator.
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Worker timed out after {timeout_seconds}s and was killed")]
    WorkerTimeout { timeout_seconds: u64 },

    #[error("Worker reported an error: {stderr}")]
    WorkerReportedError { stderr: String },

    #[error("Unparsable artifact at {path}: {message}")]
    UnparsableArtifact { path: String, message: String },

    #[error("Worker process error: {0}")]
    Process(#[from] std::io::Error),
}

/// Result type alias for HyperTune operations.
pub type TuneResult<T> = Result<T, TuneError>;
