//! # ht-tuner
//!
//! Hyperparameter tuning orchestrator for black-box optimization algorithms.
//!
//! Maps each algorithm to a declarative search space, drives a sequential
//! model-based search that evaluates sampled assignments through an external
//! worker process (with a hard per-trial timeout), and selects the winning
//! trial by loss with a simplicity-aware near-tie rule, cleaning up every
//! other trial's artifacts.

mod driver;
mod encode;
mod evaluate;
mod registry;
mod sampler;
mod select;
mod space;
mod trajectory;

pub use driver::{CancelToken, SearchDriver};
pub use encode::build_invocation;
pub use evaluate::{TrialEvaluator, TrialRunner, WorkerConfig, DEFAULT_WORKER_TIMEOUT};
pub use registry::{search_space, SpaceSpec};
pub use sampler::TpeSampler;
pub use select::{select, select_and_cleanup, SelectionPolicy};
pub use space::{Distribution, FlagDef, HyperparameterSpace};
pub use trajectory::{load_mean_trajectory, MeanTrajectory};
