//! Error types for the schedulers

use crate::report::StuckReport;
use rlmeta_engine::EvalError;
use thiserror::Error;

/// Why a simulation stopped without finishing
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A round consumed no message under the failing policy
    #[error("simulation stuck in round {round}:\n{report}")]
    Stuck { round: usize, report: StuckReport },

    /// A matched component's action could not be evaluated
    #[error("evaluating action of {component} failed: {source}")]
    Eval {
        component: String,
        #[source]
        source: EvalError,
    },

    /// The broker went away while a worker was talking to it
    #[error("broker disconnected")]
    Disconnected,

    /// A worker task panicked or was cancelled
    #[error("worker failed: {0}")]
    Worker(String),
}

/// Result type using SchedulerError
pub type Result<T> = std::result::Result<T, SchedulerError>;
