//! Error types for Caliper core.

use thiserror::Error;

/// The main error type for Caliper core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Scheduler-related error.
    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Signal-related error.
    #[error("signal error: {0}")]
    Signal(#[from] SignalError),
}

/// Scheduler-specific errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// The task ID is invalid, was cancelled, or has already run.
    #[error("invalid or expired task ID")]
    InvalidTaskId,
}

/// Signal-specific errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    /// The connection ID is invalid or has already been disconnected.
    #[error("invalid or disconnected connection ID")]
    InvalidConnection,
}

/// A specialized Result type for Caliper core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
