//! Error types for the availability survey.

use std::time::Duration;

use thiserror::Error;

use crate::providers::ComputeError;

/// Errors that abort a survey run.
///
/// Capacity-class operation failures are not errors: they come back as
/// [`CreateOutcome::CapacityUnavailable`](crate::lifecycle::CreateOutcome).
#[derive(Error, Debug)]
pub enum FinderError {
    #[error("Failed to read config file '{path}': {reason}")]
    ConfigRead { path: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(
        "Machine type {machine_type} carries {encoded} GPUs but number_of_gpus is {requested}; \
         match the number of GPUs with the machine type"
    )]
    AcceleratorCountMismatch {
        machine_type: String,
        encoded: u32,
        requested: u32,
    },

    #[error("No machine types of {machine_type} are available")]
    NoCapableZones { machine_type: String },

    #[error(
        "No accelerator types of {accelerator_type} are available with {machine_type} in any zone, \
         or wrong number of GPUs requested ({requested})"
    )]
    NoQuotaApprovedZones {
        accelerator_type: String,
        machine_type: String,
        requested: u32,
    },

    #[error("{kind} operation {operation} in {zone} failed with {code}: {message}")]
    OperationFailed {
        kind: OperationKind,
        operation: String,
        zone: String,
        code: String,
        message: String,
    },

    #[error("{kind} operation {operation} in {zone} did not finish within {timeout:?}")]
    OperationTimeout {
        kind: OperationKind,
        operation: String,
        zone: String,
        timeout: Duration,
    },

    #[error(transparent)]
    Provider(#[from] ComputeError),
}

/// Which lifecycle step an operation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Create,
    Delete,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Result alias used throughout the survey pipeline.
pub type FinderResult<T> = Result<T, FinderError>;
