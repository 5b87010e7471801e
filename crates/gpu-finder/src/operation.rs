//! Long-running operation polling and failure classification.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::error::{FinderError, FinderResult, OperationKind};
use crate::providers::{ComputeApi, Operation};

/// Default delay between operation status fetches.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Default upper bound on how long a single operation may take.
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 900;

/// Provider error codes meaning "no capacity here right now".
const CAPACITY_ERROR_CODES: &[&str] = &[
    "QUOTA_EXCEEDED",
    "ZONE_RESOURCE_POOL_EXHAUSTED",
    "ZONE_RESOURCE_POOL_EXHAUSTED_WITH_DETAILS",
];

/// How an operation failure should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Capacity or quota shortfall: move on to the next zone.
    Recoverable,
    /// Anything else: abort the run.
    Fatal,
}

/// Classify a provider operation error code.
#[must_use]
pub fn classify_error_code(code: &str) -> ErrorClass {
    if CAPACITY_ERROR_CODES.contains(&code) {
        ErrorClass::Recoverable
    } else {
        ErrorClass::Fatal
    }
}

/// Bounds for waiting on a long-running operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between status fetches.
    pub interval: Duration,
    /// Give up once this much time has passed since submission.
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            timeout: Duration::from_secs(DEFAULT_OPERATION_TIMEOUT_SECS),
        }
    }
}

/// Poll a zonal operation until the provider reports it as done.
///
/// The returned operation may still carry errors; interpreting them is up
/// to the caller.
///
/// # Errors
/// Returns [`FinderError::OperationTimeout`] once `policy.timeout` elapses,
/// or a provider error if a status fetch fails.
pub async fn wait_for_operation(
    api: &dyn ComputeApi,
    project: &str,
    operation: Operation,
    kind: OperationKind,
    policy: PollPolicy,
) -> FinderResult<Operation> {
    let start = Instant::now();
    let mut current = operation;

    loop {
        if current.is_done() {
            debug!(
                operation = %current.name,
                zone = %current.zone,
                elapsed_ms = start.elapsed().as_millis(),
                "Operation finished"
            );
            return Ok(current);
        }

        if start.elapsed() >= policy.timeout {
            return Err(FinderError::OperationTimeout {
                kind,
                operation: current.name,
                zone: current.zone,
                timeout: policy.timeout,
            });
        }

        tokio::time::sleep(policy.interval).await;

        current = api
            .get_zone_operation(project, &current.zone, &current.name)
            .await?;

        debug!(
            operation = %current.name,
            status = %current.status,
            elapsed_secs = start.elapsed().as_secs(),
            "Polling operation status"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_codes_are_recoverable() {
        assert_eq!(classify_error_code("QUOTA_EXCEEDED"), ErrorClass::Recoverable);
        assert_eq!(
            classify_error_code("ZONE_RESOURCE_POOL_EXHAUSTED"),
            ErrorClass::Recoverable
        );
        assert_eq!(
            classify_error_code("ZONE_RESOURCE_POOL_EXHAUSTED_WITH_DETAILS"),
            ErrorClass::Recoverable
        );
    }

    #[test]
    fn test_other_codes_are_fatal() {
        assert_eq!(classify_error_code("PERMISSION_DENIED"), ErrorClass::Fatal);
        assert_eq!(classify_error_code("RESOURCE_NOT_FOUND"), ErrorClass::Fatal);
        assert_eq!(classify_error_code(""), ErrorClass::Fatal);
        assert_eq!(classify_error_code("quota_exceeded"), ErrorClass::Fatal);
    }

    #[test]
    fn test_default_policy_is_bounded() {
        let policy = PollPolicy::default();
        assert!(policy.interval < policy.timeout);
    }

    #[test]
    fn test_timeout_message_keeps_sub_second_precision() {
        let err = FinderError::OperationTimeout {
            kind: OperationKind::Create,
            operation: "op-1".to_string(),
            zone: "us-central1-a".to_string(),
            timeout: Duration::from_millis(20),
        };
        assert_eq!(
            err.to_string(),
            "create operation op-1 in us-central1-a did not finish within 20ms"
        );
    }
}
