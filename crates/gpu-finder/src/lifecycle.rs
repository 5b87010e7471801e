//! Trial instance creation and deletion.

use serde::Serialize;
use tracing::{info, warn};

use crate::config::InstanceConfig;
use crate::error::{FinderError, FinderResult, OperationKind};
use crate::operation::{classify_error_code, wait_for_operation, ErrorClass, PollPolicy};
use crate::providers::{ComputeApi, InstanceSpec, SchedulingPolicy};

/// A trial instance known to exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceRecord {
    /// Instance name.
    pub name: String,
    /// Zone the instance lives in.
    pub zone: String,
}

/// Result of one creation attempt that did not abort the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The instance exists.
    Created(InstanceRecord),
    /// The zone has no capacity or quota for the instance right now.
    CapacityUnavailable {
        /// Zone that was tried.
        zone: String,
        /// Provider error code.
        code: String,
        /// Provider error message.
        message: String,
    },
}

/// Name for the `ordinal`-th trial instance of a run, placed in `zone`.
#[must_use]
pub fn instance_name(base: &str, ordinal: usize, zone: &str) -> String {
    format!("{base}-{ordinal}-{zone}")
}

/// Assemble the full instance specification for a trial instance.
#[must_use]
pub fn build_spec(
    name: &str,
    config: &InstanceConfig,
    zone: &str,
    source_image: String,
) -> InstanceSpec {
    InstanceSpec {
        name: name.to_string(),
        zone: zone.to_string(),
        machine_type: config.machine_type.clone(),
        source_image,
        disk_type: config.disk_type.clone(),
        disk_size_gb: config.disk_size,
        accelerator_type: config.gpu_type.clone(),
        accelerator_count: config.number_of_gpus,
        network: config.network_interfaces.network.clone(),
        external_access: true,
        tags: config.firewall_rules.clone(),
        scheduling: SchedulingPolicy {
            preemptible: false,
            on_host_maintenance: "TERMINATE".to_string(),
            automatic_restart: true,
        },
        service_account_email: config.identity_and_api_access.service_account_email.clone(),
        scopes: config.identity_and_api_access.scopes.clone(),
    }
}

/// Create one trial instance and wait for the provider to settle it.
///
/// # Errors
/// Returns an error for provider failures, poll timeouts, and any operation
/// error that is not capacity-class.
pub async fn create_instance(
    api: &dyn ComputeApi,
    project: &str,
    name: &str,
    config: &InstanceConfig,
    zone: &str,
    policy: PollPolicy,
) -> FinderResult<CreateOutcome> {
    info!(instance = %name, zone = %zone, "Creating instance");

    let source_image = api
        .image_from_family(&config.image_project, &config.image_family)
        .await?;
    let spec = build_spec(name, config, zone, source_image);

    let operation = api.insert_instance(project, &spec).await?;
    info!(instance = %name, operation = %operation.name, "Waiting for create operation");
    let finished =
        wait_for_operation(api, project, operation, OperationKind::Create, policy).await?;

    let Some(error) = finished.first_error() else {
        info!(instance = %name, zone = %zone, "Instance created");
        return Ok(CreateOutcome::Created(InstanceRecord {
            name: name.to_string(),
            zone: zone.to_string(),
        }));
    };

    match classify_error_code(&error.code) {
        ErrorClass::Recoverable => {
            warn!(
                instance = %name,
                zone = %zone,
                code = %error.code,
                message = %error.message,
                "No capacity for instance in zone"
            );
            Ok(CreateOutcome::CapacityUnavailable {
                zone: zone.to_string(),
                code: error.code.clone(),
                message: error.message.clone(),
            })
        }
        ErrorClass::Fatal => Err(FinderError::OperationFailed {
            kind: OperationKind::Create,
            operation: finished.name.clone(),
            zone: zone.to_string(),
            code: error.code.clone(),
            message: error.message.clone(),
        }),
    }
}

/// Delete a trial instance and wait for the deletion to finish.
///
/// # Errors
/// Any failure is returned; deleting our own instance is expected to succeed.
pub async fn delete_instance(
    api: &dyn ComputeApi,
    project: &str,
    record: &InstanceRecord,
    policy: PollPolicy,
) -> FinderResult<()> {
    info!(instance = %record.name, zone = %record.zone, "Deleting instance");

    let operation = api
        .delete_instance(project, &record.zone, &record.name)
        .await?;
    let finished =
        wait_for_operation(api, project, operation, OperationKind::Delete, policy).await?;

    if let Some(error) = finished.first_error() {
        return Err(FinderError::OperationFailed {
            kind: OperationKind::Delete,
            operation: finished.name.clone(),
            zone: record.zone.clone(),
            code: error.code.clone(),
            message: error.message.clone(),
        });
    }

    info!(instance = %record.name, zone = %record.zone, "Instance deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{tests::sample_json, FinderConfig};

    #[test]
    fn test_instance_name() {
        assert_eq!(
            instance_name("gpu-probe", 1, "us-central1-a"),
            "gpu-probe-1-us-central1-a"
        );
        assert_ne!(
            instance_name("gpu-probe", 1, "us-central1-a"),
            instance_name("gpu-probe", 2, "us-central1-a")
        );
    }

    #[test]
    fn test_build_spec() {
        let config = FinderConfig::from_json(&sample_json("a2-highgpu-1g", 1)).unwrap();
        let spec = build_spec(
            "gpu-probe-1-us-central1-a",
            &config.instance_config,
            "us-central1-a",
            "projects/debian-cloud/global/images/debian-12-v1".to_string(),
        );

        assert_eq!(spec.zone, "us-central1-a");
        assert_eq!(spec.accelerator_type, "nvidia-tesla-a100");
        assert_eq!(spec.accelerator_count, 1);
        assert_eq!(spec.disk_size_gb, 200);
        assert!(spec.external_access);
        assert!(!spec.scheduling.preemptible);
        assert!(spec.scheduling.automatic_restart);
        assert_eq!(spec.scheduling.on_host_maintenance, "TERMINATE");
        assert_eq!(spec.tags, vec!["http-server".to_string()]);
    }
}
