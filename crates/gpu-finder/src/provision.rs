//! Per-region trial provisioning.

use tracing::{error, info, warn};

use crate::config::InstanceConfig;
use crate::error::{FinderError, FinderResult, OperationKind};
use crate::lifecycle::{self, instance_name, CreateOutcome, InstanceRecord};
use crate::operation::PollPolicy;
use crate::providers::ComputeApi;
use crate::quota::QuotaApprovedZone;

/// Group approved zones by region, keeping first-seen region order and the
/// input order of zones within a region.
#[must_use]
pub fn group_by_region(zones: Vec<QuotaApprovedZone>) -> Vec<(String, Vec<QuotaApprovedZone>)> {
    let mut groups: Vec<(String, Vec<QuotaApprovedZone>)> = Vec::new();

    for zone in zones {
        match groups.iter_mut().find(|(region, _)| region.as_str() == zone.region()) {
            Some((_, members)) => members.push(zone),
            None => groups.push((zone.region().to_string(), vec![zone])),
        }
    }

    groups
}

/// Create up to `target` trial instances, one per zone, in input order.
///
/// Capacity-class failures move on to the next zone. Running out of zones
/// before reaching `target` is not an error; whatever was created is
/// returned. On a fatal error the instances created so far are deleted
/// before the error is returned. A create that timed out counts as created
/// for that cleanup, since the provider already accepted it.
///
/// # Errors
/// Returns the first fatal creation error.
pub async fn provision(
    api: &dyn ComputeApi,
    project: &str,
    config: &InstanceConfig,
    target: u32,
    zones: &[QuotaApprovedZone],
    policy: PollPolicy,
) -> FinderResult<Vec<InstanceRecord>> {
    let target = target as usize;
    let mut created: Vec<InstanceRecord> = Vec::new();

    if target == 0 {
        return Ok(created);
    }

    for zone in zones {
        let name = instance_name(&config.name, created.len() + 1, zone.zone());

        let outcome =
            match lifecycle::create_instance(api, project, &name, config, zone.zone(), policy)
                .await
            {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!(
                        instance = %name,
                        zone = %zone.zone(),
                        error = %err,
                        "Instance creation failed"
                    );
                    if matches!(
                        err,
                        FinderError::OperationTimeout {
                            kind: OperationKind::Create,
                            ..
                        }
                    ) {
                        warn!(
                            instance = %name,
                            zone = %zone.zone(),
                            "Create operation timed out; the instance may still come up"
                        );
                        created.push(InstanceRecord {
                            name: name.clone(),
                            zone: zone.zone().to_string(),
                        });
                    }
                    cleanup(api, project, &created, policy).await;
                    return Err(err);
                }
            };

        match outcome {
            CreateOutcome::Created(record) => {
                created.push(record);
                info!(
                    instance = %name,
                    zone = %zone.zone(),
                    remaining = target - created.len(),
                    "Trial instance created"
                );
            }
            CreateOutcome::CapacityUnavailable { code, .. } => {
                info!(zone = %zone.zone(), code = %code, "Moving on to next zone");
            }
        }

        if created.len() >= target {
            info!(
                region = %zone.region(),
                created = created.len(),
                "Reached the desired number of instances"
            );
            return Ok(created);
        }
    }

    warn!(
        target,
        created = created.len(),
        "All zones attempted without reaching the desired number of instances"
    );
    Ok(created)
}

/// Delete every record in order, stopping at the first failure.
///
/// The instances left behind by a failure are logged by name.
///
/// # Errors
/// Returns the first deletion failure.
pub async fn delete_all(
    api: &dyn ComputeApi,
    project: &str,
    records: &[InstanceRecord],
    policy: PollPolicy,
) -> FinderResult<()> {
    info!(count = records.len(), "Deleting trial instances");
    for (index, record) in records.iter().enumerate() {
        if let Err(err) = lifecycle::delete_instance(api, project, record, policy).await {
            let remaining: Vec<String> = records[index..]
                .iter()
                .map(|r| format!("{} ({})", r.name, r.zone))
                .collect();
            error!(
                instance = %record.name,
                error = %err,
                remaining = ?remaining,
                "Stopped deleting trial instances; delete the remaining ones manually"
            );
            return Err(err);
        }
    }
    Ok(())
}

/// Best-effort deletion after a fatal error; failures are logged only.
async fn cleanup(
    api: &dyn ComputeApi,
    project: &str,
    records: &[InstanceRecord],
    policy: PollPolicy,
) {
    for record in records {
        if let Err(err) = lifecycle::delete_instance(api, project, record, policy).await {
            error!(
                instance = %record.name,
                zone = %record.zone,
                error = %err,
                "Failed to clean up trial instance; delete it manually"
            );
        }
    }
}
