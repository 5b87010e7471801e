//! End-to-end availability survey.

use chrono::Utc;
use tracing::{info, warn};

use crate::capability::filter_capable;
use crate::config::FinderConfig;
use crate::error::{FinderError, FinderResult};
use crate::operation::PollPolicy;
use crate::provision::{delete_all, group_by_region, provision};
use crate::providers::ComputeApi;
use crate::quota::{filter_quota, QuotaApprovedZone};
use crate::report::{RegionAttemptSummary, SurveyReport};
use crate::zones::{list_zones, restrict_to};

/// Resolve the zones that can host the configured instance, without
/// creating anything.
///
/// The configuration is validated before the first provider call.
///
/// # Errors
/// Returns [`FinderError::NoCapableZones`] or
/// [`FinderError::NoQuotaApprovedZones`] when a filter stage comes back
/// empty, and propagates configuration and provider errors.
pub async fn qualifying_zones(
    api: &dyn ComputeApi,
    config: &FinderConfig,
) -> FinderResult<Vec<QuotaApprovedZone>> {
    config.validate()?;

    let project = config.project_id.as_str();
    let ic = &config.instance_config;

    let all_zones = list_zones(api, project).await?;
    let zones = if ic.zone.is_empty() {
        info!("Processing all zones");
        all_zones
    } else {
        info!(zones = ?ic.zone, "Processing selected zones");
        restrict_to(all_zones, &ic.zone)
    };

    let capable = filter_capable(api, project, &ic.machine_type, &ic.gpu_type, zones).await?;
    if capable.is_empty() {
        return Err(FinderError::NoCapableZones {
            machine_type: ic.machine_type.clone(),
        });
    }

    let approved = filter_quota(api, project, ic, capable, ic.number_of_gpus).await?;
    if approved.is_empty() {
        return Err(FinderError::NoQuotaApprovedZones {
            accelerator_type: ic.gpu_type.clone(),
            machine_type: ic.machine_type.clone(),
            requested: ic.number_of_gpus,
        });
    }

    Ok(approved)
}

/// Probe every qualifying region by creating and then deleting trial
/// instances, one region at a time.
///
/// Each region's instances are deleted before the next region starts.
///
/// # Errors
/// Returns the first fatal error; capacity shortfalls are not errors.
pub async fn run(
    api: &dyn ComputeApi,
    config: &FinderConfig,
    policy: PollPolicy,
) -> FinderResult<SurveyReport> {
    let started_at = Utc::now();
    let target = config.target_instances()?;
    let project = config.project_id.as_str();
    let ic = &config.instance_config;

    let approved = qualifying_zones(api, config).await?;
    let mut regions = Vec::new();

    for (region, zones) in group_by_region(approved) {
        info!(
            region = %region,
            machine_type = %ic.machine_type,
            zones = zones.len(),
            "Machine type is available in region"
        );

        let created = provision(api, project, ic, target, &zones, policy).await?;
        if created.is_empty() {
            info!(region = %region, "No instances created in region");
        } else {
            info!(region = %region, created = created.len(), "Created instances in region");
            delete_all(api, project, &created, policy).await?;
        }

        regions.push(RegionAttemptSummary {
            region,
            zones_attempted: zones,
            instances_created: created,
        });
    }

    let report = SurveyReport {
        started_at,
        finished_at: Utc::now(),
        machine_type: ic.machine_type.clone(),
        accelerator_type: ic.gpu_type.clone(),
        accelerator_count: ic.number_of_gpus,
        regions,
    };

    if report.successful_regions().is_empty() {
        warn!(
            machine_type = %ic.machine_type,
            accelerator_type = %ic.gpu_type,
            "No region could host the requested instance"
        );
    }

    Ok(report)
}
