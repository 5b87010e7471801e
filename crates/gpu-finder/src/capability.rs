//! Machine-type capability filtering.

use serde::Serialize;
use tracing::{debug, info};

use crate::error::FinderResult;
use crate::providers::{ComputeApi, MachineAccelerator, MachineType};
use crate::zones::ZoneInfo;

/// A zone whose catalog offers the requested machine type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapableZone {
    /// Zone and region.
    #[serde(flatten)]
    pub zone: ZoneInfo,
    /// Matched machine type name.
    pub machine_type: String,
    /// vCPUs of the machine type.
    pub guest_cpus: u32,
    /// Machine type description.
    pub description: String,
    /// Bundled accelerator, present only when it is the requested type.
    pub accelerator: Option<MachineAccelerator>,
}

impl CapableZone {
    /// Build a capable-zone record from a matching catalog entry.
    fn from_machine(zone: ZoneInfo, machine: MachineType, accelerator_type: &str) -> Self {
        let accelerator = machine
            .accelerators
            .into_iter()
            .next()
            .filter(|a| a.accelerator_type == accelerator_type);

        Self {
            zone,
            machine_type: machine.name,
            guest_cpus: machine.guest_cpus,
            description: machine.description,
            accelerator,
        }
    }

    /// Whether the machine type ships with the requested accelerator.
    #[must_use]
    pub const fn has_paired_accelerator(&self) -> bool {
        self.accelerator.is_some()
    }
}

/// Keep the zones whose machine-type catalog has `machine_type`.
///
/// An empty result is returned as-is; the caller decides whether that ends
/// the run.
///
/// # Errors
/// Propagates provider listing errors.
pub async fn filter_capable(
    api: &dyn ComputeApi,
    project: &str,
    machine_type: &str,
    accelerator_type: &str,
    zones: Vec<ZoneInfo>,
) -> FinderResult<Vec<CapableZone>> {
    let mut capable = Vec::new();

    for zone in zones {
        let found = find_machine_type(api, project, &zone.zone, machine_type).await?;
        let Some(machine) = found else {
            debug!(zone = %zone.zone, machine_type = %machine_type, "Machine type not offered");
            continue;
        };

        let record = CapableZone::from_machine(zone, machine, accelerator_type);
        if record.has_paired_accelerator() {
            info!(
                zone = %record.zone.zone,
                machine_type = %machine_type,
                accelerator_type = %accelerator_type,
                "Machine type offered with requested accelerator"
            );
        } else {
            info!(
                zone = %record.zone.zone,
                machine_type = %machine_type,
                accelerator_type = %accelerator_type,
                "Machine type offered without requested accelerator bundled"
            );
        }
        capable.push(record);
    }

    Ok(capable)
}

/// Page through a zone's machine types looking for an exact name match.
async fn find_machine_type(
    api: &dyn ComputeApi,
    project: &str,
    zone: &str,
    machine_type: &str,
) -> FinderResult<Option<MachineType>> {
    let mut page_token: Option<String> = None;

    loop {
        let page = api
            .list_machine_types(project, zone, page_token.as_deref())
            .await?;

        if let Some(found) = page.items.into_iter().find(|m| m.name == machine_type) {
            return Ok(Some(found));
        }

        match page.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => return Ok(None),
        }
    }
}
