//! Accelerator quota validation.

use serde::Serialize;
use tracing::{info, warn};

use crate::capability::CapableZone;
use crate::config::InstanceConfig;
use crate::error::FinderResult;
use crate::providers::{AcceleratorType, ComputeApi};

/// A capable zone whose accelerator catalog allows the requested count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaApprovedZone {
    /// Capability record this approval extends.
    #[serde(flatten)]
    pub capable: CapableZone,
    /// Accelerator type name.
    pub accelerator_name: String,
    /// Accelerator description.
    pub accelerator_description: String,
    /// Maximum accelerators attachable to one instance in this zone.
    pub maximum_cards_per_instance: u32,
}

impl QuotaApprovedZone {
    /// Zone name.
    #[must_use]
    pub fn zone(&self) -> &str {
        &self.capable.zone.zone
    }

    /// Region name.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.capable.zone.region
    }
}

/// Outcome of checking one zone's accelerator limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    /// The zone allows the requested count.
    Approved { maximum: u32 },
    /// The zone allows fewer cards than requested.
    Rejected { maximum: u32 },
}

/// Compare a requested accelerator count against a catalog entry.
#[must_use]
pub const fn evaluate(requested: u32, accelerator: &AcceleratorType) -> QuotaDecision {
    let maximum = accelerator.maximum_cards_per_instance;
    if requested <= maximum {
        QuotaDecision::Approved { maximum }
    } else {
        QuotaDecision::Rejected { maximum }
    }
}

/// Keep the zones whose `gpu_type` entry allows `requested` cards per instance.
///
/// An empty result is returned as-is; the caller decides whether that ends
/// the run.
///
/// # Errors
/// Propagates provider listing errors.
pub async fn filter_quota(
    api: &dyn ComputeApi,
    project: &str,
    config: &InstanceConfig,
    zones: Vec<CapableZone>,
    requested: u32,
) -> FinderResult<Vec<QuotaApprovedZone>> {
    let mut approved = Vec::new();

    for capable in zones {
        let matches =
            matching_accelerators(api, project, &capable.zone.zone, &config.gpu_type).await?;

        if matches.is_empty() {
            warn!(
                zone = %capable.zone.zone,
                accelerator_type = %config.gpu_type,
                "Accelerator type not offered in zone"
            );
            continue;
        }

        for accelerator in matches {
            match evaluate(requested, &accelerator) {
                QuotaDecision::Approved { maximum } => {
                    info!(
                        zone = %capable.zone.zone,
                        accelerator_type = %accelerator.name,
                        requested,
                        maximum,
                        "Zone allows requested GPUs per instance"
                    );
                    approved.push(QuotaApprovedZone {
                        capable: capable.clone(),
                        accelerator_name: accelerator.name,
                        accelerator_description: accelerator.description,
                        maximum_cards_per_instance: maximum,
                    });
                }
                QuotaDecision::Rejected { maximum } => {
                    info!(
                        zone = %capable.zone.zone,
                        accelerator_type = %accelerator.name,
                        requested,
                        maximum,
                        "Zone does not allow enough GPUs per instance"
                    );
                }
            }
        }
    }

    Ok(approved)
}

/// Page through a zone's accelerator types, collecting entries named `name`.
async fn matching_accelerators(
    api: &dyn ComputeApi,
    project: &str,
    zone: &str,
    name: &str,
) -> FinderResult<Vec<AcceleratorType>> {
    let mut found = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let page = api
            .list_accelerator_types(project, zone, page_token.as_deref())
            .await?;

        found.extend(page.items.into_iter().filter(|a| a.name == name));

        match page.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => return Ok(found),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accelerator(maximum: u32) -> AcceleratorType {
        AcceleratorType {
            name: "nvidia-tesla-a100".to_string(),
            description: "NVIDIA A100 40GB".to_string(),
            maximum_cards_per_instance: maximum,
        }
    }

    #[test]
    fn test_evaluate_boundaries() {
        assert_eq!(
            evaluate(4, &accelerator(4)),
            QuotaDecision::Approved { maximum: 4 }
        );
        assert_eq!(
            evaluate(1, &accelerator(16)),
            QuotaDecision::Approved { maximum: 16 }
        );
        assert_eq!(
            evaluate(8, &accelerator(4)),
            QuotaDecision::Rejected { maximum: 4 }
        );
    }
}
