//! Survey report assembly and rendering.

use chrono::{DateTime, Utc};
use comfy_table::{Cell, Color, ContentArrangement, Table};
use serde::Serialize;

use crate::lifecycle::InstanceRecord;
use crate::quota::QuotaApprovedZone;

/// What happened in one region.
#[derive(Debug, Clone, Serialize)]
pub struct RegionAttemptSummary {
    /// Region name.
    pub region: String,
    /// Zones that were candidates for provisioning, in attempt order.
    pub zones_attempted: Vec<QuotaApprovedZone>,
    /// Instances that were created (and since deleted).
    pub instances_created: Vec<InstanceRecord>,
}

/// One line of the final table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    /// Region name.
    pub region: String,
    /// Instance name.
    pub instance_name: String,
    /// Zone name.
    pub zone: String,
}

/// Outcome of a whole survey run.
#[derive(Debug, Clone, Serialize)]
pub struct SurveyReport {
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the last region finished.
    pub finished_at: DateTime<Utc>,
    /// Requested machine type.
    pub machine_type: String,
    /// Requested accelerator type.
    pub accelerator_type: String,
    /// Requested accelerators per instance.
    pub accelerator_count: u32,
    /// Per-region results, in processing order.
    pub regions: Vec<RegionAttemptSummary>,
}

impl SurveyReport {
    /// One row per instance that was created during the run.
    #[must_use]
    pub fn rows(&self) -> Vec<ReportRow> {
        self.regions
            .iter()
            .flat_map(|summary| {
                summary.instances_created.iter().map(|instance| ReportRow {
                    region: summary.region.clone(),
                    instance_name: instance.name.clone(),
                    zone: instance.zone.clone(),
                })
            })
            .collect()
    }

    /// Regions where at least one instance was created.
    #[must_use]
    pub fn successful_regions(&self) -> Vec<&str> {
        self.regions
            .iter()
            .filter(|r| !r.instances_created.is_empty())
            .map(|r| r.region.as_str())
            .collect()
    }
}

/// Render the created-instance table.
#[must_use]
pub fn report_table(report: &SurveyReport) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Region").fg(Color::Cyan),
        Cell::new("Instance Name").fg(Color::Cyan),
        Cell::new("Zone").fg(Color::Cyan),
    ]);

    for row in report.rows() {
        table.add_row(vec![
            Cell::new(row.region),
            Cell::new(row.instance_name).fg(Color::Green),
            Cell::new(row.zone),
        ]);
    }

    table
}

/// Render approved zones grouped by region, for the read-only listing.
#[must_use]
pub fn approved_zones_table(groups: &[(String, Vec<QuotaApprovedZone>)]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Region").fg(Color::Cyan),
        Cell::new("Zone").fg(Color::Cyan),
        Cell::new("Machine Type").fg(Color::Cyan),
        Cell::new("vCPUs").fg(Color::Cyan),
        Cell::new("Accelerator").fg(Color::Cyan),
        Cell::new("Max per Instance").fg(Color::Cyan),
    ]);

    for (region, zones) in groups {
        for zone in zones {
            table.add_row(vec![
                Cell::new(region),
                Cell::new(zone.zone()),
                Cell::new(&zone.capable.machine_type),
                Cell::new(zone.capable.guest_cpus),
                Cell::new(&zone.accelerator_name),
                Cell::new(zone.maximum_cards_per_instance),
            ]);
        }
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, zone: &str) -> InstanceRecord {
        InstanceRecord {
            name: name.to_string(),
            zone: zone.to_string(),
        }
    }

    fn report() -> SurveyReport {
        SurveyReport {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            machine_type: "a2-highgpu-1g".to_string(),
            accelerator_type: "nvidia-tesla-a100".to_string(),
            accelerator_count: 1,
            regions: vec![
                RegionAttemptSummary {
                    region: "us-central1".to_string(),
                    zones_attempted: Vec::new(),
                    instances_created: vec![
                        record("probe-1-us-central1-a", "us-central1-a"),
                        record("probe-2-us-central1-b", "us-central1-b"),
                    ],
                },
                RegionAttemptSummary {
                    region: "europe-west4".to_string(),
                    zones_attempted: Vec::new(),
                    instances_created: Vec::new(),
                },
                RegionAttemptSummary {
                    region: "asia-east1".to_string(),
                    zones_attempted: Vec::new(),
                    instances_created: vec![record("probe-1-asia-east1-c", "asia-east1-c")],
                },
            ],
        }
    }

    #[test]
    fn test_rows_flatten_created_instances_only() {
        let rows = report().rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].region, "us-central1");
        assert_eq!(rows[1].instance_name, "probe-2-us-central1-b");
        assert_eq!(rows[2].zone, "asia-east1-c");
    }

    #[test]
    fn test_successful_regions() {
        assert_eq!(
            report().successful_regions(),
            vec!["us-central1", "asia-east1"]
        );
    }

    #[test]
    fn test_table_lists_every_row() {
        let rendered = report_table(&report()).to_string();
        assert!(rendered.contains("Instance Name"));
        assert!(rendered.contains("probe-1-asia-east1-c"));
        assert!(!rendered.contains("europe-west4"));
    }
}
