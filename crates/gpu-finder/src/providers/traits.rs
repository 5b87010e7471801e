//! Compute provider trait and common types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while talking to the compute provider.
#[derive(Error, Debug)]
pub enum ComputeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Authentication error.
    #[error("Authentication error: {0}")]
    Auth(String),
}

/// One page of a paginated listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Token for the next page, `None` on the last page.
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    /// A page with no successor.
    #[must_use]
    pub const fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page_token: None,
        }
    }
}

/// Zone status as reported by the zone listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneStatus {
    /// Zone is accepting workloads.
    Up,
    /// Zone is down.
    Down,
    /// Unknown status.
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for ZoneStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// A zone entry from the provider's zone listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    /// Zone name (e.g., "us-central1-a").
    pub name: String,
    /// Current status.
    pub status: ZoneStatus,
}

/// An accelerator bundled with a machine type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineAccelerator {
    /// Accelerator type name (e.g., "nvidia-tesla-a100").
    pub accelerator_type: String,
    /// Number of accelerators bundled with the machine type.
    pub count: u32,
}

/// A machine type entry from a zone's machine-type catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineType {
    /// Machine type name (e.g., "a2-highgpu-1g").
    pub name: String,
    /// Number of vCPUs.
    pub guest_cpus: u32,
    /// Human-readable description.
    pub description: String,
    /// Bundled accelerators, empty for general-purpose machine types.
    pub accelerators: Vec<MachineAccelerator>,
}

/// An accelerator type entry from a zone's accelerator catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceleratorType {
    /// Accelerator type name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Maximum number of cards attachable to one instance.
    pub maximum_cards_per_instance: u32,
}

/// Long-running operation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    /// Queued, not yet started.
    Pending,
    /// In progress.
    Running,
    /// Finished, successfully or not.
    Done,
    /// Unknown status.
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Done => write!(f, "done"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// An error reported by a finished operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationErrorDetail {
    /// Provider error code (e.g., "QUOTA_EXCEEDED").
    pub code: String,
    /// Provider error message.
    pub message: String,
}

/// A zonal long-running operation handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// Operation name, used to re-fetch status.
    pub name: String,
    /// Zone the operation runs in.
    pub zone: String,
    /// Current status.
    pub status: OperationStatus,
    /// Errors reported by the operation, in provider order.
    pub errors: Vec<OperationErrorDetail>,
}

impl Operation {
    /// Whether the provider reports the operation as finished.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.status == OperationStatus::Done
    }

    /// The first reported error, which decides how a failure is classified.
    #[must_use]
    pub fn first_error(&self) -> Option<&OperationErrorDetail> {
        self.errors.first()
    }
}

/// Host maintenance and restart behaviour for an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulingPolicy {
    /// Whether the instance may be preempted.
    pub preemptible: bool,
    /// What to do on host maintenance ("TERMINATE" or "MIGRATE").
    pub on_host_maintenance: String,
    /// Whether to restart after a host failure.
    pub automatic_restart: bool,
}

/// Full specification of an instance to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceSpec {
    /// Instance name.
    pub name: String,
    /// Zone to create the instance in.
    pub zone: String,
    /// Machine type name.
    pub machine_type: String,
    /// Boot image self link.
    pub source_image: String,
    /// Boot disk type name (e.g., "pd-ssd").
    pub disk_type: String,
    /// Boot disk size in GB.
    pub disk_size_gb: u64,
    /// Attached accelerator type name.
    pub accelerator_type: String,
    /// Number of attached accelerators.
    pub accelerator_count: u32,
    /// Network (URL or name).
    pub network: String,
    /// Whether to assign an ephemeral external address.
    pub external_access: bool,
    /// Network tags used by firewall rules.
    pub tags: Vec<String>,
    /// Scheduling policy.
    pub scheduling: SchedulingPolicy,
    /// Service account email.
    pub service_account_email: String,
    /// Service account OAuth scopes.
    pub scopes: Vec<String>,
}

/// Compute provider operations used by the availability survey.
///
/// All calls are scoped to a single project.
#[async_trait]
pub trait ComputeApi: Send + Sync {
    /// List one page of zones.
    async fn list_zones(
        &self,
        project: &str,
        page_token: Option<&str>,
    ) -> Result<Page<Zone>, ComputeError>;

    /// List one page of a zone's machine types.
    async fn list_machine_types(
        &self,
        project: &str,
        zone: &str,
        page_token: Option<&str>,
    ) -> Result<Page<MachineType>, ComputeError>;

    /// List one page of a zone's accelerator types.
    async fn list_accelerator_types(
        &self,
        project: &str,
        zone: &str,
        page_token: Option<&str>,
    ) -> Result<Page<AcceleratorType>, ComputeError>;

    /// Resolve the latest image of a family to its self link.
    async fn image_from_family(
        &self,
        image_project: &str,
        family: &str,
    ) -> Result<String, ComputeError>;

    /// Submit an instance creation.
    async fn insert_instance(
        &self,
        project: &str,
        spec: &InstanceSpec,
    ) -> Result<Operation, ComputeError>;

    /// Submit an instance deletion.
    async fn delete_instance(
        &self,
        project: &str,
        zone: &str,
        name: &str,
    ) -> Result<Operation, ComputeError>;

    /// Fetch the current state of a zonal operation.
    async fn get_zone_operation(
        &self,
        project: &str,
        zone: &str,
        operation: &str,
    ) -> Result<Operation, ComputeError>;
}
