//! Compute Engine API request and response models.

use serde::{Deserialize, Serialize};

// ============================================================================
// Catalog listings
// ============================================================================

/// Paginated list response shared by all Compute Engine list calls.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    /// Items on this page (absent when the page is empty).
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    /// Token for the next page.
    pub next_page_token: Option<String>,
}

/// Zone resource.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GceZone {
    /// Zone name.
    pub name: String,
    /// Status ("UP" or "DOWN").
    pub status: String,
}

/// Machine type resource.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GceMachineType {
    /// Machine type name.
    pub name: String,
    /// Number of vCPUs.
    #[serde(default)]
    pub guest_cpus: u32,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Bundled accelerators.
    #[serde(default)]
    pub accelerators: Vec<GceMachineAccelerator>,
}

/// Accelerator bundled with a machine type.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GceMachineAccelerator {
    /// Accelerator type name.
    pub guest_accelerator_type: String,
    /// Accelerator count.
    #[serde(default)]
    pub guest_accelerator_count: u32,
}

/// Accelerator type resource.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GceAcceleratorType {
    /// Accelerator type name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Maximum cards per instance.
    #[serde(default)]
    pub maximum_cards_per_instance: u32,
}

/// Image resource (only the fields we read).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GceImage {
    /// Image name.
    pub name: Option<String>,
    /// Image self link.
    pub self_link: String,
}

// ============================================================================
// Instance insert
// ============================================================================

/// Create instance request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInstanceRequest {
    /// Instance name.
    pub name: String,
    /// Machine type (partial URL).
    pub machine_type: String,
    /// Disks.
    pub disks: Vec<AttachedDiskDefinition>,
    /// Attached accelerators.
    pub guest_accelerators: Vec<AcceleratorConfig>,
    /// Network tags.
    pub tags: Tags,
    /// Network interfaces.
    pub network_interfaces: Vec<NetworkInterfaceDefinition>,
    /// Scheduling.
    pub scheduling: Scheduling,
    /// Service accounts.
    pub service_accounts: Vec<ServiceAccount>,
    /// IP forwarding.
    pub can_ip_forward: bool,
    /// Deletion protection.
    pub deletion_protection: bool,
    /// Shielded VM options.
    pub shielded_instance_config: ShieldedInstanceConfig,
    /// Reservation affinity.
    pub reservation_affinity: ReservationAffinity,
}

/// Attached disk definition for creation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedDiskDefinition {
    /// Disk type ("PERSISTENT").
    #[serde(rename = "type")]
    pub disk_type: String,
    /// Boot disk.
    pub boot: bool,
    /// Mode ("READ_WRITE").
    pub mode: String,
    /// Auto delete.
    pub auto_delete: bool,
    /// Device name.
    pub device_name: String,
    /// Initialize params.
    pub initialize_params: InitializeParams,
}

/// Disk initialization parameters.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Source image (URL).
    pub source_image: String,
    /// Disk type (partial URL).
    pub disk_type: String,
    /// Disk size in GB (int64 encoded as string).
    pub disk_size_gb: String,
}

/// Accelerator attachment.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceleratorConfig {
    /// Accelerator count.
    pub accelerator_count: u32,
    /// Accelerator type (partial URL).
    pub accelerator_type: String,
}

/// Network tags.
#[derive(Debug, Serialize)]
pub struct Tags {
    /// Tag values.
    pub items: Vec<String>,
}

/// Network interface definition for creation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterfaceDefinition {
    /// Network (URL).
    pub network: String,
    /// Access configs.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub access_configs: Vec<AccessConfigDefinition>,
}

/// Access config definition.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessConfigDefinition {
    /// Access type.
    #[serde(rename = "type")]
    pub access_type: String,
    /// Name.
    pub name: String,
    /// Network tier.
    pub network_tier: String,
}

/// Scheduling options.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scheduling {
    /// Preemptible.
    pub preemptible: bool,
    /// On host maintenance.
    pub on_host_maintenance: String,
    /// Automatic restart.
    pub automatic_restart: bool,
}

/// Service account attachment.
#[derive(Debug, Serialize)]
pub struct ServiceAccount {
    /// Service account email.
    pub email: String,
    /// OAuth scopes.
    pub scopes: Vec<String>,
}

/// Shielded VM options.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShieldedInstanceConfig {
    /// Secure boot.
    pub enable_secure_boot: bool,
    /// vTPM.
    pub enable_vtpm: bool,
    /// Integrity monitoring.
    pub enable_integrity_monitoring: bool,
}

/// Reservation affinity.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationAffinity {
    /// Reservation consumption type.
    pub consume_reservation_type: String,
}

// ============================================================================
// Operation types
// ============================================================================

/// GCP operation (async task).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GceOperation {
    /// Operation name.
    pub name: String,
    /// Zone (URL).
    pub zone: Option<String>,
    /// Status.
    pub status: String,
    /// Error.
    pub error: Option<OperationError>,
}

/// Operation error.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationError {
    /// Errors.
    #[serde(default)]
    pub errors: Vec<OperationErrorDetail>,
}

/// Operation error detail.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationErrorDetail {
    /// Error code.
    pub code: Option<String>,
    /// Error message.
    pub message: Option<String>,
}
