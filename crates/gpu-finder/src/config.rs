//! Survey configuration.
//!
//! The configuration is a JSON document:
//!
//! ```text
//! {
//!   "project_id": "my-project",
//!   "number_of_instances": 2,
//!   "instance_config": {
//!     "name": "gpu-probe",
//!     "machine_type": "a2-highgpu-1g",
//!     "gpu_type": "nvidia-tesla-a100",
//!     "number_of_gpus": 1,
//!     "disk_type": "pd-ssd",
//!     "disk_size": 200,
//!     "image_project": "debian-cloud",
//!     "image_family": "debian-12",
//!     "firewall_rules": ["http-server"],
//!     "network_interfaces": { "network": "global/networks/default" },
//!     "identity_and_api_access": {
//!       "service_account_email": "default",
//!       "scopes": "https://www.googleapis.com/auth/cloud-platform"
//!     },
//!     "zone": ["us-central1-a", "us-central1-b"]
//!   }
//! }
//! ```
//!
//! `number_of_instances` may sit at the top level or inside `instance_config`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{FinderError, FinderResult};

/// Machine families whose names end in the bundled GPU count (`a2-highgpu-4g`).
const ACCELERATOR_OPTIMIZED_FAMILIES: &[&str] = &["a2", "a3", "a4"];

/// Top-level configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinderConfig {
    /// Project all provider calls are scoped to.
    pub project_id: String,
    /// Target number of trial instances per region (legacy location).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_instances: Option<u32>,
    /// Instance to probe for.
    pub instance_config: InstanceConfig,
}

/// Requested instance shape and survey limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceConfig {
    /// Base name for trial instances.
    pub name: String,
    /// Machine type name.
    pub machine_type: String,
    /// Accelerator type name.
    pub gpu_type: String,
    /// Accelerators per instance.
    pub number_of_gpus: u32,
    /// Boot disk type name.
    pub disk_type: String,
    /// Boot disk size in GB.
    pub disk_size: u64,
    /// Project hosting the boot image family.
    pub image_project: String,
    /// Boot image family.
    pub image_family: String,
    /// Network tags applied to the instance.
    #[serde(default)]
    pub firewall_rules: Vec<String>,
    /// Network settings.
    pub network_interfaces: NetworkInterfaces,
    /// Service account settings.
    pub identity_and_api_access: IdentityAndApiAccess,
    /// Zone allow-list; empty means every UP zone.
    #[serde(default, deserialize_with = "one_or_many")]
    pub zone: Vec<String>,
    /// Target number of trial instances per region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_instances: Option<u32>,
}

/// Network settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkInterfaces {
    /// Network URL or partial URL.
    pub network: String,
}

/// Service account settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityAndApiAccess {
    /// Service account email.
    pub service_account_email: String,
    /// OAuth scopes; a single string is accepted.
    #[serde(deserialize_with = "one_or_many")]
    pub scopes: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<OneOrMany> = Option::deserialize(deserializer)?;
    Ok(match value {
        None => Vec::new(),
        Some(OneOrMany::One(s)) if s.trim().is_empty() => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
    })
}

/// GPU count encoded in an accelerator-optimized machine type name.
///
/// Returns `None` for machine types outside those families, or whose last
/// name segment is not `<N>g`.
#[must_use]
pub fn encoded_gpu_count(machine_type: &str) -> Option<u32> {
    let (family, rest) = machine_type.split_once('-')?;
    if !ACCELERATOR_OPTIMIZED_FAMILIES.contains(&family) {
        return None;
    }
    rest.rsplit('-').next()?.strip_suffix('g')?.parse().ok()
}

impl FinderConfig {
    /// Load and validate a configuration file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// fails [`FinderConfig::validate`].
    pub async fn load(path: impl AsRef<Path>) -> FinderResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| FinderError::ConfigRead {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let config = Self::from_json(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration document without validating it.
    ///
    /// # Errors
    /// Returns an error if the document is not valid JSON for this shape.
    pub fn from_json(content: &str) -> FinderResult<Self> {
        serde_json::from_str(content).map_err(|e| FinderError::Config(e.to_string()))
    }

    /// Target number of trial instances per region.
    ///
    /// # Errors
    /// Returns an error if `number_of_instances` is missing.
    pub fn target_instances(&self) -> FinderResult<u32> {
        self.instance_config
            .number_of_instances
            .or(self.number_of_instances)
            .ok_or_else(|| FinderError::Config("number_of_instances is required".to_string()))
    }

    /// Check the configuration before any provider call is made.
    ///
    /// # Errors
    /// Returns [`FinderError::AcceleratorCountMismatch`] when the machine type
    /// name encodes a GPU count different from `number_of_gpus`, or
    /// [`FinderError::Config`] for missing or zero-valued fields.
    pub fn validate(&self) -> FinderResult<()> {
        let ic = &self.instance_config;

        if self.project_id.trim().is_empty() {
            return Err(FinderError::Config("project_id must not be empty".to_string()));
        }
        if ic.name.trim().is_empty() {
            return Err(FinderError::Config("instance_config.name must not be empty".to_string()));
        }
        if ic.number_of_gpus == 0 {
            return Err(FinderError::Config("number_of_gpus must be at least 1".to_string()));
        }
        if self.target_instances()? == 0 {
            return Err(FinderError::Config("number_of_instances must be at least 1".to_string()));
        }

        if let Some(encoded) = encoded_gpu_count(&ic.machine_type) {
            if encoded != ic.number_of_gpus {
                return Err(FinderError::AcceleratorCountMismatch {
                    machine_type: ic.machine_type.clone(),
                    encoded,
                    requested: ic.number_of_gpus,
                });
            }
        }

        Ok(())
    }
}
