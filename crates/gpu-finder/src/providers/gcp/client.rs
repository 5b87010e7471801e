//! Compute Engine API client implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use super::models::{
    AcceleratorConfig, AccessConfigDefinition, AttachedDiskDefinition, CreateInstanceRequest,
    GceAcceleratorType, GceImage, GceMachineType, GceOperation, GceZone, InitializeParams,
    ListResponse, NetworkInterfaceDefinition, ReservationAffinity, Scheduling, ServiceAccount,
    ShieldedInstanceConfig, Tags,
};
use crate::providers::traits::{
    AcceleratorType, ComputeApi, ComputeError, InstanceSpec, MachineAccelerator, MachineType,
    Operation, OperationErrorDetail, OperationStatus, Page, Zone, ZoneStatus,
};

/// Compute Engine v1 REST root.
pub const DEFAULT_API_BASE_URL: &str = "https://compute.googleapis.com/compute/v1";

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Compute Engine provider.
#[derive(Clone)]
pub struct Gcp {
    /// HTTP client.
    client: Client,
    /// Access token (from service account or user).
    access_token: String,
    /// API root, without trailing slash.
    base_url: String,
}

impl Gcp {
    /// Create a new Compute Engine provider against the public API.
    ///
    /// # Arguments
    /// * `access_token` - `OAuth2` access token
    ///
    /// # Errors
    /// Returns error if HTTP client cannot be created.
    pub fn new(access_token: impl Into<String>) -> Result<Self, ComputeError> {
        Self::with_base_url(access_token, DEFAULT_API_BASE_URL)
    }

    /// Create a new Compute Engine provider against a custom API root.
    ///
    /// # Errors
    /// Returns error if HTTP client cannot be created.
    pub fn with_base_url(
        access_token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, ComputeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(ComputeError::Http)?;

        Ok(Self {
            client,
            access_token: access_token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Last path segment of a resource URL (or the value itself).
    fn short_name(url: &str) -> &str {
        url.rsplit('/').next().unwrap_or(url)
    }

    /// Make an authenticated GET request.
    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        page_token: Option<&str>,
    ) -> Result<T, ComputeError> {
        debug!(url = %url, page_token = ?page_token, "GET request");

        let mut request = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.access_token));
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request.send().await?;
        self.handle_response(response).await
    }

    /// Make an authenticated POST request.
    async fn post<T, B>(&self, url: &str, body: &B) -> Result<T, ComputeError>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize,
    {
        debug!(url = %url, "POST request");

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Make an authenticated DELETE request.
    async fn delete<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, ComputeError> {
        debug!(url = %url, "DELETE request");

        let response = self
            .client
            .delete(url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Handle API response.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ComputeError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str(&text).map_err(|e| {
                warn!(error = %e, body = %text, "Failed to parse response");
                ComputeError::Serialization(e)
            })
        } else if status == StatusCode::NOT_FOUND {
            Err(ComputeError::NotFound(text))
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Err(ComputeError::Auth(text))
        } else {
            Err(ComputeError::Api {
                status: status.as_u16(),
                message: text,
            })
        }
    }

    /// Convert a zone resource to our type.
    fn to_zone(zone: GceZone) -> Zone {
        let status = match zone.status.as_str() {
            "UP" => ZoneStatus::Up,
            "DOWN" => ZoneStatus::Down,
            _ => ZoneStatus::Unknown,
        };

        Zone {
            name: zone.name,
            status,
        }
    }

    /// Convert a machine type resource to our type.
    fn to_machine_type(machine: GceMachineType) -> MachineType {
        MachineType {
            name: machine.name,
            guest_cpus: machine.guest_cpus,
            description: machine.description,
            accelerators: machine
                .accelerators
                .into_iter()
                .map(|a| MachineAccelerator {
                    accelerator_type: a.guest_accelerator_type,
                    count: a.guest_accelerator_count,
                })
                .collect(),
        }
    }

    /// Convert an accelerator type resource to our type.
    fn to_accelerator_type(accelerator: GceAcceleratorType) -> AcceleratorType {
        AcceleratorType {
            name: accelerator.name,
            description: accelerator.description,
            maximum_cards_per_instance: accelerator.maximum_cards_per_instance,
        }
    }

    /// Convert an operation resource to our type.
    fn to_operation(operation: GceOperation, zone: &str) -> Operation {
        let status = match operation.status.as_str() {
            "PENDING" => OperationStatus::Pending,
            "RUNNING" => OperationStatus::Running,
            "DONE" => OperationStatus::Done,
            _ => OperationStatus::Unknown,
        };

        let errors = operation
            .error
            .map(|e| e.errors)
            .unwrap_or_default()
            .into_iter()
            .map(|e| OperationErrorDetail {
                code: e.code.unwrap_or_default(),
                message: e.message.unwrap_or_default(),
            })
            .collect();

        Operation {
            name: operation.name,
            zone: operation
                .zone
                .as_deref()
                .map_or_else(|| zone.to_string(), |z| Self::short_name(z).to_string()),
            status,
            errors,
        }
    }

    /// Build the insert body for an instance specification.
    fn to_create_request(project: &str, spec: &InstanceSpec) -> CreateInstanceRequest {
        let zone = &spec.zone;

        let access_configs = if spec.external_access {
            vec![AccessConfigDefinition {
                access_type: "ONE_TO_ONE_NAT".to_string(),
                name: "External NAT".to_string(),
                network_tier: "PREMIUM".to_string(),
            }]
        } else {
            Vec::new()
        };

        CreateInstanceRequest {
            name: spec.name.clone(),
            machine_type: format!("zones/{zone}/machineTypes/{}", spec.machine_type),
            disks: vec![AttachedDiskDefinition {
                disk_type: "PERSISTENT".to_string(),
                boot: true,
                mode: "READ_WRITE".to_string(),
                auto_delete: true,
                device_name: spec.name.clone(),
                initialize_params: InitializeParams {
                    source_image: spec.source_image.clone(),
                    disk_type: format!(
                        "projects/{project}/zones/{zone}/diskTypes/{}",
                        spec.disk_type
                    ),
                    disk_size_gb: spec.disk_size_gb.to_string(),
                },
            }],
            guest_accelerators: vec![AcceleratorConfig {
                accelerator_count: spec.accelerator_count,
                accelerator_type: format!(
                    "zones/{zone}/acceleratorTypes/{}",
                    spec.accelerator_type
                ),
            }],
            tags: Tags {
                items: spec.tags.clone(),
            },
            network_interfaces: vec![NetworkInterfaceDefinition {
                network: spec.network.clone(),
                access_configs,
            }],
            scheduling: Scheduling {
                preemptible: spec.scheduling.preemptible,
                on_host_maintenance: spec.scheduling.on_host_maintenance.clone(),
                automatic_restart: spec.scheduling.automatic_restart,
            },
            service_accounts: vec![ServiceAccount {
                email: spec.service_account_email.clone(),
                scopes: spec.scopes.clone(),
            }],
            can_ip_forward: false,
            deletion_protection: false,
            shielded_instance_config: ShieldedInstanceConfig {
                enable_secure_boot: false,
                enable_vtpm: true,
                enable_integrity_monitoring: true,
            },
            reservation_affinity: ReservationAffinity {
                consume_reservation_type: "ANY_RESERVATION".to_string(),
            },
        }
    }
}

#[async_trait]
impl ComputeApi for Gcp {
    async fn list_zones(
        &self,
        project: &str,
        page_token: Option<&str>,
    ) -> Result<Page<Zone>, ComputeError> {
        let url = format!("{}/projects/{project}/zones", self.base_url);

        let response: ListResponse<GceZone> = self.get(&url, page_token).await?;
        Ok(Page {
            items: response.items.into_iter().map(Self::to_zone).collect(),
            next_page_token: response.next_page_token,
        })
    }

    async fn list_machine_types(
        &self,
        project: &str,
        zone: &str,
        page_token: Option<&str>,
    ) -> Result<Page<MachineType>, ComputeError> {
        let url = format!("{}/projects/{project}/zones/{zone}/machineTypes", self.base_url);

        let response: ListResponse<GceMachineType> = self.get(&url, page_token).await?;
        Ok(Page {
            items: response
                .items
                .into_iter()
                .map(Self::to_machine_type)
                .collect(),
            next_page_token: response.next_page_token,
        })
    }

    async fn list_accelerator_types(
        &self,
        project: &str,
        zone: &str,
        page_token: Option<&str>,
    ) -> Result<Page<AcceleratorType>, ComputeError> {
        let url = format!(
            "{}/projects/{project}/zones/{zone}/acceleratorTypes",
            self.base_url
        );

        let response: ListResponse<GceAcceleratorType> = self.get(&url, page_token).await?;
        Ok(Page {
            items: response
                .items
                .into_iter()
                .map(Self::to_accelerator_type)
                .collect(),
            next_page_token: response.next_page_token,
        })
    }

    async fn image_from_family(
        &self,
        image_project: &str,
        family: &str,
    ) -> Result<String, ComputeError> {
        let url = format!(
            "{}/projects/{image_project}/global/images/family/{family}",
            self.base_url
        );

        let image: GceImage = self.get(&url, None).await?;
        debug!(image = ?image.name, self_link = %image.self_link, "Resolved image family");
        Ok(image.self_link)
    }

    async fn insert_instance(
        &self,
        project: &str,
        spec: &InstanceSpec,
    ) -> Result<Operation, ComputeError> {
        let url = format!(
            "{}/projects/{project}/zones/{}/instances",
            self.base_url, spec.zone
        );

        let body = Self::to_create_request(project, spec);
        let operation: GceOperation = self.post(&url, &body).await?;
        Ok(Self::to_operation(operation, &spec.zone))
    }

    async fn delete_instance(
        &self,
        project: &str,
        zone: &str,
        name: &str,
    ) -> Result<Operation, ComputeError> {
        let url = format!(
            "{}/projects/{project}/zones/{zone}/instances/{name}",
            self.base_url
        );

        let operation: GceOperation = self.delete(&url).await?;
        Ok(Self::to_operation(operation, zone))
    }

    async fn get_zone_operation(
        &self,
        project: &str,
        zone: &str,
        operation: &str,
    ) -> Result<Operation, ComputeError> {
        let url = format!(
            "{}/projects/{project}/zones/{zone}/operations/{operation}",
            self.base_url
        );

        let response: GceOperation = self.get(&url, None).await?;
        Ok(Self::to_operation(response, zone))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::traits::SchedulingPolicy;

    fn spec() -> InstanceSpec {
        InstanceSpec {
            name: "probe-1-us-central1-a".to_string(),
            zone: "us-central1-a".to_string(),
            machine_type: "a2-highgpu-1g".to_string(),
            source_image: "https://example.test/images/debian-12".to_string(),
            disk_type: "pd-ssd".to_string(),
            disk_size_gb: 200,
            accelerator_type: "nvidia-tesla-a100".to_string(),
            accelerator_count: 1,
            network: "global/networks/default".to_string(),
            external_access: true,
            tags: vec!["http-server".to_string()],
            scheduling: SchedulingPolicy {
                preemptible: false,
                on_host_maintenance: "TERMINATE".to_string(),
                automatic_restart: true,
            },
            service_account_email: "default".to_string(),
            scopes: vec!["https://www.googleapis.com/auth/cloud-platform".to_string()],
        }
    }

    #[test]
    fn test_create_request_shape() {
        let body = serde_json::to_value(Gcp::to_create_request("my-project", &spec())).unwrap();

        assert_eq!(
            body["machineType"],
            "zones/us-central1-a/machineTypes/a2-highgpu-1g"
        );
        assert_eq!(
            body["guestAccelerators"][0]["acceleratorType"],
            "zones/us-central1-a/acceleratorTypes/nvidia-tesla-a100"
        );
        assert_eq!(body["guestAccelerators"][0]["acceleratorCount"], 1);
        assert_eq!(
            body["disks"][0]["initializeParams"]["diskType"],
            "projects/my-project/zones/us-central1-a/diskTypes/pd-ssd"
        );
        assert_eq!(body["disks"][0]["initializeParams"]["diskSizeGb"], "200");
        assert_eq!(body["disks"][0]["autoDelete"], true);
        assert_eq!(
            body["networkInterfaces"][0]["accessConfigs"][0]["type"],
            "ONE_TO_ONE_NAT"
        );
        assert_eq!(body["scheduling"]["onHostMaintenance"], "TERMINATE");
        assert_eq!(body["scheduling"]["preemptible"], false);
        assert_eq!(body["tags"]["items"][0], "http-server");
    }

    #[test]
    fn test_operation_mapping() {
        let raw: GceOperation = serde_json::from_value(serde_json::json!({
            "name": "operation-123",
            "zone": "https://www.googleapis.com/compute/v1/projects/p/zones/us-central1-a",
            "status": "DONE",
            "error": { "errors": [{ "code": "QUOTA_EXCEEDED", "message": "Quota 'NVIDIA_A100_GPUS' exceeded." }] }
        }))
        .unwrap();

        let op = Gcp::to_operation(raw, "ignored");
        assert!(op.is_done());
        assert_eq!(op.zone, "us-central1-a");
        assert_eq!(op.first_error().unwrap().code, "QUOTA_EXCEEDED");
    }

    #[test]
    fn test_zone_status_mapping() {
        let zone = Gcp::to_zone(GceZone {
            name: "europe-west4-a".to_string(),
            status: "DOWN".to_string(),
        });
        assert_eq!(zone.status, ZoneStatus::Down);
    }
}
