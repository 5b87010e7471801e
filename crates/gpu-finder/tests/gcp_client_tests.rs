//! Compute Engine client tests against a mock HTTP server.

#![allow(clippy::missing_panics_doc)]

use gpu_finder::providers::{
    ComputeApi, ComputeError, InstanceSpec, OperationStatus, SchedulingPolicy, ZoneStatus,
};
use gpu_finder::Gcp;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token";

async fn client() -> (MockServer, Gcp) {
    let server = MockServer::start().await;
    let gcp = Gcp::with_base_url(TOKEN, server.uri()).unwrap();
    (server, gcp)
}

#[tokio::test]
async fn test_list_zones_follows_page_token() {
    let (server, gcp) = client().await;

    Mock::given(method("GET"))
        .and(path("/projects/my-project/zones"))
        .and(header("authorization", "Bearer test-token"))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "name": "europe-west4-a", "status": "DOWN" }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/projects/my-project/zones"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "name": "us-central1-a", "status": "UP" },
                { "name": "us-central1-b", "status": "UP" }
            ],
            "nextPageToken": "page-2"
        })))
        .mount(&server)
        .await;

    let first = gcp.list_zones("my-project", None).await.unwrap();
    assert_eq!(first.items.len(), 2);
    assert_eq!(first.items[0].status, ZoneStatus::Up);
    assert_eq!(first.next_page_token.as_deref(), Some("page-2"));

    let second = gcp.list_zones("my-project", Some("page-2")).await.unwrap();
    assert_eq!(second.items[0].name, "europe-west4-a");
    assert_eq!(second.items[0].status, ZoneStatus::Down);
    assert!(second.next_page_token.is_none());
}

#[tokio::test]
async fn test_list_machine_types_maps_accelerators() {
    let (server, gcp) = client().await;

    Mock::given(method("GET"))
        .and(path("/projects/my-project/zones/us-central1-a/machineTypes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {
                    "name": "a2-highgpu-1g",
                    "guestCpus": 12,
                    "description": "Accelerator Optimized: 1 NVIDIA Tesla A100 GPU, 12 vCPUs, 85GB RAM",
                    "accelerators": [
                        { "guestAcceleratorType": "nvidia-tesla-a100", "guestAcceleratorCount": 1 }
                    ]
                },
                { "name": "n1-standard-1", "guestCpus": 1, "description": "1 vCPU, 3.75 GB RAM" }
            ]
        })))
        .mount(&server)
        .await;

    let page = gcp
        .list_machine_types("my-project", "us-central1-a", None)
        .await
        .unwrap();

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].guest_cpus, 12);
    assert_eq!(
        page.items[0].accelerators[0].accelerator_type,
        "nvidia-tesla-a100"
    );
    assert!(page.items[1].accelerators.is_empty());
}

#[tokio::test]
async fn test_empty_accelerator_listing() {
    let (server, gcp) = client().await;

    Mock::given(method("GET"))
        .and(path("/projects/my-project/zones/us-west2-c/acceleratorTypes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "compute#acceleratorTypeList"
        })))
        .mount(&server)
        .await;

    let page = gcp
        .list_accelerator_types("my-project", "us-west2-c", None)
        .await
        .unwrap();
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn test_insert_instance_returns_operation() {
    let (server, gcp) = client().await;

    Mock::given(method("POST"))
        .and(path("/projects/my-project/zones/us-central1-a/instances"))
        .and(body_partial_json(json!({
            "name": "gpu-probe-1-us-central1-a",
            "guestAccelerators": [{
                "acceleratorCount": 1,
                "acceleratorType": "zones/us-central1-a/acceleratorTypes/nvidia-tesla-a100"
            }],
            "scheduling": { "preemptible": false, "onHostMaintenance": "TERMINATE", "automaticRestart": true }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operation-1700000000000-abc",
            "zone": "https://www.googleapis.com/compute/v1/projects/my-project/zones/us-central1-a",
            "status": "RUNNING",
            "operationType": "insert"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let spec = InstanceSpec {
        name: "gpu-probe-1-us-central1-a".to_string(),
        zone: "us-central1-a".to_string(),
        machine_type: "a2-highgpu-1g".to_string(),
        source_image: "projects/debian-cloud/global/images/debian-12-v1".to_string(),
        disk_type: "pd-balanced".to_string(),
        disk_size_gb: 100,
        accelerator_type: "nvidia-tesla-a100".to_string(),
        accelerator_count: 1,
        network: "global/networks/default".to_string(),
        external_access: true,
        tags: Vec::new(),
        scheduling: SchedulingPolicy {
            preemptible: false,
            on_host_maintenance: "TERMINATE".to_string(),
            automatic_restart: true,
        },
        service_account_email: "default".to_string(),
        scopes: vec!["https://www.googleapis.com/auth/cloud-platform".to_string()],
    };

    let op = gcp.insert_instance("my-project", &spec).await.unwrap();
    assert_eq!(op.name, "operation-1700000000000-abc");
    assert_eq!(op.zone, "us-central1-a");
    assert_eq!(op.status, OperationStatus::Running);
    assert!(op.errors.is_empty());
}

#[tokio::test]
async fn test_get_zone_operation_with_error() {
    let (server, gcp) = client().await;

    Mock::given(method("GET"))
        .and(path(
            "/projects/my-project/zones/us-central1-a/operations/operation-1",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operation-1",
            "status": "DONE",
            "error": {
                "errors": [{
                    "code": "ZONE_RESOURCE_POOL_EXHAUSTED",
                    "message": "The zone does not have enough resources available to fulfill the request."
                }]
            }
        })))
        .mount(&server)
        .await;

    let op = gcp
        .get_zone_operation("my-project", "us-central1-a", "operation-1")
        .await
        .unwrap();

    assert!(op.is_done());
    assert_eq!(op.zone, "us-central1-a");
    assert_eq!(
        op.first_error().unwrap().code,
        "ZONE_RESOURCE_POOL_EXHAUSTED"
    );
}

#[tokio::test]
async fn test_delete_instance() {
    let (server, gcp) = client().await;

    Mock::given(method("DELETE"))
        .and(path(
            "/projects/my-project/zones/us-central1-a/instances/gpu-probe-1-us-central1-a",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operation-2",
            "status": "PENDING"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let op = gcp
        .delete_instance("my-project", "us-central1-a", "gpu-probe-1-us-central1-a")
        .await
        .unwrap();
    assert_eq!(op.status, OperationStatus::Pending);
}

#[tokio::test]
async fn test_image_from_family() {
    let (server, gcp) = client().await;

    Mock::given(method("GET"))
        .and(path("/projects/debian-cloud/global/images/family/debian-12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "debian-12-bookworm-v20240110",
            "selfLink": "https://www.googleapis.com/compute/v1/projects/debian-cloud/global/images/debian-12-bookworm-v20240110"
        })))
        .mount(&server)
        .await;

    let link = gcp
        .image_from_family("debian-cloud", "debian-12")
        .await
        .unwrap();
    assert!(link.ends_with("debian-12-bookworm-v20240110"));
}

#[tokio::test]
async fn test_error_status_mapping() {
    let (server, gcp) = client().await;

    Mock::given(method("GET"))
        .and(path("/projects/forbidden/zones"))
        .respond_with(ResponseTemplate::new(403).set_body_string("permission denied"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects/missing/zones"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects/broken/zones"))
        .respond_with(ResponseTemplate::new(503).set_body_string("backend unavailable"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects/garbled/zones"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    assert!(matches!(
        gcp.list_zones("forbidden", None).await,
        Err(ComputeError::Auth(_))
    ));
    assert!(matches!(
        gcp.list_zones("missing", None).await,
        Err(ComputeError::NotFound(_))
    ));
    assert!(matches!(
        gcp.list_zones("broken", None).await,
        Err(ComputeError::Api { status: 503, .. })
    ));
    assert!(matches!(
        gcp.list_zones("garbled", None).await,
        Err(ComputeError::Serialization(_))
    ));
}
