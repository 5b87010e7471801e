//! GCP (Google Cloud Platform) Compute Engine provider.
//!
//! Implements the [`ComputeApi`](crate::providers::ComputeApi) trait over the
//! Compute Engine v1 REST API.
//!
//! ## Endpoints used
//!
//! - `GET  projects/{project}/zones`
//! - `GET  projects/{project}/zones/{zone}/machineTypes`
//! - `GET  projects/{project}/zones/{zone}/acceleratorTypes`
//! - `GET  projects/{image_project}/global/images/family/{family}`
//! - `POST projects/{project}/zones/{zone}/instances`
//! - `DELETE projects/{project}/zones/{zone}/instances/{name}`
//! - `GET  projects/{project}/zones/{zone}/operations/{operation}`
//!
//! ## Accelerator-optimized machine types
//!
//! - **a2-highgpu-{1,2,4,8}g**: NVIDIA A100 40GB
//! - **a2-ultragpu-{1,2,4,8}g**: NVIDIA A100 80GB
//! - **a3-highgpu-8g**: NVIDIA H100 80GB

mod client;
pub mod models;

pub use client::{Gcp, DEFAULT_API_BASE_URL};
