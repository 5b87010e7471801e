//! Compute provider abstractions.
//!
//! This module defines the [`ComputeApi`] trait the survey runs against and
//! the Compute Engine implementation of it.

pub mod gcp;
mod traits;

pub use traits::{
    AcceleratorType, ComputeApi, ComputeError, InstanceSpec, MachineAccelerator, MachineType,
    Operation, OperationErrorDetail, OperationStatus, Page, SchedulingPolicy, Zone, ZoneStatus,
};

pub use gcp::Gcp;
