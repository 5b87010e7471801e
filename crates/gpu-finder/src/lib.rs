//! Compute Engine GPU availability survey.
//!
//! Finds which zones can currently host a given machine type with a given
//! accelerator type and count, by actually creating trial instances and
//! deleting them again.
//!
//! ## Pipeline
//!
//! ```text
//! zones ──► capability ──► quota ──► provision (per region) ──► report
//!  UP zones   machine type   max cards     create ─► delete
//!             in catalog     per instance
//! ```
//!
//! Regions are processed one at a time, and a region's trial instances are
//! deleted before the next region starts.
//!
//! ## Example
//!
//! ```ignore
//! use gpu_finder::{survey, FinderConfig, Gcp, PollPolicy};
//!
//! let config = FinderConfig::load("gpu-config.json").await?;
//! let api = Gcp::new(access_token)?;
//! let report = survey::run(&api, &config, PollPolicy::default()).await?;
//! println!("{}", gpu_finder::report::report_table(&report));
//! ```

pub mod capability;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod operation;
pub mod providers;
pub mod provision;
pub mod quota;
pub mod report;
pub mod survey;
pub mod zones;

pub use config::{FinderConfig, InstanceConfig};
pub use error::{FinderError, FinderResult, OperationKind};
pub use lifecycle::{CreateOutcome, InstanceRecord};
pub use operation::{classify_error_code, ErrorClass, PollPolicy};
pub use providers::{ComputeApi, ComputeError, Gcp};
pub use report::{RegionAttemptSummary, ReportRow, SurveyReport};
