//! # quota
//!
//! Batch operations for spreading Drive content across service-account
//! quotas.
//!
//! - [`relocate`]: copy files from a shared source folder into a destination
//!   until the account's estimated free space runs out, then move each
//!   original into a trash folder
//! - [`purge`]: delete root-level files whose name starts with a marker
//!
//! ## Example
//!
//! ```no_run
//! use drive::{Client, RetryConfig};
//! use quota::{Folders, RelocateOptions, Silent};
//!
//! let client = Client::from_credentials("eyJ0eXBlIjoi...").expect("Failed to authenticate");
//! let options = RelocateOptions {
//!     folders: Folders::new("src", "dst", "trash").expect("Invalid folders"),
//!     retry: RetryConfig::default(),
//!     dry_run: false,
//! };
//!
//! let report = quota::relocate(&client, &options, 15 * 1024 * 1024 * 1024, &Silent)
//!     .expect("Relocation failed");
//! println!("{} files relocated", report.relocated);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

/// Free-capacity estimation.
pub mod capacity;
/// Error types for relocation and purge runs.
pub mod error;
/// Marker-based purge.
pub mod purge;
/// Quota-aware relocation.
pub mod relocate;
/// Budget, outcome and report types.
pub mod types;

pub use capacity::{estimate_capacity, remaining_capacity};
pub use error::{Error, Result};
pub use purge::purge;
pub use relocate::{Relocator, relocate};
pub use types::{
    Budget, Failure, Folders, Marker, Outcome, Progress, PurgeReport, RelocateOptions,
    RelocationReport, SkipReason, Silent, Stage,
};
