use std::fmt;

use drive::{DriveFile, RetryConfig};

use crate::error::{Error, Result};

/// Locally tracked estimate of free capacity on the destination account.
///
/// Starts from `capacity - used` and is only ever decremented locally; it is
/// never re-read from Drive during a run, so it is optimistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Budget(i64);

impl Budget {
    /// Create a budget with `bytes` remaining (may be negative).
    pub fn new(bytes: i64) -> Self {
        Self(bytes)
    }

    /// Bytes remaining.
    pub fn remaining(&self) -> i64 {
        self.0
    }

    /// Whether a file of `size` bytes may be copied: `0 < size <= remaining`.
    pub fn fits(&self, size: u64) -> bool {
        size > 0 && i64::try_from(size).is_ok_and(|s| s <= self.0)
    }

    /// Reserve `size` bytes.
    pub fn spend(&mut self, size: u64) {
        let size = i64::try_from(size).unwrap_or(i64::MAX);
        self.0 = self.0.saturating_sub(size);
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes", self.0)
    }
}

/// Name prefix that selects files for purging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker(String);

impl Marker {
    /// Create a marker. An empty marker would match every file, so it is rejected.
    pub fn new(marker: impl Into<String>) -> Result<Self> {
        let marker = marker.into();
        if marker.is_empty() {
            return Err(Error::Config("purge marker must not be empty".to_string()));
        }
        Ok(Self(marker))
    }

    /// Whether `name` starts with this marker.
    pub fn matches(&self, name: &str) -> bool {
        name.starts_with(&self.0)
    }

    /// The marker text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Folders involved in a relocation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folders {
    /// Folder files are taken from
    pub source: String,
    /// Folder copies are placed in
    pub destination: String,
    /// Folder originals are moved to after copying
    pub trash: String,
}

impl Folders {
    /// Create a folder set, rejecting blank ids.
    pub fn new(
        source: impl Into<String>,
        destination: impl Into<String>,
        trash: impl Into<String>,
    ) -> Result<Self> {
        let folders = Self {
            source: source.into(),
            destination: destination.into(),
            trash: trash.into(),
        };

        for (label, id) in [
            ("source", &folders.source),
            ("destination", &folders.destination),
            ("trash", &folders.trash),
        ] {
            if id.trim().is_empty() {
                return Err(Error::Config(format!("missing {label} folder id")));
            }
        }

        Ok(folders)
    }
}

/// Options for a relocation run.
#[derive(Debug, Clone)]
pub struct RelocateOptions {
    /// Folder ids
    pub folders: Folders,
    /// Policy for the detach step
    pub retry: RetryConfig,
    /// Evaluate decisions without touching Drive
    pub dry_run: bool,
}

/// Why a file was left where it is without any remote call changing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Zero-byte file (or a folder / native document with no size)
    Empty,
    /// Larger than the remaining budget
    TooLarge {
        /// File size in bytes
        size: u64,
        /// Budget at the time of evaluation
        budget: i64,
    },
    /// The metadata snapshot reported a size that no longer fits
    Changed {
        /// Size reported by the snapshot
        size: u64,
        /// Budget at the time of evaluation
        budget: i64,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Empty => write!(f, "empty"),
            SkipReason::TooLarge { size, budget } => {
                write!(f, "too large ({size} > {budget} bytes left)")
            }
            SkipReason::Changed { size, budget } => {
                write!(f, "size changed to {size} bytes ({budget} bytes left)")
            }
        }
    }
}

/// Step at which a file's relocation was abandoned before any copy existed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Fetching the metadata snapshot
    Snapshot,
    /// Submitting the copy
    Copy,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Snapshot => write!(f, "snapshot"),
            Stage::Copy => write!(f, "copy"),
        }
    }
}

/// Result of evaluating one file.
#[derive(Debug)]
pub enum Outcome {
    /// Copied to the destination and detached from the source
    Relocated {
        /// Id of the new file in the destination
        copy_id: String,
        /// Bytes charged to the budget
        bytes: u64,
    },
    /// Would be relocated (dry run)
    Planned {
        /// Bytes charged to the budget
        bytes: u64,
    },
    /// Left untouched
    Skipped(SkipReason),
    /// Abandoned before a copy existed; the source is untouched
    Failed {
        /// Where it failed
        stage: Stage,
        /// Why
        error: drive::Error,
    },
    /// Copied, but the original could not be detached from the source
    DetachFailed {
        /// Id of the new file in the destination
        copy_id: String,
        /// Bytes charged to the budget
        bytes: u64,
        /// Last detach error
        error: drive::Error,
    },
}

impl Outcome {
    /// Bytes this outcome consumed from the budget.
    pub fn bytes(&self) -> u64 {
        match self {
            Outcome::Relocated { bytes, .. }
            | Outcome::Planned { bytes }
            | Outcome::DetachFailed { bytes, .. } => *bytes,
            Outcome::Skipped(_) | Outcome::Failed { .. } => 0,
        }
    }

    /// Whether a copy was created in the destination.
    pub fn copied(&self) -> bool {
        matches!(self, Outcome::Relocated { .. } | Outcome::DetachFailed { .. })
    }
}

/// A file that did not make it, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// File name
    pub name: String,
    /// File id
    pub id: String,
    /// Human-readable reason
    pub reason: String,
}

/// Summary of a relocation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelocationReport {
    /// Files copied and detached
    pub relocated: usize,
    /// Files that would be relocated (dry run)
    pub planned: usize,
    /// Files left untouched by decision
    pub skipped: usize,
    /// Files abandoned before a copy existed
    pub failed: usize,
    /// Files copied but still attached to the source
    pub detach_failed: usize,
    /// Bytes charged to the budget
    pub bytes: u64,
    /// Budget left at the end of the run
    pub remaining: i64,
    /// Per-file failures, in processing order
    pub failures: Vec<Failure>,
}

impl RelocationReport {
    /// Record the outcome for `file`.
    pub fn add(&mut self, file: &DriveFile, outcome: &Outcome) {
        self.bytes += outcome.bytes();
        match outcome {
            Outcome::Relocated { .. } => self.relocated += 1,
            Outcome::Planned { .. } => self.planned += 1,
            Outcome::Skipped(_) => self.skipped += 1,
            Outcome::Failed { stage, error } => {
                self.failed += 1;
                self.push_failure(file, format!("{stage} failed: {error}"));
            }
            Outcome::DetachFailed { copy_id, error, .. } => {
                self.detach_failed += 1;
                self.push_failure(
                    file,
                    format!("copied as {copy_id} but detach failed: {error}"),
                );
            }
        }
    }

    fn push_failure(&mut self, file: &DriveFile, reason: String) {
        self.failures.push(Failure {
            name: file.name.clone(),
            id: file.id.clone(),
            reason,
        });
    }

    /// Total files evaluated.
    pub fn total(&self) -> usize {
        self.relocated + self.planned + self.skipped + self.failed + self.detach_failed
    }

    /// Whether any original is still attached to the source next to its copy.
    pub fn has_stranded(&self) -> bool {
        self.detach_failed > 0
    }
}

/// Summary of a purge run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeReport {
    /// Files examined
    pub examined: usize,
    /// Names of the files deleted (or that would be, in a dry run), in order
    pub erased: Vec<String>,
    /// Whether this was a dry run
    pub dry_run: bool,
}

/// Receives per-file progress from a run.
pub trait Progress {
    /// Called once the files a run will walk through have been listed.
    fn on_listed(&self, _files: &[DriveFile]) {}

    /// Called after each relocation decision.
    fn on_relocation(&self, _file: &DriveFile, _outcome: &Outcome, _budget: Budget) {}

    /// Called after each purge deletion (or planned deletion).
    fn on_erase(&self, _file: &DriveFile, _dry_run: bool) {}
}

/// Progress sink that does nothing.
pub struct Silent;

impl Progress for Silent {}
