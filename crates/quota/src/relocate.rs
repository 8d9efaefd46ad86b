//! Quota-aware relocation.
//!
//! Files in the source folder are visited in name order. Each one that fits
//! the remaining budget is copied into the destination, and only then moved
//! from the source into the trash folder. Copy and detach never run in the
//! other order, so a failure leaves the original where it was.
//!
//! Decision per file, first match wins:
//!
//! | condition                          | outcome                  | remote calls            |
//! |------------------------------------|--------------------------|-------------------------|
//! | `size == 0`                        | `Skipped(Empty)`         | none                    |
//! | `size > budget`                    | `Skipped(TooLarge)`      | none                    |
//! | dry run                            | `Planned`                | none                    |
//! | snapshot fails                     | `Failed(Snapshot)`       | get                     |
//! | snapshot size no longer fits       | `Skipped(Changed)`       | get                     |
//! | copy fails                         | `Failed(Copy)`           | get, copy               |
//! | detach fails after bounded retry   | `DetachFailed`           | get, copy, update × n   |
//! | otherwise                          | `Relocated`              | get, copy, update       |

use drive::retry::{self, LogCallback, RetryCallback};
use drive::{Client, DriveFile};

use crate::capacity::estimate_capacity;
use crate::error::{Error, Result};
use crate::types::{
    Budget, Outcome, Progress, RelocateOptions, RelocationReport, SkipReason, Stage,
};

/// Runs the relocation loop against a client.
pub struct Relocator<'a> {
    client: &'a Client,
    options: &'a RelocateOptions,
    retry_callback: Option<&'a dyn RetryCallback>,
}

impl<'a> Relocator<'a> {
    /// Create a relocator. Detach retries are reported through `log`.
    pub fn new(client: &'a Client, options: &'a RelocateOptions) -> Self {
        Self {
            client,
            options,
            retry_callback: Some(&LogCallback),
        }
    }

    /// Report detach retries somewhere else (or nowhere).
    pub fn with_retry_callback(mut self, callback: Option<&'a dyn RetryCallback>) -> Self {
        self.retry_callback = callback;
        self
    }

    /// Decide and act on a single file, charging `budget` for any copy made.
    pub fn relocate_one(&self, file: &DriveFile, budget: &mut Budget) -> Outcome {
        if file.size == 0 {
            return Outcome::Skipped(SkipReason::Empty);
        }
        if !budget.fits(file.size) {
            return Outcome::Skipped(SkipReason::TooLarge {
                size: file.size,
                budget: budget.remaining(),
            });
        }

        if self.options.dry_run {
            budget.spend(file.size);
            return Outcome::Planned { bytes: file.size };
        }

        let folders = &self.options.folders;

        let snapshot = match self.client.snapshot(&file.id) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                log::debug!("Snapshot of {} failed: {}", file.name, error);
                return Outcome::Failed {
                    stage: Stage::Snapshot,
                    error,
                };
            }
        };

        if !budget.fits(snapshot.size) {
            return Outcome::Skipped(SkipReason::Changed {
                size: snapshot.size,
                budget: budget.remaining(),
            });
        }

        let copy = match self.client.copy_into(&snapshot, &folders.destination) {
            Ok(copy) => copy,
            Err(error) => {
                log::debug!("Copy of {} failed: {}", file.name, error);
                return Outcome::Failed {
                    stage: Stage::Copy,
                    error,
                };
            }
        };

        budget.spend(snapshot.size);

        let detached = retry::with_retry(&self.options.retry, self.retry_callback, || {
            self.client
                .reparent(&file.id, &folders.trash, &folders.source)
        });

        match detached {
            Ok(_) => Outcome::Relocated {
                copy_id: copy.id,
                bytes: snapshot.size,
            },
            Err(error) => {
                log::error!(
                    "{} ({}) was copied as {} but is still in the source folder: {}",
                    file.name,
                    file.id,
                    copy.id,
                    error
                );
                Outcome::DetachFailed {
                    copy_id: copy.id,
                    bytes: snapshot.size,
                    error,
                }
            }
        }
    }

    /// Evaluate every file in order, starting from `budget`.
    pub fn run(
        &self,
        files: &[DriveFile],
        mut budget: Budget,
        progress: &dyn Progress,
    ) -> RelocationReport {
        let mut report = RelocationReport::default();

        for file in files {
            let outcome = self.relocate_one(file, &mut budget);
            progress.on_relocation(file, &outcome, budget);
            report.add(file, &outcome);
        }

        report.remaining = budget.remaining();
        report
    }
}

/// Full relocation pass: estimate capacity, list the source, run the loop.
///
/// Only the two listings are fatal; per-file problems end up in the report.
pub fn relocate(
    client: &Client,
    options: &RelocateOptions,
    capacity: u64,
    progress: &dyn Progress,
) -> Result<RelocationReport> {
    let budget = estimate_capacity(client, capacity)?;

    let files = client
        .children(&options.folders.source)
        .map_err(|e| Error::listing(format!("source folder {}", options.folders.source), e))?;
    log::info!(
        "{} files in source folder, budget {}",
        files.len(),
        budget
    );
    progress.on_listed(&files);

    Ok(Relocator::new(client, options).run(&files, budget, progress))
}
