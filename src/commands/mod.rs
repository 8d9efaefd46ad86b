pub mod purge;
pub mod relocate;

use anyhow::{Context as _, Result};
use colored::Colorize;
use indicatif::ProgressBar;
use drive::{Client, DriveFile};
use quota::{Budget, Outcome, Progress};

use crate::Context;
use crate::cli::CommonArgs;
use crate::ui;

/// Decode the credentials and authenticate, with a spinner while the token
/// exchange runs.
fn connect(ctx: &Context, common: &CommonArgs, page_size: u32) -> Result<Client> {
    let pb = ui::spinner("Authenticating", ctx.quiet);
    let client = Client::from_credentials(&common.credentials);
    pb.finish_and_clear();

    Ok(client
        .context("Could not connect to Drive")?
        .with_page_size(page_size))
}

/// `[drive-LABEL]` prefix of the progress lines.
fn drive_tag(label: Option<&str>) -> String {
    match label {
        Some(l) if !l.is_empty() => format!("[drive-{l}]"),
        _ => "[drive]".to_string(),
    }
}

/// Prints one line per file as a run progresses.
///
/// A spinner runs until the listing arrives, then the tag line replaces it.
struct ConsoleProgress {
    verbose: u8,
    tag: String,
    spinner: ProgressBar,
}

impl ConsoleProgress {
    fn new(ctx: &Context, label: Option<&str>, scanning: &str) -> Self {
        Self {
            verbose: ctx.verbose,
            tag: drive_tag(label),
            spinner: ui::spinner(scanning, ctx.quiet),
        }
    }
}

impl Drop for ConsoleProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

impl Progress for ConsoleProgress {
    fn on_listed(&self, files: &[DriveFile]) {
        self.spinner.finish_and_clear();
        if files.is_empty() {
            println!("{}  No files left.", self.tag);
        } else {
            println!("{}  Files:", self.tag);
        }
    }

    fn on_relocation(&self, file: &DriveFile, outcome: &Outcome, budget: Budget) {
        match outcome {
            Outcome::Relocated { .. } => println!("Copied {} ({})", file.name, file.id),
            Outcome::Planned { .. } => println!(
                "Would copy {} ({}) {}",
                file.name,
                file.id,
                ui::format_size(file.size).dimmed()
            ),
            Outcome::Skipped(reason) => {
                if self.verbose > 0 {
                    ui::dim(&format!(
                        "Skipped {} ({}): {} [{} left]",
                        file.name,
                        file.id,
                        reason,
                        ui::format_budget(budget.remaining())
                    ));
                }
            }
            Outcome::Failed { stage, error } => ui::warn(&format!(
                "{} {} ({}) failed: {}",
                stage, file.name, file.id, error
            )),
            Outcome::DetachFailed { copy_id, error, .. } => ui::error(&format!(
                "Copied {} ({}) as {} but could not detach it: {}",
                file.name, file.id, copy_id, error
            )),
        }
    }

    fn on_erase(&self, file: &DriveFile, dry_run: bool) {
        if dry_run {
            println!("Would erase {} ({})", file.name, file.id);
        } else {
            println!("Erased {} ({})", file.name, file.id);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use drive::RetryConfig;
    use std::time::Duration;

    pub(crate) fn quiet_context() -> Context {
        Context {
            verbose: 0,
            quiet: true,
            config: None,
        }
    }

    pub(crate) fn no_delay() -> RetryConfig {
        RetryConfig {
            max_attempts: 2,
            base_delay: Duration::ZERO,
            backoff_factor: 1.0,
            max_delay: Duration::ZERO,
        }
    }

    #[test]
    fn test_drive_tag() {
        assert_eq!(drive_tag(Some("3")), "[drive-3]");
        assert_eq!(drive_tag(Some("")), "[drive]");
        assert_eq!(drive_tag(None), "[drive]");
    }
}
