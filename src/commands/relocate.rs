//! Relocate command - copy source files into this account's quota

use anyhow::{Context as _, Result, bail};
use drive::Client;
use quota::{Folders, RelocateOptions, RelocationReport};

use super::{ConsoleProgress, connect};
use crate::Context;
use crate::cli::RelocateArgs;
use crate::config::Settings;
use crate::ui;

pub fn run(ctx: &Context, args: RelocateArgs) -> Result<()> {
    let settings = Settings::load(ctx.config.as_deref())?;
    let capacity = settings.capacity(args.capacity.as_deref())?;
    let page_size = settings.page_size(args.common.page_size)?;
    let options = RelocateOptions {
        folders: Folders::new(args.source, args.destination, args.trash)?,
        retry: settings.retry()?,
        dry_run: args.common.dry_run,
    };

    let client = connect(ctx, &args.common, page_size)?;
    execute(ctx, &client, &options, capacity, args.label.as_deref())
}

/// Run one relocation pass against `client`.
///
/// Per-file copy problems are reported and the run still succeeds; an
/// original left in the source next to its copy fails the run.
pub fn execute(
    ctx: &Context,
    client: &Client,
    options: &RelocateOptions,
    capacity: u64,
    label: Option<&str>,
) -> Result<()> {
    let progress = ConsoleProgress::new(ctx, label, "Scanning drive");
    let report = quota::relocate(client, options, capacity, &progress)
        .context("Relocation stopped")?;
    drop(progress);

    log::info!(
        "{} files examined in {}, {} of {} free",
        report.total(),
        options.folders.source,
        ui::format_budget(report.remaining),
        ui::format_size(capacity)
    );

    if !ctx.quiet && report.total() > 0 {
        print_summary(&report);
    }

    if report.has_stranded() {
        bail!(
            "{} file(s) were copied but are still in the source folder",
            report.detach_failed
        );
    }
    Ok(())
}

fn print_summary(report: &RelocationReport) {
    ui::header("Summary");
    ui::dim(&format!("{} file(s) examined", report.total()));
    if report.planned > 0 {
        ui::info(&format!(
            "{} file(s) would be relocated ({})",
            report.planned,
            ui::format_size(report.bytes)
        ));
    } else {
        ui::success(&format!(
            "{} file(s) relocated ({})",
            report.relocated,
            ui::format_size(report.bytes)
        ));
    }
    if report.skipped > 0 {
        ui::dim(&format!("{} file(s) skipped", report.skipped));
    }
    if report.failed > 0 {
        ui::warn(&format!("{} file(s) failed before copying", report.failed));
    }
    for failure in &report.failures {
        ui::dim(&format!("{} ({}): {}", failure.name, failure.id, failure.reason));
    }
    ui::dim(&format!(
        "{} of quota left",
        ui::format_budget(report.remaining)
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::{no_delay, quiet_context};
    use drive::DriveFile;
    use drive::backend::memory::{Fault, MemoryBackend, Operation};
    use std::sync::Arc;

    fn options(dry_run: bool) -> RelocateOptions {
        RelocateOptions {
            folders: Folders::new("src", "dst", "trash").unwrap(),
            retry: no_delay(),
            dry_run,
        }
    }

    fn store() -> Arc<MemoryBackend> {
        Arc::new(MemoryBackend::with_files([
            DriveFile::new("a", "A", 60).with_parents(["src"]),
            DriveFile::new("b", "B", 10).with_parents(["src"]),
        ]))
    }

    fn execute_with(store: &Arc<MemoryBackend>, dry_run: bool) -> Result<()> {
        let client = Client::with_backend(Box::new(store.clone()));
        execute(&quiet_context(), &client, &options(dry_run), 1_000, Some("1"))
    }

    #[test]
    fn test_relocation_succeeds() {
        let store = store();
        execute_with(&store, false).unwrap();
        assert_eq!(store.names_in("dst"), vec!["A", "B"]);
        assert!(store.files_in("src").is_empty());
    }

    #[test]
    fn test_stranded_original_fails_the_run() {
        let store = store();
        store.fail_always(Operation::UpdateParents, "a", Fault::Network);

        let err = execute_with(&store, false).unwrap_err().to_string();

        assert!(err.contains("1 file(s) were copied"));
        // The copy exists and the original is still in the source
        assert_eq!(store.names_in("dst"), vec!["A", "B"]);
        assert_eq!(store.names_in("src"), vec!["A"]);
    }

    #[test]
    fn test_copy_failure_does_not_fail_the_run() {
        let store = store();
        store.fail_always(Operation::Copy, "a", Fault::QuotaExceeded);

        execute_with(&store, false).unwrap();

        assert_eq!(store.names_in("dst"), vec!["B"]);
        assert_eq!(store.names_in("src"), vec!["A"]);
    }

    #[test]
    fn test_dry_run_succeeds_without_changes() {
        let store = store();
        execute_with(&store, true).unwrap();
        assert!(store.calls_of(Operation::Copy).is_empty());
        assert_eq!(store.names_in("src").len(), 2);
    }

    #[test]
    fn test_empty_source_succeeds() {
        let store = Arc::new(MemoryBackend::new());
        execute_with(&store, false).unwrap();
    }

    #[test]
    fn test_source_listing_failure_fails_the_run() {
        let store = store();
        store.fail(Operation::List, "'src' in parents", Fault::NotFound, 1);

        let err = execute_with(&store, false).unwrap_err();
        assert!(format!("{err:#}").contains("Relocation stopped"));
    }
}
