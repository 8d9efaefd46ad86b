//! Purge command - delete marked files from the account root

use anyhow::{Context as _, Result};
use drive::Client;
use quota::Marker;

use super::{ConsoleProgress, connect};
use crate::Context;
use crate::cli::PurgeArgs;
use crate::config::Settings;
use crate::ui;

pub fn run(ctx: &Context, args: PurgeArgs) -> Result<()> {
    let settings = Settings::load(ctx.config.as_deref())?;
    let marker = settings.marker(args.marker.as_deref())?;
    let page_size = settings.page_size(args.common.page_size)?;

    let client = connect(ctx, &args.common, page_size)?;
    execute(
        ctx,
        &client,
        &marker,
        args.common.dry_run,
        args.label.as_deref(),
    )
}

/// Purge marked root files through `client`. The first failed deletion
/// fails the run.
pub fn execute(
    ctx: &Context,
    client: &Client,
    marker: &Marker,
    dry_run: bool,
    label: Option<&str>,
) -> Result<()> {
    let progress = ConsoleProgress::new(ctx, label, "Listing root folder");
    let report = quota::purge(client, marker, dry_run, &progress).context("Purge stopped")?;
    drop(progress);

    if !ctx.quiet {
        if report.erased.is_empty() {
            ui::dim(&format!(
                "No files starting with {:?} among {} root files",
                marker.as_str(),
                report.examined
            ));
        } else if report.dry_run {
            ui::info(&format!("{} file(s) would be erased", report.erased.len()));
        } else {
            ui::success(&format!("{} file(s) erased", report.erased.len()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::quiet_context;
    use drive::DriveFile;
    use drive::backend::memory::{Fault, MemoryBackend, Operation};
    use std::sync::Arc;

    fn store() -> Arc<MemoryBackend> {
        Arc::new(MemoryBackend::with_files([
            DriveFile::new("1", "tmp_a", 1).with_parents(["root"]),
            DriveFile::new("2", "keep_b", 1).with_parents(["root"]),
            DriveFile::new("3", "tmp_c", 1).with_parents(["root"]),
        ]))
    }

    fn execute_with(store: &Arc<MemoryBackend>, dry_run: bool) -> Result<()> {
        let client = Client::with_backend(Box::new(store.clone()));
        let marker = Marker::new("tmp_").unwrap();
        execute(&quiet_context(), &client, &marker, dry_run, None)
    }

    #[test]
    fn test_purge_succeeds() {
        let store = store();
        execute_with(&store, false).unwrap();
        assert_eq!(store.names_in("root"), vec!["keep_b"]);
    }

    #[test]
    fn test_delete_failure_fails_the_run() {
        let store = store();
        store.fail_always(Operation::Delete, "3", Fault::PermissionDenied);

        let err = execute_with(&store, false).unwrap_err();

        assert!(format!("{err:#}").contains("Purge stopped"));
        // tmp_a went before the failure
        assert_eq!(store.names_in("root"), vec!["keep_b", "tmp_c"]);
    }

    #[test]
    fn test_dry_run_deletes_nothing() {
        let store = store();
        execute_with(&store, true).unwrap();
        assert!(store.calls_of(Operation::Delete).is_empty());
    }
}
