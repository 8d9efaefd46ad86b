//! Marker-based purge of the principal's root folder.
//!
//! Only files directly under the root are considered. Deletion is permanent
//! and stops at the first failure.

use drive::{Client, DriveFile};

use crate::error::{Error, Result};
use crate::types::{Marker, Progress, PurgeReport};

/// Files whose name starts with `marker`, keeping listing order.
pub fn select<'a>(files: &'a [DriveFile], marker: &Marker) -> Vec<&'a DriveFile> {
    files.iter().filter(|f| marker.matches(&f.name)).collect()
}

/// Delete every root-level file whose name starts with `marker`.
///
/// With `dry_run` set, the selection is reported but nothing is deleted.
pub fn purge(
    client: &Client,
    marker: &Marker,
    dry_run: bool,
    progress: &dyn Progress,
) -> Result<PurgeReport> {
    let files = client
        .root_children()
        .map_err(|e| Error::listing("root folder", e))?;

    progress.on_listed(&files);

    let selected = select(&files, marker);
    log::info!(
        "{} of {} root files match {:?}",
        selected.len(),
        files.len(),
        marker.as_str()
    );

    let mut report = PurgeReport {
        examined: files.len(),
        erased: Vec::with_capacity(selected.len()),
        dry_run,
    };

    for file in selected {
        if !dry_run {
            client.delete(&file.id).map_err(|source| Error::Delete {
                name: file.name.clone(),
                id: file.id.clone(),
                deleted: report.erased.len(),
                source,
            })?;
        }
        progress.on_erase(file, dry_run);
        report.erased.push(file.name.clone());
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use drive::backend::memory::{Fault, MemoryBackend, Operation};
    use std::sync::Arc;

    fn root_file(id: &str, name: &str) -> DriveFile {
        DriveFile::new(id, name, 1).with_parents(["root"])
    }

    fn store() -> Arc<MemoryBackend> {
        Arc::new(MemoryBackend::with_files([
            root_file("1", "tmp_a"),
            root_file("2", "keep_b"),
            root_file("3", "tmp_c"),
            // Matches, but not at the root
            DriveFile::new("4", "tmp_nested", 1).with_parents(["folder"]),
        ]))
    }

    #[test]
    fn test_select() {
        let files = vec![
            DriveFile::new("1", "#@__x", 1),
            DriveFile::new("2", "x#@__", 1),
            DriveFile::new("3", "#@__", 1),
        ];
        let marker = Marker::new("#@__").unwrap();
        let names: Vec<_> = select(&files, &marker)
            .into_iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["#@__x", "#@__"]);
    }

    #[test]
    fn test_purge_deletes_matching_root_files() {
        let store = store();
        let client = Client::with_backend(Box::new(store.clone()));
        let marker = Marker::new("tmp_").unwrap();

        let report = purge(&client, &marker, false, &crate::Silent).unwrap();

        assert_eq!(report.examined, 3);
        assert_eq!(report.erased, vec!["tmp_a", "tmp_c"]);
        assert_eq!(store.names_in("root"), vec!["keep_b"]);
        assert!(store.file("4").is_some());
        assert_eq!(store.calls_of(Operation::Delete), vec!["1", "3"]);
    }

    #[test]
    fn test_purge_stops_at_first_failure() {
        let store = store();
        store.fail_always(Operation::Delete, "1", Fault::PermissionDenied);
        let client = Client::with_backend(Box::new(store.clone()));
        let marker = Marker::new("tmp_").unwrap();

        let err = purge(&client, &marker, false, &crate::Silent).unwrap_err();

        match &err {
            Error::Delete { name, deleted, .. } => {
                assert_eq!(name, "tmp_a");
                assert_eq!(*deleted, 0);
            }
            other => panic!("Expected Delete error, got {other:?}"),
        }
        // tmp_c was never attempted
        assert_eq!(store.calls_of(Operation::Delete), vec!["1"]);
        assert!(store.file("3").is_some());
    }

    #[test]
    fn test_purge_failure_counts_prior_deletions() {
        let store = store();
        store.fail(Operation::Delete, "3", Fault::Network, 1);
        let client = Client::with_backend(Box::new(store.clone()));
        let marker = Marker::new("tmp_").unwrap();

        let err = purge(&client, &marker, false, &crate::Silent).unwrap_err();
        assert!(matches!(err, Error::Delete { deleted: 1, .. }));
        assert!(store.file("1").is_none());
    }

    #[test]
    fn test_purge_dry_run() {
        let store = store();
        let client = Client::with_backend(Box::new(store.clone()));
        let marker = Marker::new("tmp_").unwrap();

        let report = purge(&client, &marker, true, &crate::Silent).unwrap();

        assert!(report.dry_run);
        assert_eq!(report.erased, vec!["tmp_a", "tmp_c"]);
        assert!(store.calls_of(Operation::Delete).is_empty());
        assert_eq!(store.names_in("root").len(), 3);
    }

    #[test]
    fn test_purge_listing_failure() {
        let store = store();
        store.fail(Operation::List, "'root' in parents", Fault::Network, 1);
        let client = Client::with_backend(Box::new(store.clone()));
        let marker = Marker::new("tmp_").unwrap();

        let err = purge(&client, &marker, false, &crate::Silent).unwrap_err();
        assert!(matches!(err, Error::Listing { .. }));
        assert!(store.calls_of(Operation::Delete).is_empty());
    }
}
