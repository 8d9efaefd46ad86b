//! In-memory backend.
//!
//! Holds a flat set of files with parent references and understands the two
//! query shapes the tools issue (`'me' in owners` and `'<id>' in parents`).
//! Faults can be injected per operation and file id, and every call is
//! recorded, so callers can assert on ordering.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::Backend;
use crate::error::{Error, Result};
use crate::types::{CopyRequest, DriveFile, FileList, ListQuery};

/// Remote operations that can be observed or made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `files.list`
    List,
    /// `files.get`
    Get,
    /// `files.copy`
    Copy,
    /// `files.update` with addParents/removeParents
    UpdateParents,
    /// `files.delete`
    Delete,
}

/// Kind of failure to inject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Connection-level failure (retryable)
    Network,
    /// 429 (retryable)
    RateLimited,
    /// 403 storage quota exceeded
    QuotaExceeded,
    /// 403 insufficient permissions
    PermissionDenied,
    /// 404
    NotFound,
}

impl Fault {
    fn to_error(self, id: &str) -> Error {
        let message = format!("injected fault for {id}");
        match self {
            Fault::Network => Error::Network { message },
            Fault::RateLimited => Error::RateLimited { message },
            Fault::QuotaExceeded => Error::QuotaExceeded { message },
            Fault::PermissionDenied => Error::PermissionDenied { message },
            Fault::NotFound => Error::NotFound { message },
        }
    }
}

/// A recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// Operation invoked
    pub op: Operation,
    /// File id (or the query string for listings)
    pub target: String,
}

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<String, DriveFile>,
    faults: HashMap<(Operation, String), (Fault, u32)>,
    calls: Vec<Call>,
    next_copy: u64,
}

impl State {
    fn record(&mut self, op: Operation, target: &str) -> Result<()> {
        self.calls.push(Call {
            op,
            target: target.to_string(),
        });

        let key = (op, target.to_string());
        if let Some((fault, remaining)) = self.faults.get_mut(&key) {
            let fault = *fault;
            *remaining -= 1;
            if *remaining == 0 {
                self.faults.remove(&key);
            }
            return Err(fault.to_error(target));
        }
        Ok(())
    }

    fn file(&self, id: &str) -> Result<&DriveFile> {
        self.files.get(id).ok_or_else(|| not_found(id))
    }
}

fn not_found(id: &str) -> Error {
    Error::NotFound {
        message: format!("File not found: {id}"),
    }
}

/// Backend that keeps files in memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `files`.
    pub fn with_files(files: impl IntoIterator<Item = DriveFile>) -> Self {
        let backend = Self::new();
        for file in files {
            backend.insert(file);
        }
        backend
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add or replace a file.
    pub fn insert(&self, file: DriveFile) {
        self.lock().files.insert(file.id.clone(), file);
    }

    /// Make the next `times` calls of `op` on `id` fail with `fault`.
    pub fn fail(&self, op: Operation, id: &str, fault: Fault, times: u32) {
        if times > 0 {
            self.lock().faults.insert((op, id.to_string()), (fault, times));
        }
    }

    /// Make every call of `op` on `id` fail with `fault`.
    pub fn fail_always(&self, op: Operation, id: &str, fault: Fault) {
        self.fail(op, id, fault, u32::MAX);
    }

    /// Look up a file by id.
    pub fn file(&self, id: &str) -> Option<DriveFile> {
        self.lock().files.get(id).cloned()
    }

    /// Files whose parent set includes `folder`, ordered by name.
    pub fn files_in(&self, folder: &str) -> Vec<DriveFile> {
        let mut files: Vec<DriveFile> = self
            .lock()
            .files
            .values()
            .filter(|f| f.is_in(folder))
            .cloned()
            .collect();
        files.sort_by(|a, b| a.name.cmp(&b.name));
        files
    }

    /// Names of the files in `folder`, ordered by name.
    pub fn names_in(&self, folder: &str) -> Vec<String> {
        self.files_in(folder).into_iter().map(|f| f.name).collect()
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Calls of a single operation, in order.
    pub fn calls_of(&self, op: Operation) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.op == op)
            .map(|c| c.target.clone())
            .collect()
    }
}

/// Resolve the listing predicate for the query shapes we issue.
fn matcher(q: &str) -> Result<Box<dyn Fn(&DriveFile) -> bool>> {
    if q == "'me' in owners" {
        return Ok(Box::new(|_: &DriveFile| true));
    }

    if let Some(folder) = q
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix("' in parents"))
    {
        let folder = folder.replace("\\'", "'").replace("\\\\", "\\");
        return Ok(Box::new(move |f: &DriveFile| f.is_in(&folder)));
    }

    Err(Error::Rejected {
        status: 400,
        message: format!("unsupported query: {q}"),
    })
}

impl Backend for MemoryBackend {
    fn list(&self, query: &ListQuery, page_token: Option<&str>) -> Result<FileList> {
        let mut state = self.lock();
        state.record(Operation::List, &query.q)?;

        let matches = matcher(&query.q)?;
        let mut files: Vec<DriveFile> = state.files.values().filter(|f| matches(f)).cloned().collect();
        if query.order_by == "name" {
            files.sort_by(|a, b| a.name.cmp(&b.name));
        }

        let offset: usize = match page_token {
            Some(token) => token.parse().map_err(|_| Error::Rejected {
                status: 400,
                message: format!("invalid page token: {token}"),
            })?,
            None => 0,
        };
        let page_size = query.page_size.max(1) as usize;
        let end = offset.saturating_add(page_size).min(files.len());
        let next_page_token = (end < files.len()).then(|| end.to_string());

        Ok(FileList {
            files: files.get(offset..end).map(<[DriveFile]>::to_vec).unwrap_or_default(),
            next_page_token,
        })
    }

    fn get(&self, id: &str) -> Result<DriveFile> {
        let mut state = self.lock();
        state.record(Operation::Get, id)?;
        state.file(id).cloned()
    }

    fn copy(&self, id: &str, template: &CopyRequest) -> Result<DriveFile> {
        let mut state = self.lock();
        state.record(Operation::Copy, id)?;
        let source = state.file(id)?.clone();

        state.next_copy += 1;
        let copy = DriveFile {
            id: format!("copy-{}", state.next_copy),
            name: template.name.clone(),
            size: source.size,
            parents: template.parents.clone(),
            mime_type: template.mime_type.clone().or(source.mime_type),
            description: template.description.clone(),
        };
        state.files.insert(copy.id.clone(), copy.clone());
        Ok(copy)
    }

    fn update_parents(&self, id: &str, add: &str, remove: &str) -> Result<DriveFile> {
        let mut state = self.lock();
        state.record(Operation::UpdateParents, id)?;
        let file = state.files.get_mut(id).ok_or_else(|| not_found(id))?;
        file.parents.retain(|p| p != remove);
        if !file.is_in(add) {
            file.parents.push(add.to_string());
        }
        Ok(file.clone())
    }

    fn delete(&self, id: &str) -> Result<()> {
        let mut state = self.lock();
        state.record(Operation::Delete, id)?;
        state.files.remove(id).map(|_| ()).ok_or_else(|| not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryBackend {
        MemoryBackend::with_files([
            DriveFile::new("b", "beta", 20).with_parents(["src"]),
            DriveFile::new("a", "alpha", 10).with_parents(["src"]),
            DriveFile::new("c", "gamma", 30).with_parents(["other"]),
        ])
    }

    #[test]
    fn test_list_children_ordered_by_name() {
        let backend = store();
        let page = backend.list(&ListQuery::children_of("src"), None).unwrap();
        let names: Vec<_> = page.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn test_list_all_follows_pages() {
        let backend = store();
        let query = ListQuery::owned_by_me().with_page_size(1);

        let first = backend.list(&query, None).unwrap();
        assert_eq!(first.files.len(), 1);
        assert_eq!(first.next_page_token.as_deref(), Some("1"));

        let all = backend.list_all(&query).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(backend.calls_of(Operation::List).len(), 4);
    }

    #[test]
    fn test_page_token_past_the_end() {
        let backend = store();
        let query = ListQuery::owned_by_me();

        let page = backend.list(&query, Some(&usize::MAX.to_string())).unwrap();
        assert!(page.files.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn test_unsupported_query() {
        let backend = store();
        let err = backend.list(&ListQuery::new("name contains 'x'"), None).unwrap_err();
        assert!(matches!(err, Error::Rejected { status: 400, .. }));
    }

    #[test]
    fn test_copy_assigns_new_identity() {
        let backend = store();
        let snapshot = backend.get("a").unwrap();
        let copy = backend
            .copy("a", &CopyRequest::from_snapshot(&snapshot, "dst"))
            .unwrap();

        assert_ne!(copy.id, "a");
        assert_eq!(copy.size, 10);
        assert_eq!(backend.names_in("dst"), vec!["alpha"]);
        // Original untouched
        assert!(backend.file("a").unwrap().is_in("src"));
    }

    #[test]
    fn test_update_parents() {
        let backend = store();
        let updated = backend.update_parents("a", "trash", "src").unwrap();
        assert_eq!(updated.parents, vec!["trash".to_string()]);
        assert_eq!(backend.names_in("src"), vec!["beta"]);
    }

    #[test]
    fn test_delete_and_not_found() {
        let backend = store();
        backend.delete("a").unwrap();
        assert!(backend.file("a").is_none());
        assert!(matches!(
            backend.delete("a"),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_fault_injection_counts_down() {
        let backend = store();
        backend.fail(Operation::Get, "a", Fault::Network, 2);

        assert!(backend.get("a").unwrap_err().is_retryable());
        assert!(backend.get("a").is_err());
        assert!(backend.get("a").is_ok());
        assert_eq!(backend.calls_of(Operation::Get), vec!["a", "a", "a"]);
    }

    #[test]
    fn test_fail_always() {
        let backend = store();
        backend.fail_always(Operation::Delete, "b", Fault::PermissionDenied);
        for _ in 0..5 {
            assert!(matches!(
                backend.delete("b"),
                Err(Error::PermissionDenied { .. })
            ));
        }
        assert!(backend.file("b").is_some());
    }
}
