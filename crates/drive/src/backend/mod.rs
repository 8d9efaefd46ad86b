use crate::error::Result;
use crate::types::{CopyRequest, DriveFile, FileList, ListQuery};

#[cfg(feature = "http")]
pub mod http;
pub mod memory;

/// Backend trait for Drive operations
///
/// This trait abstracts the underlying transport, allowing us to:
/// - Talk to the Drive v3 REST API over HTTP
/// - Run the same relocation and purge logic against an in-memory store
/// - Mock for testing
pub trait Backend: Send + Sync {
    /// Fetch one page of a listing
    fn list(&self, query: &ListQuery, page_token: Option<&str>) -> Result<FileList>;

    /// Fetch full metadata for a single file
    fn get(&self, id: &str) -> Result<DriveFile>;

    /// Duplicate a file, returning the new file record
    fn copy(&self, id: &str, template: &CopyRequest) -> Result<DriveFile>;

    /// Add one parent folder and remove another, keeping the file's identity
    fn update_parents(&self, id: &str, add: &str, remove: &str) -> Result<DriveFile>;

    /// Permanently delete a file
    fn delete(&self, id: &str) -> Result<()>;

    /// Fetch every page of a listing
    fn list_all(&self, query: &ListQuery) -> Result<Vec<DriveFile>> {
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.list(query, page_token.as_deref())?;
            files.extend(page.files);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(files)
    }
}

/// Shared backends, so a caller can keep a handle on the store it hands to a client.
impl<B: Backend + ?Sized> Backend for std::sync::Arc<B> {
    fn list(&self, query: &ListQuery, page_token: Option<&str>) -> Result<FileList> {
        (**self).list(query, page_token)
    }

    fn get(&self, id: &str) -> Result<DriveFile> {
        (**self).get(id)
    }

    fn copy(&self, id: &str, template: &CopyRequest) -> Result<DriveFile> {
        (**self).copy(id, template)
    }

    fn update_parents(&self, id: &str, add: &str, remove: &str) -> Result<DriveFile> {
        (**self).update_parents(id, add, remove)
    }

    fn delete(&self, id: &str) -> Result<()> {
        (**self).delete(id)
    }
}
