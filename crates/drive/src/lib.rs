//! # drive
//!
//! A small blocking client for the Google Drive v3 API, scoped to what a
//! quota-balancing batch job needs: service-account authentication,
//! exhaustive listings, copy, reparent and delete.
//!
//! ## Example
//!
//! ```no_run
//! use drive::Client;
//!
//! let encoded = std::env::var("DRIVE_CREDENTIALS").unwrap_or_default();
//! let client = Client::from_credentials(&encoded).expect("Failed to authenticate");
//!
//! for file in client.children("0AbCdEfFolderId").expect("Failed to list") {
//!     println!("{} {} bytes", file.name, file.size);
//! }
//! ```
//!
//! ## Backends
//!
//! - `http` (default): the Drive REST API via `ureq`
//! - `memory`: an in-process store with fault injection, for tests and rehearsals
//!
//! ## Copy-then-detach
//!
//! A Drive file may sit in several folders at once. Moving a file is done in
//! two steps, a copy into the destination and a parent swap on the original,
//! so a failure between the two never leaves the data in neither place.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

/// Service-account credentials and token exchange.
pub mod auth;
/// Backend implementations for Drive operations.
pub mod backend;
/// Error types for Drive operations.
pub mod error;
/// Bounded retry with exponential backoff.
pub mod retry;
/// File metadata and request types.
pub mod types;

pub use error::{Error, ErrorCategory, Result};
pub use retry::RetryConfig;
pub use types::{CopyRequest, DEFAULT_PAGE_SIZE, DriveFile, FileList, ListQuery};

use backend::Backend;

/// High-level client for Drive operations.
pub struct Client {
    backend: Box<dyn Backend>,
    page_size: u32,
}

impl Client {
    /// Decode a base64 service-account key and authenticate against Drive.
    ///
    /// # Errors
    ///
    /// - `MissingCredentials`: blank input
    /// - `InvalidCredentials`: undecodable blob or unusable key
    /// - `Auth`: the token endpoint rejected the assertion
    #[cfg(feature = "http")]
    pub fn from_credentials(encoded: &str) -> Result<Self> {
        let key = auth::ServiceAccountKey::from_base64(encoded)?;
        let backend = backend::http::HttpBackend::connect(key)?;
        Ok(Self::with_backend(Box::new(backend)))
    }

    /// Create a client with a custom backend (useful for testing).
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self {
            backend,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set the number of records requested per listing page.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Run a listing to completion, following every page.
    pub fn list_all(&self, query: ListQuery) -> Result<Vec<DriveFile>> {
        self.backend.list_all(&query.with_page_size(self.page_size))
    }

    /// Every file owned by the authenticated principal, across all drives.
    ///
    /// Only `size` is populated.
    pub fn owned_files(&self) -> Result<Vec<DriveFile>> {
        self.list_all(ListQuery::owned_by_me())
    }

    /// Files whose parent set includes `folder_id`, ordered by name.
    pub fn children(&self, folder_id: &str) -> Result<Vec<DriveFile>> {
        self.list_all(ListQuery::children_of(folder_id))
    }

    /// Files directly under the principal's root folder, ordered by name.
    pub fn root_children(&self) -> Result<Vec<DriveFile>> {
        self.list_all(ListQuery::root_children())
    }

    /// Fetch the full metadata of a file.
    pub fn snapshot(&self, id: &str) -> Result<DriveFile> {
        self.backend.get(id)
    }

    /// Copy the file described by `snapshot` into `destination`.
    ///
    /// The copy gets a new id; the original is untouched.
    pub fn copy_into(&self, snapshot: &DriveFile, destination: &str) -> Result<DriveFile> {
        let template = CopyRequest::from_snapshot(snapshot, destination);
        self.backend.copy(&snapshot.id, &template)
    }

    /// Add `add` to a file's parents and remove `remove`.
    pub fn reparent(&self, id: &str, add: &str, remove: &str) -> Result<DriveFile> {
        self.backend.update_parents(id, add, remove)
    }

    /// Permanently delete a file.
    pub fn delete(&self, id: &str) -> Result<()> {
        self.backend.delete(id)
    }
}
