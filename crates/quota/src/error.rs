use thiserror::Error;

/// Errors that end a relocation or purge run.
///
/// Per-file copy and detach failures are not errors at this level; they are
/// reported as [`Outcome`](crate::Outcome)s and the run continues.
#[derive(Debug, Error)]
pub enum Error {
    /// A required setting is missing or unusable
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A listing the run depends on could not be completed
    #[error("unable to list {what}: {source}")]
    Listing {
        /// What was being listed
        what: String,
        /// Underlying Drive error
        #[source]
        source: drive::Error,
    },

    /// A purge delete failed; no further deletes were attempted
    #[error("failed to delete {name} ({id}) after {deleted} deletions: {source}")]
    Delete {
        /// Name of the file that could not be deleted
        name: String,
        /// Its id
        id: String,
        /// Files deleted before the failure
        deleted: usize,
        /// Underlying Drive error
        #[source]
        source: drive::Error,
    },
}

impl Error {
    /// Wrap a listing failure.
    pub fn listing(what: impl Into<String>, source: drive::Error) -> Self {
        Self::Listing {
            what: what.into(),
            source,
        }
    }

    /// The Drive error underneath, if any.
    pub fn drive_error(&self) -> Option<&drive::Error> {
        match self {
            Error::Config(_) => None,
            Error::Listing { source, .. } | Error::Delete { source, .. } => Some(source),
        }
    }
}

/// Result type for relocation and purge runs.
pub type Result<T> = std::result::Result<T, Error>;
