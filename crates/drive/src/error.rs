//! Error types for Drive operations.
//!
//! Errors are categorized so callers can tell a transient failure (worth
//! retrying) from a permanent one (not found, permission, quota) without
//! string matching.

use std::fmt;
use thiserror::Error;

/// Categories of Drive errors for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Credentials missing, malformed, or rejected by the token endpoint.
    Auth,
    /// The file or folder does not exist (or is not visible to the principal).
    NotFound,
    /// Request rate limit hit (transient, retryable).
    RateLimit,
    /// Storage quota exhausted on the account.
    Quota,
    /// The principal lacks access to the file or folder.
    Permission,
    /// Connection-level failure or server-side outage (transient, retryable).
    Network,
    /// The request was rejected as invalid.
    Rejected,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::RateLimit)
    }

    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Auth => "Authentication failed",
            Self::NotFound => "File not found",
            Self::RateLimit => "Rate limit exceeded",
            Self::Quota => "Storage quota exceeded",
            Self::Permission => "Permission denied",
            Self::Network => "Network connectivity issue",
            Self::Rejected => "Request rejected",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Auth => "Check that the credential is a base64-encoded service-account key",
            Self::NotFound => "Verify the folder ID and that it is shared with the service account",
            Self::RateLimit => "Wait a moment and run again",
            Self::Quota => "Free space on the destination account or lower the capacity setting",
            Self::Permission => "Share the folder with the service account's email address",
            Self::Network => "Check your internet connection and try again",
            Self::Rejected => "Check the request parameters",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to Drive.
#[derive(Debug, Error)]
pub enum Error {
    /// No credential was supplied
    #[error("missing credentials")]
    MissingCredentials,

    /// Credential blob could not be decoded or parsed
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Token exchange or request authorization failed
    #[error("authentication failed: {message}")]
    Auth {
        /// Message returned by the token endpoint or API
        message: String,
    },

    /// File or folder not found
    #[error("not found: {message}")]
    NotFound {
        /// Message returned by the API
        message: String,
    },

    /// Rate limit exceeded
    #[error("rate limited: {message}")]
    RateLimited {
        /// Message returned by the API
        message: String,
    },

    /// Storage quota exceeded
    #[error("storage quota exceeded: {message}")]
    QuotaExceeded {
        /// Message returned by the API
        message: String,
    },

    /// Principal may not access the resource
    #[error("permission denied: {message}")]
    PermissionDenied {
        /// Message returned by the API
        message: String,
    },

    /// Server-side failure (5xx)
    #[error("service unavailable (HTTP {status}): {message}")]
    Unavailable {
        /// HTTP status code
        status: u16,
        /// Message returned by the API
        message: String,
    },

    /// Transport failure (DNS, TLS, timeout, connection reset)
    #[error("network error: {message}")]
    Network {
        /// Detailed error message from the failed network operation
        message: String,
    },

    /// Request rejected for any other reason (4xx)
    #[error("request rejected (HTTP {status}): {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Message returned by the API
        message: String,
    },

    /// Response body did not match the expected shape
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Get the error category for retry logic.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::MissingCredentials | Error::InvalidCredentials(_) | Error::Auth { .. } => {
                ErrorCategory::Auth
            }
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::RateLimited { .. } => ErrorCategory::RateLimit,
            Error::QuotaExceeded { .. } => ErrorCategory::Quota,
            Error::PermissionDenied { .. } => ErrorCategory::Permission,
            Error::Unavailable { .. } | Error::Network { .. } => ErrorCategory::Network,
            Error::Rejected { .. } => ErrorCategory::Rejected,
            Error::InvalidResponse(_) | Error::Other(_) => ErrorCategory::Other,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Build an error from an HTTP status and the API's error payload.
    ///
    /// Drive reports rate limiting and quota exhaustion as 403 with a
    /// `reason` in `error.errors[]`, so the status alone is not enough.
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<ErrorEnvelope>(body).ok();
        let message = detail
            .as_ref()
            .map(|d| d.error.message.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("HTTP {status}"));
        let reasons: Vec<&str> = detail
            .as_ref()
            .map(|d| d.error.errors.iter().map(|e| e.reason.as_str()).collect())
            .unwrap_or_default();

        match status {
            401 => Error::Auth { message },
            404 => Error::NotFound { message },
            429 => Error::RateLimited { message },
            403 if reasons
                .iter()
                .any(|r| matches!(*r, "rateLimitExceeded" | "userRateLimitExceeded")) =>
            {
                Error::RateLimited { message }
            }
            403 if reasons.contains(&"storageQuotaExceeded") => Error::QuotaExceeded { message },
            403 => Error::PermissionDenied { message },
            500..=599 => Error::Unavailable { status, message },
            _ => Error::Rejected { status, message },
        }
    }
}

/// `{"error": {"code": 403, "message": "...", "errors": [{"reason": "..."}]}}`
#[derive(Debug, serde::Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorReason>,
}

#[derive(Debug, serde::Deserialize)]
struct ErrorReason {
    #[serde(default)]
    reason: String,
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::from_status(code, ""),
            ureq::Error::Json(e) => Self::InvalidResponse(e.to_string()),
            other => Self::Network {
                message: other.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

/// Result type for Drive operations.
pub type Result<T> = std::result::Result<T, Error>;
