//! Sync error types.

/// Error returned by a workspace call.
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    /// The workspace asked us to slow down.
    #[error("Rate limited: {message}")]
    RateLimited { message: String },

    /// Server-side or network failure that may succeed on retry.
    #[error("Transient failure: {message}")]
    Transient { message: String },

    /// The workspace refused the request.
    #[error("Request rejected (code {code}): {message}")]
    Rejected { code: i64, message: String },

    /// The request was sent but its result never arrived, so it may have
    /// been applied.
    #[error("Outcome unknown: {message}")]
    Unconfirmed { message: String },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not have the expected shape.
    #[error("Unexpected response: {message}")]
    Decode { message: String },

    /// An endpoint URL could not be built.
    #[error("Invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
}

impl WorkspaceError {
    /// Returns true when repeating the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Transient { .. } | Self::Unconfirmed { .. } => true,
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Rejected { .. } | Self::Decode { .. } | Self::Url(_) => false,
        }
    }

    /// Returns true when the request may have taken effect despite the error.
    #[must_use]
    pub fn may_have_applied(&self) -> bool {
        match self {
            Self::Unconfirmed { .. } => true,
            Self::Http(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Classifies an error from sending a request. A timeout leaves the
    /// outcome unknown.
    pub(crate) fn from_send(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Unconfirmed {
                message: error.to_string(),
            }
        } else {
            Self::Http(error)
        }
    }
}

/// Error that stops a sync before any write.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The remote snapshot could not be read completely.
    #[error("Failed to read table snapshot after {attempts} attempt(s): {message}")]
    Snapshot { attempts: u32, message: String },
}
