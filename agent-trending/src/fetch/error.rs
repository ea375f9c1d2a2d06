//! Search error types.

use thiserror::Error;

/// Errors that can occur while searching one target.
///
/// Every variant is scoped to a single query or topic: the caller logs it and
/// moves on to the next target.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The search quota is exhausted.
    #[error("Search rate limit exceeded for '{target}'")]
    RateLimited { target: String },

    /// The platform refused the request.
    #[error("Search for '{target}' rejected with HTTP {status}: {message}")]
    Rejected {
        target: String,
        status: u16,
        message: String,
    },

    /// Transport or client failure.
    #[error("GitHub API error: {0}")]
    Request(#[from] octocrab::Error),

    /// The response or one of its items could not be understood.
    #[error("Malformed search response: {message}")]
    Malformed { message: String },
}

impl FetchError {
    /// Returns true if the target was skipped because of the rate limit.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Classifies an octocrab error raised while searching `target`.
    pub(crate) fn from_octocrab(error: octocrab::Error, target: &str) -> Self {
        match error {
            octocrab::Error::GitHub { source, .. } => {
                let status = source.status_code.as_u16();
                if is_rate_limit_response(status, &source.message) {
                    Self::RateLimited {
                        target: target.to_string(),
                    }
                } else {
                    Self::Rejected {
                        target: target.to_string(),
                        status,
                        message: source.message.clone(),
                    }
                }
            }
            octocrab::Error::Serde { source, .. } => Self::Malformed {
                message: source.to_string(),
            },
            octocrab::Error::Json { source, .. } => Self::Malformed {
                message: source.to_string(),
            },
            other => Self::Request(other),
        }
    }
}

/// 429 is always a rate limit; 403 only when the message says so, since it
/// also covers plain permission failures.
pub(crate) fn is_rate_limit_response(status: u16, message: &str) -> bool {
    if status == 429 {
        return true;
    }
    let message = message.to_lowercase();
    status == 403 && (message.contains("rate limit") || message.contains("quota"))
}
