//! Relay error kinds and error value helpers.
//!
//! ```rust
//! use grelay::RelayError;
//!
//! let rejected = RelayError::upstream_rejected("server error");
//! assert!(!rejected.retryable);
//!
//! let dropped = RelayError::stream("connection reset");
//! assert!(dropped.retryable);
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayErrorKind {
    Authentication,
    RateLimited,
    InvalidRequest,
    Timeout,
    Unavailable,
    UpstreamRejected,
    Stream,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayError {
    pub kind: RelayErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl RelayError {
    pub fn new(kind: RelayErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(RelayErrorKind::Authentication, message, false)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(RelayErrorKind::RateLimited, message, true)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(RelayErrorKind::InvalidRequest, message, false)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(RelayErrorKind::Timeout, message, true)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(RelayErrorKind::Unavailable, message, true)
    }

    /// Connect-time rejection: the upstream answered with a non-success
    /// status before any streaming began.
    pub fn upstream_rejected(message: impl Into<String>) -> Self {
        Self::new(RelayErrorKind::UpstreamRejected, message, false)
    }

    /// Mid-stream failure: dropped connection, malformed event, or an
    /// upstream that closed without the terminal sentinel.
    pub fn stream(message: impl Into<String>) -> Self {
        Self::new(RelayErrorKind::Stream, message, true)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(RelayErrorKind::Cancelled, message, false)
    }
}

impl Display for RelayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for RelayError {}
