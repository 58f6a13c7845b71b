//! Shared provider error kinds and error value helpers.
//!
//! ```rust
//! use cprovider::ProviderError;
//!
//! let auth = ProviderError::authentication("bad key");
//! assert!(!auth.is_transport_fault());
//!
//! let timeout = ProviderError::timeout("socket timed out");
//! assert!(timeout.is_transport_fault());
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    Authentication,
    RateLimited,
    InvalidRequest,
    Timeout,
    Transport,
    Unavailable,
    Protocol,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Authentication, message, false)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::RateLimited, message, true)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::InvalidRequest, message, false)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, message, true)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Transport, message, true)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unavailable, message, true)
    }

    /// Malformed payload from the provider (bad JSON, broken SSE frame).
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Protocol, message, false)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Other, message, false)
    }

    /// Faults raised while establishing or consuming a response; these are the retry candidates.
    pub fn is_transport_fault(&self) -> bool {
        self.retryable
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ProviderError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_assign_retryability_by_kind() {
        assert!(ProviderError::transport("reset").retryable);
        assert!(ProviderError::rate_limited("slow down").retryable);
        assert!(ProviderError::unavailable("503").retryable);
        assert!(!ProviderError::invalid_request("bad").retryable);
        assert!(!ProviderError::protocol("garbled").retryable);
    }

    #[test]
    fn display_includes_kind_and_message() {
        let error = ProviderError::timeout("deadline exceeded");
        assert_eq!(error.to_string(), "Timeout: deadline exceeded");
    }
}
