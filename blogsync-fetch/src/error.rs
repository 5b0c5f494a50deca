//! Error types for blogsync-fetch.

use std::fmt;

use thiserror::Error;

use blogsync_core::FallbackReason;

/// Why a request failed, as classified by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCause {
    Timeout,
    Dns,
    Refused,
    Other,
}

impl FailureCause {
    /// Worth retrying: the same request may succeed moments later.
    pub fn is_transient(self) -> bool {
        !matches!(self, FailureCause::Other)
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::Timeout => write!(f, "timeout"),
            FailureCause::Dns => write!(f, "dns"),
            FailureCause::Refused => write!(f, "refused"),
            FailureCause::Other => write!(f, "other"),
        }
    }
}

/// A single failed HTTP exchange.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request never produced an HTTP response.
    #[error("{cause} failure requesting {url}: {detail}")]
    Network {
        url: String,
        cause: FailureCause,
        detail: String,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// The response body could not be read.
    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

impl TransportError {
    pub fn cause(&self) -> FailureCause {
        match self {
            TransportError::Network { cause, .. } => *cause,
            TransportError::Body { source, .. }
                if matches!(
                    source.kind(),
                    std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
                ) =>
            {
                FailureCause::Timeout
            }
            TransportError::Status { .. } | TransportError::Body { .. } => FailureCause::Other,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.cause().is_transient()
    }
}

/// All errors that can arise from a fetch, after retries.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Retries exhausted, or the failure was not retryable.
    #[error("content source unavailable after {attempts} attempt(s): {source}")]
    Unavailable {
        attempts: u32,
        #[source]
        source: TransportError,
    },

    /// The remote answered but the JSON did not match the expected shape.
    #[error("invalid response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// HTTP status when the remote answered with a non-success code.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Unavailable {
                source: TransportError::Status { status, .. },
                ..
            } => Some(*status),
            _ => None,
        }
    }

    /// Fallback tier this failure is reported under.
    pub fn fallback_reason(&self) -> FallbackReason {
        match self {
            FetchError::Unavailable { .. } => FallbackReason::FetchUnavailable,
            FetchError::Decode { .. } => FallbackReason::InvalidResponse,
        }
    }
}
