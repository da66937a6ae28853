//! Error types for the chart rendering pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while rendering a chart
///
/// `Validation` is the only client-side error and is always raised before any
/// rendering session exists. Every other variant is a server-side failure; the
/// pipeline releases an acquired session before propagating any of them.
#[derive(Error, Debug)]
pub enum Error {
    /// Request did not normalize into a valid chart spec
    #[error("Invalid chart request: {0}")]
    Validation(String),

    /// The headless rendering engine failed to start or operate
    #[error("Rendering engine failure: {0}")]
    Infrastructure(String),

    /// The readiness predicate never held within the deadline
    #[error("Chart did not finish rendering within {0}ms")]
    RenderTimeout(u64),

    /// Snapshot was truncated or is not a PNG
    #[error("Capture failed: {0}")]
    Capture(String),

    /// Base64 encoding produced malformed output
    #[error("Encoding failed: {0}")]
    Encoding(String),
}

impl Error {
    /// Whether the failure is the caller's fault (bad input shape).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_is_client_error() {
        assert!(Error::Validation("bad".into()).is_client_error());
        assert!(!Error::RenderTimeout(5000).is_client_error());
        assert!(!Error::Capture("short".into()).is_client_error());
    }

    #[test]
    fn timeout_message_includes_deadline() {
        let msg = Error::RenderTimeout(8000).to_string();
        assert!(msg.contains("8000ms"));
    }
}
