//! Unified error handling for the pulsecast crate
//!
//! Domain modules define their own error enums. [`Error`] wraps the ones that
//! cross into the content engine, so composing a post has a single error type.
//!
//! # Propagation
//!
//! Fetch errors stop at the provider chain (the synthetic fallback absorbs
//! them), delivery errors are folded into a [`DeliveryStatus`], and
//! scheduler errors are configuration errors reported by the binary at
//! startup. What remains for a post is an empty catalog or a template
//! failure.
//!
//! [`DeliveryStatus`]: crate::delivery::DeliveryStatus

use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::content::ContentError;
pub use crate::delivery::ChannelError;
pub use crate::providers::FetchError;
pub use crate::render::RenderError;
pub use crate::scheduler::SchedulerError;

/// Errors raised while composing a post
#[derive(Error, Debug)]
pub enum Error {
    /// Content catalog errors
    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    /// Template rendering errors
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraps_content_error() {
        let err = Error::from(ContentError::EmptyCatalog("quotes".to_string()));
        assert!(matches!(err, Error::Content(_)));
        assert!(err.to_string().starts_with("Content error:"));
        assert!(err.to_string().contains("quotes"));
    }

    #[test]
    fn test_wraps_render_error() {
        let err = Error::from(RenderError::Render {
            name: "breaking".to_string(),
            reason: "missing field".to_string(),
        });
        assert!(matches!(err, Error::Render(_)));
        assert_eq!(
            err.to_string(),
            "Render error: Rendering 'breaking' failed: missing field"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
