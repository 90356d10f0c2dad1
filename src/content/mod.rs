//! Rotating content catalogs and multi-day lesson series
//!
//! Two selection strategies feed the scheduled posts:
//!
//! - [`ContentRotator::pick`] draws randomly from a catalog while avoiding the
//!   last few picks, so a short catalog does not repeat itself day after day.
//! - [`SeriesCursor::next`] walks a lesson series in order and wraps around.
//!
//! Both are plain in-memory state owned by the caller; nothing here touches
//! the clock or the network.

pub mod catalog;
pub mod rotator;
pub mod series;

pub use catalog::{Catalog, Lesson};
pub use rotator::{ContentRotator, RotationState};
pub use series::SeriesCursor;

use thiserror::Error;

/// Content selection errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    /// A catalog or series has no entries
    #[error("Catalog '{0}' is empty")]
    EmptyCatalog(String),
}

/// Result type alias for content operations
pub type ContentResult<T> = std::result::Result<T, ContentError>;
