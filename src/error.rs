//! Error types for street extraction.

use thiserror::Error;

/// Errors that abort an extraction run.
///
/// Resolver failures are not represented here: a resolver maps them to
/// [`Street::Unknown`](crate::Street::Unknown) before they reach the core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// A configuration option is outside its documented range.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Points arrived with a non-increasing index.
    #[error("track points out of order: index {current} follows index {previous}")]
    SequenceOrder { previous: u32, current: u32 },

    /// The HTTP resolver could not be set up.
    #[error("HTTP resolver setup failed: {0}")]
    Http(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ExtractError>;
