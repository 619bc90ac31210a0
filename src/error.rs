//! Error types for the OGP renderer

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for renderer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while preparing or rendering an image
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to launch the browser or open a page
    #[error("Engine initialization failed: {0}")]
    InitializationError(String),

    /// Failed to load the composed document into the page
    #[error("Failed to load content: {0}")]
    LoadError(String),

    /// Failed to capture the screenshot
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// Operation timed out
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// A static asset could not be read at startup
    #[error("Failed to read asset {path:?}: {source}")]
    Asset {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic error
    #[error("{0}")]
    Other(String),
}
