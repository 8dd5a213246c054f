//! Error types for presentation component extraction.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading a package or parsing one component.
///
/// Only package loading surfaces these to callers; everything that happens
/// while parsing an individual shape is turned into a diagnostic instead.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read the input file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// ZIP archive error.
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// A JSON document tree could not be decoded.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The tree has a scalar where an element was required.
    #[error("Malformed document tree: {0}")]
    MalformedTree(String),

    /// A referenced package part does not exist.
    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// Image bytes do not start with the expected signature or are too short.
    #[error("Invalid image data: {0}")]
    InvalidImage(String),

    /// No JPEG start-of-frame marker before the start-of-scan marker.
    #[error("JPEG start-of-frame marker not found")]
    SofNotFound,
}
