//! Error types for xmlunit.

use thiserror::Error;

/// Result type alias for xmlunit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or comparing documents.
///
/// Comparison outcomes are never errors; they are reported through
/// [`ComparisonResult`](crate::ComparisonResult) values and listeners.
#[derive(Error, Debug)]
pub enum Error {
    /// XML parse error.
    #[error("XML parse error: {0}")]
    Parse(String),

    /// A required argument was missing or unusable.
    #[error("invalid argument: {0} must not be empty")]
    InvalidArgument(&'static str),

    /// The XPath tracker was asked for a step that was never registered.
    #[error("XPath navigation error: {0}")]
    XPathNavigation(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML error from quick-xml.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
}
