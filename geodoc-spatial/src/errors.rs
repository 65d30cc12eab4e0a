//! Error and result types for the spatial subsystem.

use std::io;
use thiserror::Error;

/// Errors that can occur in the geometry cache, spatial indexes,
/// snapshot codec or curve linearizer.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// Invalid configuration value, e.g. a zero cache capacity or a
    /// store name that does not follow the three-digit suffix convention.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A named index was built a second time without removing it first.
    #[error("Spatial index '{0}' is already built")]
    AlreadyBuilt(String),

    /// The codec or linearizer met a geometry/segment variant it cannot
    /// handle. Fatal for the enclosing operation.
    #[error("Unsupported variant: {0}")]
    UnsupportedVariant(String),

    /// A snapshot reader was consulted in an order the wire format does
    /// not allow, e.g. resolving positions before the reference section.
    #[error("Invalid snapshot state: {0}")]
    State(String),

    /// Truncated or otherwise unreadable snapshot stream.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Node resolution against the document store failed.
    #[error("Node resolution failed: {0}")]
    Resolve(String),
}

impl SpatialError {
    /// Shorthand for a corrupt-stream error carrying an explanation.
    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        SpatialError::Io(io::Error::new(io::ErrorKind::InvalidData, msg.into()))
    }
}

/// Result type for spatial operations.
pub type SpatialResult<T> = Result<T, SpatialError>;
