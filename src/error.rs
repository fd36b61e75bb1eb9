use thiserror::Error;

/// Errors raised when external input cannot be turned into engine state.
///
/// Interactive operations never return these: they are silent no-ops.
/// Only constructors that validate collaborator data do.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LiveWireError {
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("invalid polygon: {0}")]
    InvalidPolygon(String),
}
