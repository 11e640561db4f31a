//! Error types for science-program document operations.

use crate::program::NodeId;

/// Result type for document-model operations
pub type MsbResult<T> = Result<T, MsbError>;

/// Error type for document-model operations.
///
/// All variants are fatal: the operation that detected the problem aborts
/// and no partial result is returned. Clamping of count attributes is not
/// an error and is handled silently by the lifecycle code.
#[derive(Debug, thiserror::Error)]
pub enum MsbError {
    #[error("Unresolved reference id: {0}")]
    UnresolvedReference(String),

    #[error("Observation contains no observe iterators")]
    MissingObserve,

    #[error("Unrecognised coordinate frame: {0}")]
    UnknownCoordFrame(String),

    #[error("Unsupported target type: {0}")]
    UnsupportedTarget(String),

    #[error("Observations span multiple telescopes: {0} and {1}")]
    TelescopeMismatch(String, String),

    #[error("Unknown node kind: {0}")]
    UnknownNodeKind(String),

    #[error("Node {0} is not a schedulable block")]
    NotAnMsb(NodeId),
}
