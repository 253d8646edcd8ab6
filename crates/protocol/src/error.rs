use thiserror::Error;

use crate::types::EntityId;

/// Errors surfaced by host service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A fault raised by the host platform, passed through verbatim.
    #[error("organization service fault: {0}")]
    Fault(String),

    #[error("{entity_name} {id} was not found")]
    NotFound { entity_name: String, id: EntityId },

    /// The host answered an execute request with a response of the wrong
    /// shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("unsupported request: {0}")]
    Unsupported(String),
}

/// Result type alias for host service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
