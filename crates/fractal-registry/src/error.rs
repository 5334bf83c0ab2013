//! Error types for the session registry.

use fractal_engine::SessionId;
use thiserror::Error;

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur at the registry surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Operation referenced an unknown or already-discarded session.
    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    /// A session with this id is already live.
    #[error("session {0} already exists")]
    SessionExists(SessionId),

    /// The session rejected the command.
    #[error(transparent)]
    Session(#[from] fractal_engine::Error),
}
