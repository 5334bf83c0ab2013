//! Error types for the voting engine.
//!
//! Every variant is a local validation failure: it aborts only the single
//! vote or command that triggered it and leaves session state untouched.

use crate::participant::ParticipantId;
use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A vote or force-advance targeted a participant outside the current
    /// active candidate pool.
    #[error("{0} is not an active candidate")]
    NotActiveCandidate(ParticipantId),

    /// The referenced participant is not a member of this session.
    #[error("{0} is not a member of this session")]
    NotMember(ParticipantId),

    /// A vote was rejected while the session is paused.
    #[error("session is paused")]
    SessionPaused,

    /// Pause requested on an already-paused session.
    #[error("session is already paused")]
    AlreadyPaused,

    /// Resume requested on a session that is not paused.
    #[error("session is not paused")]
    NotPaused,

    /// A mutating operation was attempted on a completed or terminated
    /// session.
    #[error("session is no longer active")]
    AlreadyCompleted,

    /// A membership change was rejected (duplicate add, unknown removal,
    /// group-size bounds, or a facilitator constraint).
    #[error("invalid membership change: {0}")]
    InvalidMembership(String),
}
