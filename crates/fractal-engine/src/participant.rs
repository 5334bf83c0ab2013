//! Participant and session identity references.
//!
//! Identities are opaque: the caller (typically a chat-platform boundary
//! layer) owns resolution, display, and permissions. The engine only ever
//! compares and stores them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque participant identifier supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantId(pub u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Opaque session identifier, unique per live voting group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Identity reference for one group member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Caller-supplied identifier.
    pub id: ParticipantId,
    /// Caller-supplied display name, carried through rankings and exports.
    pub display_name: String,
}

impl Participant {
    /// Create a participant reference.
    pub fn new(id: u64, display_name: impl Into<String>) -> Self {
        Self {
            id: ParticipantId(id),
            display_name: display_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats() {
        assert_eq!(ParticipantId(7).to_string(), "p7");
        assert_eq!(SessionId(42).to_string(), "s42");
    }

    #[test]
    fn participant_construction() {
        let p = Participant::new(1, "alice");
        assert_eq!(p.id, ParticipantId(1));
        assert_eq!(p.display_name, "alice");
    }
}
