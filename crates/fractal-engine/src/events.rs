//! Notification surface toward the chat-platform layer.
//!
//! The engine never renders UI: threads, buttons, embeds, and voice
//! announcements all live behind this port. Delivery is fire-and-forget:
//! a failed delivery is logged and dropped, never rolled back into the
//! state transition that produced it. Implementations must not block the
//! calling thread; queue slow I/O internally and return.

use crate::participant::{ParticipantId, SessionId};
use crate::session::RankedPlace;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Delivery failure reported by a [`NotificationPort`] implementation.
#[derive(Debug, Clone, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Result type for notification delivery.
pub type NotifyResult = std::result::Result<(), NotifyError>;

/// Candidate list and threshold for a newly opened round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextRound {
    /// Level now being voted on.
    pub level: u32,
    /// Candidates still in the pool.
    pub candidates: Vec<ParticipantId>,
    /// Votes required to win the round outright.
    pub threshold: usize,
}

/// Events the engine pushes out to the boundary layer.
pub trait NotificationPort: Send + Sync {
    /// A session opened its first round (also emitted on restart).
    fn on_session_started(
        &self,
        session: SessionId,
        level: u32,
        candidates: &[ParticipantId],
        threshold: usize,
    ) -> NotifyResult;

    /// A vote was accepted. `previous` carries the replaced choice when
    /// the voter changed an existing vote.
    fn on_vote_cast(
        &self,
        session: SessionId,
        voter: ParticipantId,
        candidate: ParticipantId,
        previous: Option<ParticipantId>,
    ) -> NotifyResult;

    /// A tie at the maximum vote count was broken at random; emitted
    /// before the round advances.
    fn on_tie_break(
        &self,
        session: SessionId,
        tied: &[ParticipantId],
        chosen: ParticipantId,
    ) -> NotifyResult;

    /// A round resolved. `next` is `None` when the session completes
    /// instead of opening another round.
    fn on_round_complete(
        &self,
        session: SessionId,
        level: u32,
        winner: ParticipantId,
        next: Option<&NextRound>,
    ) -> NotifyResult;

    /// The session produced its final ranking.
    fn on_session_complete(&self, session: SessionId, ranking: &[RankedPlace]) -> NotifyResult;
}

/// Port that drops every event.
///
/// Default for sessions constructed without a boundary layer attached
/// (tests, simulations).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl NotificationPort for NullNotifier {
    fn on_session_started(
        &self,
        _: SessionId,
        _: u32,
        _: &[ParticipantId],
        _: usize,
    ) -> NotifyResult {
        Ok(())
    }

    fn on_vote_cast(
        &self,
        _: SessionId,
        _: ParticipantId,
        _: ParticipantId,
        _: Option<ParticipantId>,
    ) -> NotifyResult {
        Ok(())
    }

    fn on_tie_break(&self, _: SessionId, _: &[ParticipantId], _: ParticipantId) -> NotifyResult {
        Ok(())
    }

    fn on_round_complete(
        &self,
        _: SessionId,
        _: u32,
        _: ParticipantId,
        _: Option<&NextRound>,
    ) -> NotifyResult {
        Ok(())
    }

    fn on_session_complete(&self, _: SessionId, _: &[RankedPlace]) -> NotifyResult {
        Ok(())
    }
}
