//! Broadcast fan-out for session events.
//!
//! Bridges the engine's synchronous [`NotificationPort`] into a tokio
//! broadcast channel so transport adapters (chat rendering, websockets,
//! archivers) can subscribe without ever blocking the voting path. Sends
//! never block; with no live subscriber the event is simply dropped.

use fractal_engine::{
    NextRound, NotificationPort, NotifyResult, ParticipantId, RankedPlace, SessionId,
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Session lifecycle events, serializable for downstream consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// A session opened its first round (also emitted on restart).
    SessionStarted {
        session: SessionId,
        level: u32,
        candidates: Vec<ParticipantId>,
        threshold: usize,
    },

    /// A vote was accepted; `previous` is set when it replaced an
    /// earlier choice.
    VoteCast {
        session: SessionId,
        voter: ParticipantId,
        candidate: ParticipantId,
        previous: Option<ParticipantId>,
    },

    /// A tie at the maximum count was broken at random.
    TieBreak {
        session: SessionId,
        tied: Vec<ParticipantId>,
        chosen: ParticipantId,
    },

    /// A round resolved; `next` is absent when the session completes.
    RoundComplete {
        session: SessionId,
        level: u32,
        winner: ParticipantId,
        next: Option<NextRound>,
    },

    /// The session produced its final ranking.
    SessionComplete {
        session: SessionId,
        ranking: Vec<RankedPlace>,
    },
}

impl SessionEvent {
    /// The session this event belongs to.
    pub fn session(&self) -> SessionId {
        match self {
            SessionEvent::SessionStarted { session, .. } => *session,
            SessionEvent::VoteCast { session, .. } => *session,
            SessionEvent::TieBreak { session, .. } => *session,
            SessionEvent::RoundComplete { session, .. } => *session,
            SessionEvent::SessionComplete { session, .. } => *session,
        }
    }
}

/// [`NotificationPort`] adapter that fans events into a broadcast channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: broadcast::Sender<SessionEvent>,
}

impl ChannelNotifier {
    /// Create a notifier buffering up to `capacity` undelivered events
    /// per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    fn publish(&self, event: SessionEvent) -> NotifyResult {
        // No subscribers is not a failure; the stream is best-effort.
        let _ = self.tx.send(event);
        Ok(())
    }
}

impl NotificationPort for ChannelNotifier {
    fn on_session_started(
        &self,
        session: SessionId,
        level: u32,
        candidates: &[ParticipantId],
        threshold: usize,
    ) -> NotifyResult {
        self.publish(SessionEvent::SessionStarted {
            session,
            level,
            candidates: candidates.to_vec(),
            threshold,
        })
    }

    fn on_vote_cast(
        &self,
        session: SessionId,
        voter: ParticipantId,
        candidate: ParticipantId,
        previous: Option<ParticipantId>,
    ) -> NotifyResult {
        self.publish(SessionEvent::VoteCast {
            session,
            voter,
            candidate,
            previous,
        })
    }

    fn on_tie_break(
        &self,
        session: SessionId,
        tied: &[ParticipantId],
        chosen: ParticipantId,
    ) -> NotifyResult {
        self.publish(SessionEvent::TieBreak {
            session,
            tied: tied.to_vec(),
            chosen,
        })
    }

    fn on_round_complete(
        &self,
        session: SessionId,
        level: u32,
        winner: ParticipantId,
        next: Option<&NextRound>,
    ) -> NotifyResult {
        self.publish(SessionEvent::RoundComplete {
            session,
            level,
            winner,
            next: next.cloned(),
        })
    }

    fn on_session_complete(&self, session: SessionId, ranking: &[RankedPlace]) -> NotifyResult {
        self.publish(SessionEvent::SessionComplete {
            session,
            ranking: ranking.to_vec(),
        })
    }
}
