//! Keyed collection of live voting sessions.
//!
//! One registry owns every live [`Session`]; sessions are exclusively
//! reachable through it. Each session sits behind its own
//! `tokio::sync::Mutex`, so votes and administrative commands serialize
//! per session while independent sessions run fully concurrently. The
//! outer map lock is only held for lookups and insert/remove, never
//! across a session command.
//!
//! Authorization is the boundary layer's job: every command arriving
//! here is assumed pre-authorized.

use std::collections::HashMap;
use std::sync::Arc;

use fractal_engine::{
    EntropyTieBreaker, NotificationPort, NullNotifier, Participant, ParticipantId, RoundOutcome,
    Session, SessionConfig, SessionId, SessionStatus, TieBreaker, VoteOutcome,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::snapshot::ExportSnapshot;

/// Aggregate totals across all live sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub active_sessions: usize,
    pub paused_sessions: usize,
    pub total_participants: usize,
    pub total_votes_cast: usize,
}

/// Registry of live sessions, keyed by session id.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<Session>>>>,
    config: SessionConfig,
    notifier: Arc<dyn NotificationPort>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(SessionConfig::default(), Arc::new(NullNotifier))
    }
}

impl SessionRegistry {
    /// Create a registry; every session it spawns shares `notifier`.
    pub fn new(config: SessionConfig, notifier: Arc<dyn NotificationPort>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
            notifier,
        }
    }

    /// Start a session over `members` with `facilitator` in charge.
    ///
    /// A single-member group completes during start and never goes live
    /// in the map; its ranking travels through the notifier.
    pub async fn create(
        &self,
        id: SessionId,
        members: Vec<Participant>,
        facilitator: ParticipantId,
    ) -> Result<()> {
        self.create_with(id, members, facilitator, Box::new(EntropyTieBreaker::new()))
            .await
    }

    /// Start a session with an explicit tie-break randomness source.
    pub async fn create_with(
        &self,
        id: SessionId,
        members: Vec<Participant>,
        facilitator: ParticipantId,
        tie_breaker: Box<dyn TieBreaker>,
    ) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&id) {
            return Err(Error::SessionExists(id));
        }

        let mut session = Session::new(id, members, facilitator, self.config.clone())?
            .with_notifier(Arc::clone(&self.notifier))
            .with_tie_breaker(tie_breaker);
        session.start()?;

        if session.is_active() {
            info!(session = %id, "session registered");
            sessions.insert(id, Arc::new(Mutex::new(session)));
        }
        Ok(())
    }

    /// Record a vote; a resolution may advance or complete the session.
    pub async fn cast_vote(
        &self,
        id: SessionId,
        voter: ParticipantId,
        candidate: ParticipantId,
    ) -> Result<VoteOutcome> {
        self.with_session(id, |s| s.cast_vote(voter, candidate)).await
    }

    /// Advance the round to `winner`, bypassing the threshold.
    pub async fn force_advance(&self, id: SessionId, winner: ParticipantId) -> Result<RoundOutcome> {
        self.with_session(id, |s| s.force_advance(winner)).await
    }

    /// Alias of [`force_advance`](Self::force_advance).
    pub async fn declare_winner(&self, id: SessionId, winner: ParticipantId) -> Result<RoundOutcome> {
        self.force_advance(id, winner).await
    }

    /// Resolve the round from the tally as it stands.
    pub async fn force_resolve(&self, id: SessionId) -> Result<RoundOutcome> {
        self.with_session(id, |s| s.force_resolve()).await
    }

    /// Clear the current round's votes; level and pool are untouched.
    /// Returns the number of votes dropped.
    pub async fn reset_votes(&self, id: SessionId) -> Result<usize> {
        self.with_session(id, |s| s.reset_votes()).await
    }

    /// Suspend vote acceptance.
    pub async fn pause(&self, id: SessionId) -> Result<()> {
        self.with_session(id, |s| s.pause()).await
    }

    /// Resume vote acceptance.
    pub async fn resume(&self, id: SessionId) -> Result<()> {
        self.with_session(id, |s| s.resume()).await
    }

    /// Reset the session to the top level with full current membership.
    pub async fn restart(&self, id: SessionId) -> Result<()> {
        self.with_session(id, |s| s.restart()).await
    }

    /// Add a participant to membership and the active pool.
    pub async fn add_member(&self, id: SessionId, participant: Participant) -> Result<()> {
        self.with_session(id, |s| s.add_member(participant)).await
    }

    /// Remove a participant, purging their ledger entries. May complete
    /// the session if a single candidate remains.
    pub async fn remove_member(&self, id: SessionId, participant: ParticipantId) -> Result<()> {
        self.with_session(id, |s| s.remove_member(participant)).await
    }

    /// Reassign the facilitator role.
    pub async fn change_facilitator(
        &self,
        id: SessionId,
        new_facilitator: ParticipantId,
    ) -> Result<()> {
        self.with_session(id, |s| s.change_facilitator(new_facilitator))
            .await
    }

    /// Discard a session without computing a ranking.
    ///
    /// The entry leaves the map before the session is marked, so later
    /// lookups fail with `SessionNotFound` and commands already holding
    /// the handle fail their active check.
    pub async fn terminate(&self, id: SessionId) -> Result<()> {
        let handle = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or(Error::SessionNotFound(id))?;
        handle.lock().await.terminate();
        Ok(())
    }

    /// Status of one session.
    pub async fn status(&self, id: SessionId) -> Result<SessionStatus> {
        let handle = self.handle(id).await?;
        let session = handle.lock().await;
        Ok(session.status())
    }

    /// Status of every live session, ordered by id.
    pub async fn list(&self) -> Vec<SessionStatus> {
        let handles: Vec<_> = self.sessions.read().await.values().cloned().collect();
        let mut statuses = Vec::with_capacity(handles.len());
        for handle in handles {
            statuses.push(handle.lock().await.status());
        }
        statuses.sort_by_key(|s| s.id);
        statuses
    }

    /// Aggregate totals across all live sessions.
    pub async fn stats(&self) -> RegistryStats {
        let statuses = self.list().await;
        RegistryStats {
            active_sessions: statuses.len(),
            paused_sessions: statuses.iter().filter(|s| s.paused).count(),
            total_participants: statuses.iter().map(|s| s.member_count).sum(),
            total_votes_cast: statuses.iter().map(|s| s.votes_cast).sum(),
        }
    }

    /// Archival snapshot of one session (`Some(id)`) or all live sessions
    /// (`None`), ordered by id.
    pub async fn export(&self, id: Option<SessionId>) -> Result<ExportSnapshot> {
        let snapshots = match id {
            Some(id) => {
                let handle = self.handle(id).await?;
                let session = handle.lock().await;
                vec![session.snapshot()]
            }
            None => {
                let handles: Vec<_> = self.sessions.read().await.values().cloned().collect();
                let mut snapshots = Vec::with_capacity(handles.len());
                for handle in handles {
                    snapshots.push(handle.lock().await.snapshot());
                }
                snapshots.sort_by_key(|s| s.id);
                snapshots
            }
        };
        Ok(ExportSnapshot::new(snapshots))
    }

    /// Whether a session with this id is live.
    pub async fn contains(&self, id: SessionId) -> bool {
        self.sessions.read().await.contains_key(&id)
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Check if no sessions are live.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    async fn handle(&self, id: SessionId) -> Result<Arc<Mutex<Session>>> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(Error::SessionNotFound(id))
    }

    /// Run a command under the session's lock; if the command completed
    /// the session, drop it from the map afterward.
    async fn with_session<T>(
        &self,
        id: SessionId,
        command: impl FnOnce(&mut Session) -> fractal_engine::Result<T>,
    ) -> Result<T> {
        let handle = self.handle(id).await?;
        let mut session = handle.lock().await;
        let result = command(&mut session);
        let finished = !session.is_active();
        drop(session);

        if finished {
            debug!(session = %id, "session finished, dropping from registry");
            self.sessions.write().await.remove(&id);
        }
        Ok(result?)
    }
}
