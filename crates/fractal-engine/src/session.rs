//! The round-elimination state machine.
//!
//! One [`Session`] owns the voting state for a single group: current
//! level, active candidate pool, vote ledger, and recorded winners.
//! Levels count down from a configured top level; each resolved round
//! records exactly one winner and removes them from the pool, until a
//! full strict ranking exists.
//!
//! # Resolution
//!
//! The threshold check runs in the same call that mutates the ledger:
//! `cast_vote` writes the vote, emits the vote event, and immediately
//! evaluates the tally against the absolute-majority threshold over total
//! membership. A tie among candidates at the maximum count is broken by
//! uniform random selection through an injectable [`TieBreaker`].
//!
//! # Concurrency
//!
//! A session is single-threaded by construction: every mutating method
//! takes `&mut self`, so no other mutation can interleave between the
//! ledger write and its resolution check. Callers that share a session
//! across tasks must serialize commands through their own lock or
//! channel; independent sessions never share state.
//!
//! # Pausing
//!
//! Pausing rejects new votes up front. Because resolution only ever runs
//! as the tail of a successful vote or an admin force operation, pausing
//! freezes resolution as well; the admin overrides (`force_advance`,
//! `force_resolve`, `reset_votes`, `restart`) remain available while
//! paused.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use fractal_ranking::{meets_threshold, vote_threshold, RankingTable};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::events::{NextRound, NotificationPort, NotifyResult, NullNotifier};
use crate::ledger::VoteLedger;
use crate::participant::{Participant, ParticipantId, SessionId};
use crate::tiebreak::{EntropyTieBreaker, TieBreaker};

/// Lowest level that is still voted on; the descent stops below it.
pub const TERMINAL_LEVEL: u32 = 1;

/// Tunables for one voting session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Level the first round is voted at.
    pub starting_level: u32,
    /// Smallest membership a session may be shrunk to by removal.
    pub min_members: usize,
    /// Largest membership accepted at creation or by `add_member`.
    pub max_members: usize,
    /// Respect points per final-ranking position.
    pub ranking: RankingTable,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            starting_level: 6,
            min_members: 2,
            max_members: 6,
            ranking: RankingTable::default(),
        }
    }
}

impl SessionConfig {
    /// Set the level the first round is voted at.
    #[must_use]
    pub fn with_starting_level(mut self, level: u32) -> Self {
        self.starting_level = level.max(TERMINAL_LEVEL);
        self
    }

    /// Set the group-size bounds.
    #[must_use]
    pub fn with_member_bounds(mut self, min: usize, max: usize) -> Self {
        self.min_members = min;
        self.max_members = max;
        self
    }

    /// Set the respect-point table.
    #[must_use]
    pub fn with_ranking(mut self, ranking: RankingTable) -> Self {
        self.ranking = ranking;
        self
    }
}

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Accepting votes for the current level.
    Voting,
    /// Full ranking produced; the session no longer mutates.
    Completed,
    /// Discarded by an administrator without a ranking.
    Terminated,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Voting => write!(f, "Voting"),
            Self::Completed => write!(f, "Completed"),
            Self::Terminated => write!(f, "Terminated"),
        }
    }
}

/// What a single accepted vote did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteOutcome {
    /// Candidate the voter had previously chosen, if this was a change.
    pub previous: Option<ParticipantId>,
    /// Round resolution triggered by this vote, if any.
    pub resolution: Option<RoundOutcome>,
}

/// Computed result of a resolved round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    /// Level that was vacated.
    pub level: u32,
    /// Participant recorded as the level's winner.
    pub winner: ParticipantId,
    /// Tally snapshot at resolution, descending count.
    pub tally: Vec<(ParticipantId, usize)>,
    /// Whether the winner came out of a random tie-break.
    pub was_tie: bool,
}

/// One place in the final ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedPlace {
    /// 0-indexed finishing position.
    pub position: usize,
    /// The ranked participant.
    pub participant: Participant,
    /// Level this participant won (or was auto-ranked at).
    pub level: u32,
    /// Respect points earned by the position.
    pub respect: u64,
}

/// Point-in-time view of a session for status queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    pub id: SessionId,
    pub phase: SessionPhase,
    pub level: u32,
    pub paused: bool,
    pub facilitator: ParticipantId,
    pub member_count: usize,
    pub active_candidates: Vec<ParticipantId>,
    pub votes_cast: usize,
    pub threshold: usize,
    pub tally: Vec<(ParticipantId, usize)>,
    /// Recorded winners, descending level.
    pub winners: Vec<(u32, ParticipantId)>,
}

/// Serializable archival snapshot of one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub phase: SessionPhase,
    pub level: u32,
    pub paused: bool,
    pub facilitator: ParticipantId,
    pub members: Vec<Participant>,
    pub active_candidates: Vec<ParticipantId>,
    /// (voter, candidate) entries, sorted by voter.
    pub votes: Vec<(ParticipantId, ParticipantId)>,
    /// Recorded winners, descending level.
    pub winners: Vec<(u32, ParticipantId)>,
    pub final_ranking: Option<Vec<RankedPlace>>,
}

/// One run of round-elimination voting for a fixed group.
pub struct Session {
    id: SessionId,
    config: SessionConfig,
    /// Every participant ever admitted, kept for display-name lookups
    /// even after removal.
    roster: HashMap<ParticipantId, Participant>,
    /// Current membership, in join order.
    members: Vec<ParticipantId>,
    facilitator: ParticipantId,
    /// Candidates not yet declared a round winner.
    active_candidates: Vec<ParticipantId>,
    ledger: VoteLedger,
    /// Level → winner, append-only between restarts.
    winners: BTreeMap<u32, ParticipantId>,
    current_level: u32,
    paused: bool,
    phase: SessionPhase,
    final_ranking: Option<Vec<RankedPlace>>,
    tie_breaker: Box<dyn TieBreaker>,
    notifier: Arc<dyn NotificationPort>,
}

impl Session {
    /// Create a session over `members` with `facilitator` in charge.
    ///
    /// Call [`start()`](Self::start) once afterward to emit the opening
    /// notification; a single-member group completes immediately there.
    pub fn new(
        id: SessionId,
        members: Vec<Participant>,
        facilitator: ParticipantId,
        config: SessionConfig,
    ) -> Result<Self> {
        if members.is_empty() {
            return Err(Error::InvalidMembership(
                "a session needs at least one member".into(),
            ));
        }
        if members.len() > config.max_members {
            return Err(Error::InvalidMembership(format!(
                "group is limited to {} members",
                config.max_members
            )));
        }

        let mut roster = HashMap::new();
        let mut member_ids = Vec::with_capacity(members.len());
        for participant in members {
            let pid = participant.id;
            if roster.insert(pid, participant).is_some() {
                return Err(Error::InvalidMembership(format!("duplicate member {pid}")));
            }
            member_ids.push(pid);
        }
        if !member_ids.contains(&facilitator) {
            return Err(Error::InvalidMembership(format!(
                "facilitator {facilitator} must be a member"
            )));
        }

        let starting_level = config.starting_level.max(TERMINAL_LEVEL);
        Ok(Self {
            id,
            active_candidates: member_ids.clone(),
            members: member_ids,
            roster,
            facilitator,
            ledger: VoteLedger::new(),
            winners: BTreeMap::new(),
            current_level: starting_level,
            paused: false,
            phase: SessionPhase::Voting,
            final_ranking: None,
            config: SessionConfig {
                starting_level,
                ..config
            },
            tie_breaker: Box::new(EntropyTieBreaker::new()),
            notifier: Arc::new(NullNotifier),
        })
    }

    /// Replace the notification port (defaults to [`NullNotifier`]).
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationPort>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Replace the tie-break randomness source.
    #[must_use]
    pub fn with_tie_breaker(mut self, tie_breaker: Box<dyn TieBreaker>) -> Self {
        self.tie_breaker = tie_breaker;
        self
    }

    /// Open the first round.
    ///
    /// A pool of one candidate completes immediately with a single-member
    /// ranking instead of opening a vote.
    pub fn start(&mut self) -> Result<()> {
        self.ensure_active()?;

        info!(
            session = %self.id,
            members = self.members.len(),
            level = self.current_level,
            "session started"
        );
        self.emit(self.notifier.on_session_started(
            self.id,
            self.current_level,
            &self.active_candidates,
            self.threshold(),
        ));

        if self.active_candidates.len() <= 1 {
            self.complete();
        }
        Ok(())
    }

    /// Record `voter`'s vote for `candidate` and evaluate resolution.
    ///
    /// Voting again is a legal overwrite; the returned outcome carries
    /// the replaced choice and any round resolution this vote caused.
    pub fn cast_vote(&mut self, voter: ParticipantId, candidate: ParticipantId) -> Result<VoteOutcome> {
        self.ensure_active()?;
        if self.paused {
            return Err(Error::SessionPaused);
        }
        if !self.is_member(voter) {
            return Err(Error::NotMember(voter));
        }
        if !self.is_active_candidate(candidate) {
            return Err(Error::NotActiveCandidate(candidate));
        }

        let previous = self.ledger.cast(voter, candidate);
        debug!(
            session = %self.id,
            voter = %voter,
            candidate = %candidate,
            changed = previous.is_some(),
            votes = self.ledger.len(),
            "vote cast"
        );
        self.emit(self.notifier.on_vote_cast(self.id, voter, candidate, previous));

        let resolution = self.check_resolution();
        Ok(VoteOutcome {
            previous,
            resolution,
        })
    }

    /// Record `winner` for the current level without a qualifying tally
    /// (administrative override). Still validates the winner is an active
    /// candidate. Available while paused.
    pub fn force_advance(&mut self, winner: ParticipantId) -> Result<RoundOutcome> {
        self.ensure_active()?;
        if !self.is_active_candidate(winner) {
            return Err(Error::NotActiveCandidate(winner));
        }

        warn!(
            session = %self.id,
            level = self.current_level,
            winner = %winner,
            "round advanced by override, bypassing threshold"
        );
        let outcome = RoundOutcome {
            level: self.current_level,
            winner,
            tally: self.ledger.tally_sorted(),
            was_tie: false,
        };
        self.advance(winner);
        Ok(outcome)
    }

    /// Resolve the current round from the tally as it stands
    /// (administrative override): the leader wins, ties break randomly,
    /// and an empty ledger selects a uniformly random active candidate.
    pub fn force_resolve(&mut self) -> Result<RoundOutcome> {
        self.ensure_active()?;

        let (winner, was_tie) = match self.ledger.leading() {
            Some((_, tied)) if tied.len() == 1 => (tied[0], false),
            Some((_, tied)) => {
                let chosen = tied[self.tie_breaker.pick(tied.len())];
                self.emit(self.notifier.on_tie_break(self.id, &tied, chosen));
                (chosen, true)
            }
            None => {
                let idx = self.tie_breaker.pick(self.active_candidates.len());
                (self.active_candidates[idx], false)
            }
        };

        warn!(
            session = %self.id,
            level = self.current_level,
            winner = %winner,
            was_tie,
            "round resolved by override from current tally"
        );
        let outcome = RoundOutcome {
            level: self.current_level,
            winner,
            tally: self.ledger.tally_sorted(),
            was_tie,
        };
        self.advance(winner);
        Ok(outcome)
    }

    /// Clear the ledger for the current level without touching level or
    /// pool. Returns the number of votes dropped. Available while paused.
    pub fn reset_votes(&mut self) -> Result<usize> {
        self.ensure_active()?;
        let dropped = self.ledger.len();
        self.ledger.clear();
        info!(session = %self.id, level = self.current_level, dropped, "votes reset");
        Ok(dropped)
    }

    /// Reset to the top level with the full current membership, clearing
    /// ledger, winners, and the paused flag.
    pub fn restart(&mut self) -> Result<()> {
        self.ensure_active()?;
        self.current_level = self.config.starting_level;
        self.active_candidates = self.members.clone();
        self.ledger.clear();
        self.winners.clear();
        self.paused = false;
        info!(session = %self.id, level = self.current_level, "session restarted");
        self.emit(self.notifier.on_session_started(
            self.id,
            self.current_level,
            &self.active_candidates,
            self.threshold(),
        ));
        Ok(())
    }

    /// Suspend vote acceptance. Redundant pauses are reported, not
    /// absorbed.
    pub fn pause(&mut self) -> Result<()> {
        self.ensure_active()?;
        if self.paused {
            return Err(Error::AlreadyPaused);
        }
        self.paused = true;
        info!(session = %self.id, "session paused");
        Ok(())
    }

    /// Resume vote acceptance.
    pub fn resume(&mut self) -> Result<()> {
        self.ensure_active()?;
        if !self.paused {
            return Err(Error::NotPaused);
        }
        self.paused = false;
        info!(session = %self.id, "session resumed");
        Ok(())
    }

    /// Append a participant to the membership and the active pool.
    pub fn add_member(&mut self, participant: Participant) -> Result<()> {
        self.ensure_active()?;
        if self.is_member(participant.id) {
            return Err(Error::InvalidMembership(format!(
                "{} is already a member",
                participant.id
            )));
        }
        if self.members.len() >= self.config.max_members {
            return Err(Error::InvalidMembership(format!(
                "group is limited to {} members",
                self.config.max_members
            )));
        }

        let pid = participant.id;
        self.roster.insert(pid, participant);
        self.members.push(pid);
        self.active_candidates.push(pid);
        info!(
            session = %self.id,
            participant = %pid,
            members = self.members.len(),
            threshold = self.threshold(),
            "member added"
        );
        Ok(())
    }

    /// Remove a participant from membership and the active pool, purging
    /// any ledger votes cast by or for them.
    ///
    /// Rejected when the participant is not a member, is the current
    /// facilitator, or removal would shrink the group below the minimum
    /// viable size. A removal that leaves a single active candidate
    /// completes the session.
    pub fn remove_member(&mut self, participant: ParticipantId) -> Result<()> {
        self.ensure_active()?;
        if !self.is_member(participant) {
            return Err(Error::InvalidMembership(format!(
                "{participant} is not a member"
            )));
        }
        if participant == self.facilitator {
            return Err(Error::InvalidMembership(
                "cannot remove the facilitator; reassign first".into(),
            ));
        }
        if self.members.len() <= self.config.min_members {
            return Err(Error::InvalidMembership(format!(
                "cannot shrink below {} members",
                self.config.min_members
            )));
        }

        self.members.retain(|m| *m != participant);
        self.active_candidates.retain(|c| *c != participant);
        let purged = self.ledger.purge(participant);
        info!(
            session = %self.id,
            participant = %participant,
            purged_votes = purged,
            members = self.members.len(),
            "member removed"
        );

        if self.active_candidates.len() <= 1 {
            self.complete();
        }
        Ok(())
    }

    /// Reassign the facilitator role. The new facilitator must be a
    /// member.
    pub fn change_facilitator(&mut self, new_facilitator: ParticipantId) -> Result<()> {
        self.ensure_active()?;
        if !self.is_member(new_facilitator) {
            return Err(Error::InvalidMembership(format!(
                "{new_facilitator} must be a member to facilitate"
            )));
        }
        let old = std::mem::replace(&mut self.facilitator, new_facilitator);
        info!(session = %self.id, from = %old, to = %new_facilitator, "facilitator changed");
        Ok(())
    }

    /// Discard the session without computing a ranking.
    ///
    /// Immediate and unconditional: any command arriving afterward fails
    /// its active check, including commands already holding a handle.
    pub fn terminate(&mut self) {
        if self.phase == SessionPhase::Voting {
            info!(session = %self.id, level = self.current_level, "session terminated");
            self.phase = SessionPhase::Terminated;
        }
    }

    /// Point-in-time status view.
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            id: self.id,
            phase: self.phase,
            level: self.current_level,
            paused: self.paused,
            facilitator: self.facilitator,
            member_count: self.members.len(),
            active_candidates: self.active_candidates.clone(),
            votes_cast: self.ledger.len(),
            threshold: self.threshold(),
            tally: self.ledger.tally_sorted(),
            winners: self.winners(),
        }
    }

    /// Serializable archival snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        let mut votes: Vec<_> = self.ledger.entries().collect();
        votes.sort();
        SessionSnapshot {
            id: self.id,
            phase: self.phase,
            level: self.current_level,
            paused: self.paused,
            facilitator: self.facilitator,
            members: self
                .members
                .iter()
                .filter_map(|id| self.roster.get(id).cloned())
                .collect(),
            active_candidates: self.active_candidates.clone(),
            votes,
            winners: self.winners(),
            final_ranking: self.final_ranking.clone(),
        }
    }

    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Whether the session still accepts commands.
    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Voting
    }

    /// Current level being voted on.
    pub fn level(&self) -> u32 {
        self.current_level
    }

    /// Whether vote acceptance is suspended.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Current facilitator.
    pub fn facilitator(&self) -> ParticipantId {
        self.facilitator
    }

    /// Current membership size.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Current membership, in join order.
    pub fn members(&self) -> &[ParticipantId] {
        &self.members
    }

    /// Identity reference for a member (or former member).
    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.roster.get(&id)
    }

    /// Candidates not yet eliminated.
    pub fn active_candidates(&self) -> &[ParticipantId] {
        &self.active_candidates
    }

    /// Votes recorded for the round in progress.
    pub fn votes_cast(&self) -> usize {
        self.ledger.len()
    }

    /// Votes required to win the current round outright.
    pub fn threshold(&self) -> usize {
        vote_threshold(self.members.len())
    }

    /// Current tally, descending count.
    pub fn tally(&self) -> Vec<(ParticipantId, usize)> {
        self.ledger.tally_sorted()
    }

    /// Recorded winners, descending level.
    pub fn winners(&self) -> Vec<(u32, ParticipantId)> {
        self.winners.iter().rev().map(|(l, w)| (*l, *w)).collect()
    }

    /// Final ranking, once the session has completed.
    pub fn final_ranking(&self) -> Option<&[RankedPlace]> {
        self.final_ranking.as_deref()
    }

    fn ensure_active(&self) -> Result<()> {
        if self.phase == SessionPhase::Voting {
            Ok(())
        } else {
            Err(Error::AlreadyCompleted)
        }
    }

    fn is_member(&self, id: ParticipantId) -> bool {
        self.members.contains(&id)
    }

    fn is_active_candidate(&self, id: ParticipantId) -> bool {
        self.active_candidates.contains(&id)
    }

    /// Evaluate the tally against the threshold; on a win, break any tie
    /// and advance.
    fn check_resolution(&mut self) -> Option<RoundOutcome> {
        let (max_votes, tied) = self.ledger.leading()?;
        if !meets_threshold(max_votes, self.members.len()) {
            return None;
        }

        let was_tie = tied.len() > 1;
        let winner = if was_tie {
            let chosen = tied[self.tie_breaker.pick(tied.len())];
            info!(
                session = %self.id,
                tied = tied.len(),
                max_votes,
                chosen = %chosen,
                "tie broken at random"
            );
            self.emit(self.notifier.on_tie_break(self.id, &tied, chosen));
            chosen
        } else {
            tied[0]
        };

        let outcome = RoundOutcome {
            level: self.current_level,
            winner,
            tally: self.ledger.tally_sorted(),
            was_tie,
        };
        self.advance(winner);
        Some(outcome)
    }

    /// Record the winner, shrink the pool, step one level down, and
    /// either open the next round or complete.
    fn advance(&mut self, winner: ParticipantId) {
        let won_level = self.current_level;
        self.winners.insert(won_level, winner);
        self.active_candidates.retain(|c| *c != winner);
        self.current_level = won_level - 1;
        self.ledger.clear();

        info!(
            session = %self.id,
            level = won_level,
            winner = %winner,
            remaining = self.active_candidates.len(),
            "round resolved"
        );

        if self.current_level < TERMINAL_LEVEL || self.active_candidates.len() <= 1 {
            self.emit(self.notifier.on_round_complete(self.id, won_level, winner, None));
            self.complete();
        } else {
            let next = NextRound {
                level: self.current_level,
                candidates: self.active_candidates.clone(),
                threshold: self.threshold(),
            };
            self.emit(
                self.notifier
                    .on_round_complete(self.id, won_level, winner, Some(&next)),
            );
        }
    }

    /// Auto-rank a sole surviving candidate, build the final ranking, and
    /// close the session.
    fn complete(&mut self) {
        if self.active_candidates.len() == 1 {
            let last = self.active_candidates[0];
            self.winners.insert(self.current_level, last);
            self.active_candidates.clear();
            info!(
                session = %self.id,
                level = self.current_level,
                participant = %last,
                "last candidate auto-ranked"
            );
        }

        let ranking = self.build_ranking();
        self.phase = SessionPhase::Completed;
        info!(session = %self.id, places = ranking.len(), "session complete");
        self.emit(self.notifier.on_session_complete(self.id, &ranking));
        self.final_ranking = Some(ranking);
    }

    fn build_ranking(&self) -> Vec<RankedPlace> {
        self.winners
            .iter()
            .rev()
            .enumerate()
            .map(|(position, (level, id))| RankedPlace {
                position,
                participant: self.roster.get(id).cloned().unwrap_or_else(|| Participant {
                    id: *id,
                    display_name: id.to_string(),
                }),
                level: *level,
                respect: self.config.ranking.points_for(position),
            })
            .collect()
    }

    /// Notification delivery is fire-and-forget: failures are logged and
    /// never roll back the transition that produced them.
    fn emit(&self, delivery: NotifyResult) {
        if let Err(e) = delivery {
            warn!(session = %self.id, error = %e, "notification dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NotifyError;
    use crate::tiebreak::SeededTieBreaker;
    use std::sync::Mutex;

    fn p(id: u64) -> ParticipantId {
        ParticipantId(id)
    }

    fn roster(n: u64) -> Vec<Participant> {
        (1..=n)
            .map(|i| Participant::new(i, format!("member-{i}")))
            .collect()
    }

    fn session(n: u64) -> Session {
        let mut s = Session::new(SessionId(1), roster(n), p(1), SessionConfig::default())
            .expect("valid session");
        s.start().expect("startable");
        s
    }

    /// Records the names of delivered events, in order.
    #[derive(Debug, Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn names(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, name: &str) -> NotifyResult {
            self.events.lock().unwrap().push(name.to_string());
            Ok(())
        }
    }

    impl NotificationPort for Recorder {
        fn on_session_started(
            &self,
            _: SessionId,
            _: u32,
            _: &[ParticipantId],
            _: usize,
        ) -> NotifyResult {
            self.push("started")
        }

        fn on_vote_cast(
            &self,
            _: SessionId,
            _: ParticipantId,
            _: ParticipantId,
            _: Option<ParticipantId>,
        ) -> NotifyResult {
            self.push("vote")
        }

        fn on_tie_break(&self, _: SessionId, _: &[ParticipantId], _: ParticipantId) -> NotifyResult {
            self.push("tie")
        }

        fn on_round_complete(
            &self,
            _: SessionId,
            _: u32,
            _: ParticipantId,
            _: Option<&NextRound>,
        ) -> NotifyResult {
            self.push("round")
        }

        fn on_session_complete(&self, _: SessionId, _: &[RankedPlace]) -> NotifyResult {
            self.push("complete")
        }
    }

    /// Fails every delivery, to prove transitions never roll back.
    #[derive(Debug)]
    struct Unreachable;

    impl NotificationPort for Unreachable {
        fn on_session_started(
            &self,
            _: SessionId,
            _: u32,
            _: &[ParticipantId],
            _: usize,
        ) -> NotifyResult {
            Err(NotifyError("transport down".into()))
        }

        fn on_vote_cast(
            &self,
            _: SessionId,
            _: ParticipantId,
            _: ParticipantId,
            _: Option<ParticipantId>,
        ) -> NotifyResult {
            Err(NotifyError("transport down".into()))
        }

        fn on_tie_break(&self, _: SessionId, _: &[ParticipantId], _: ParticipantId) -> NotifyResult {
            Err(NotifyError("transport down".into()))
        }

        fn on_round_complete(
            &self,
            _: SessionId,
            _: u32,
            _: ParticipantId,
            _: Option<&NextRound>,
        ) -> NotifyResult {
            Err(NotifyError("transport down".into()))
        }

        fn on_session_complete(&self, _: SessionId, _: &[RankedPlace]) -> NotifyResult {
            Err(NotifyError("transport down".into()))
        }
    }

    #[test]
    fn majority_resolves_round() {
        let mut s = session(4);

        let first = s.cast_vote(p(2), p(1)).unwrap();
        assert!(first.resolution.is_none());

        let second = s.cast_vote(p(3), p(1)).unwrap();
        let outcome = second.resolution.expect("two of four votes resolve the round");
        assert_eq!(outcome.level, 6);
        assert_eq!(outcome.winner, p(1));
        assert!(!outcome.was_tie);

        assert_eq!(s.level(), 5);
        assert_eq!(s.active_candidates().len(), 3);
        assert!(!s.active_candidates().contains(&p(1)));
        assert_eq!(s.votes_cast(), 0, "ledger clears for the new round");
    }

    #[test]
    fn split_vote_stays_open() {
        let mut s = session(3);

        s.cast_vote(p(1), p(2)).unwrap();
        s.cast_vote(p(2), p(3)).unwrap();
        let last = s.cast_vote(p(3), p(1)).unwrap();

        assert!(last.resolution.is_none(), "1-1-1 is below a threshold of 2");
        assert_eq!(s.level(), 6);
        assert_eq!(s.votes_cast(), 3);
    }

    #[test]
    fn two_member_session_completes_on_one_vote() {
        let mut s = session(2);

        let out = s.cast_vote(p(1), p(2)).unwrap();
        let res = out.resolution.expect("threshold of two members is one vote");
        assert_eq!(res.winner, p(2));

        assert_eq!(s.phase(), SessionPhase::Completed);
        let ranking = s.final_ranking().expect("completed session has a ranking");
        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].participant.id, p(2));
        assert_eq!(ranking[0].level, 6);
        assert_eq!(ranking[0].respect, 110);
        assert_eq!(ranking[1].participant.id, p(1));
        assert_eq!(ranking[1].level, 5);
        assert_eq!(ranking[1].respect, 68);
    }

    #[test]
    fn recasting_the_same_vote_is_idempotent() {
        let mut s = session(5);

        s.cast_vote(p(2), p(1)).unwrap();
        let again = s.cast_vote(p(2), p(1)).unwrap();

        assert_eq!(again.previous, Some(p(1)));
        assert!(again.resolution.is_none());
        assert_eq!(s.tally(), vec![(p(1), 1)]);
    }

    #[test]
    fn changed_vote_reports_previous_choice() {
        let mut s = session(5);

        let first = s.cast_vote(p(2), p(1)).unwrap();
        assert_eq!(first.previous, None);

        let changed = s.cast_vote(p(2), p(3)).unwrap();
        assert_eq!(changed.previous, Some(p(1)));
        assert_eq!(s.tally(), vec![(p(3), 1)]);
    }

    #[test]
    fn eliminated_members_keep_voting() {
        let mut s = session(4);
        s.cast_vote(p(2), p(1)).unwrap();
        s.cast_vote(p(3), p(1)).unwrap(); // p1 wins level 6

        // p1 is out of the pool but still a voting member.
        assert!(s.cast_vote(p(1), p(2)).is_ok());
        assert_eq!(s.cast_vote(p(2), p(1)), Err(Error::NotActiveCandidate(p(1))));
    }

    #[test]
    fn outsiders_cannot_vote_or_be_voted_for() {
        let mut s = session(4);

        assert_eq!(s.cast_vote(p(99), p(1)), Err(Error::NotMember(p(99))));
        assert_eq!(s.cast_vote(p(1), p(99)), Err(Error::NotActiveCandidate(p(99))));
        assert_eq!(s.votes_cast(), 0, "rejected votes leave no trace");
    }

    #[test]
    fn forced_advance_ignores_tally() {
        let mut s = session(4);
        s.cast_vote(p(2), p(4)).unwrap();

        let outcome = s.force_advance(p(3)).unwrap();
        assert_eq!(outcome.winner, p(3));
        assert_eq!(outcome.level, 6);
        assert_eq!(outcome.tally, vec![(p(4), 1)]);

        assert_eq!(s.level(), 5);
        assert!(!s.active_candidates().contains(&p(3)));
        assert_eq!(s.votes_cast(), 0);

        // The eliminated winner is no longer a valid target.
        assert_eq!(s.force_advance(p(3)), Err(Error::NotActiveCandidate(p(3))));
    }

    #[test]
    fn forced_resolution_prefers_the_leader() {
        let mut s = session(5);
        s.cast_vote(p(2), p(4)).unwrap();
        s.cast_vote(p(3), p(4)).unwrap(); // 2 votes, threshold is 3

        let outcome = s.force_resolve().unwrap();
        assert_eq!(outcome.winner, p(4));
        assert!(!outcome.was_tie);
        assert_eq!(s.level(), 5);
    }

    #[test]
    fn forced_resolution_breaks_ties_reproducibly() {
        let run = |seed: u64| {
            let mut s = Session::new(SessionId(1), roster(4), p(1), SessionConfig::default())
                .unwrap()
                .with_tie_breaker(Box::new(SeededTieBreaker::from_seed(seed)));
            s.start().unwrap();
            s.cast_vote(p(3), p(1)).unwrap();
            s.cast_vote(p(4), p(2)).unwrap();
            s.force_resolve().unwrap()
        };

        let first = run(11);
        assert!(first.was_tie);
        assert!([p(1), p(2)].contains(&first.winner));
        // Same seed and votes select the same winner.
        assert_eq!(run(11).winner, first.winner);
    }

    #[test]
    fn forced_resolution_without_votes_picks_a_candidate() {
        let mut s = Session::new(SessionId(1), roster(4), p(1), SessionConfig::default())
            .unwrap()
            .with_tie_breaker(Box::new(SeededTieBreaker::from_seed(3)));
        s.start().unwrap();

        let outcome = s.force_resolve().unwrap();
        assert!(outcome.tally.is_empty());
        assert!(!outcome.was_tie);
        assert!(!s.active_candidates().contains(&outcome.winner));
        assert_eq!(s.level(), 5);
    }

    #[test]
    fn tie_break_is_roughly_uniform() {
        // 1-1 tie between p1 and p2 forced 200 times: each side should
        // win well inside [50, 150].
        let mut p1_wins = 0;
        for _ in 0..200 {
            let mut s = session(4);
            s.cast_vote(p(3), p(1)).unwrap();
            s.cast_vote(p(4), p(2)).unwrap();
            if s.force_resolve().unwrap().winner == p(1) {
                p1_wins += 1;
            }
        }
        assert!(
            (50..=150).contains(&p1_wins),
            "tie-break heavily skewed: p1 won {} of 200",
            p1_wins
        );
    }

    #[test]
    fn votes_reset_without_level_change() {
        let mut s = session(4);
        s.cast_vote(p(2), p(1)).unwrap();

        assert_eq!(s.reset_votes().unwrap(), 1);
        assert_eq!(s.votes_cast(), 0);
        assert_eq!(s.level(), 6);
        assert!(s.winners().is_empty());
    }

    #[test]
    fn restart_resets_to_top_level() {
        let mut s = session(4);
        s.cast_vote(p(2), p(1)).unwrap();
        s.cast_vote(p(3), p(1)).unwrap(); // p1 wins level 6
        s.cast_vote(p(1), p(2)).unwrap();
        s.cast_vote(p(3), p(2)).unwrap(); // p2 wins level 5
        s.pause().unwrap();

        s.restart().unwrap();

        assert_eq!(s.level(), 6);
        assert!(s.winners().is_empty());
        assert_eq!(s.active_candidates().len(), 4);
        assert_eq!(s.votes_cast(), 0);
        assert!(!s.is_paused());
    }

    #[test]
    fn paused_session_rejects_votes() {
        let mut s = session(4);
        s.pause().unwrap();

        assert_eq!(s.cast_vote(p(2), p(1)), Err(Error::SessionPaused));
        assert_eq!(s.pause(), Err(Error::AlreadyPaused));

        s.resume().unwrap();
        assert_eq!(s.resume(), Err(Error::NotPaused));
        assert!(s.cast_vote(p(2), p(1)).is_ok());
    }

    #[test]
    fn pause_freezes_resolution_until_resumed() {
        // One vote short of the threshold, then paused: the vote that
        // would resolve the round is rejected outright, so no winner can
        // be recorded while paused.
        let mut s = session(4);
        s.cast_vote(p(2), p(1)).unwrap();
        s.pause().unwrap();

        assert_eq!(s.cast_vote(p(3), p(1)), Err(Error::SessionPaused));
        assert_eq!(s.level(), 6);
        assert!(s.winners().is_empty());

        s.resume().unwrap();
        let outcome = s.cast_vote(p(3), p(1)).unwrap();
        assert!(outcome.resolution.is_some());
    }

    #[test]
    fn admin_overrides_work_while_paused() {
        let mut s = session(4);
        s.cast_vote(p(2), p(1)).unwrap();
        s.pause().unwrap();

        assert_eq!(s.reset_votes().unwrap(), 1);
        let outcome = s.force_advance(p(2)).unwrap();
        assert_eq!(outcome.winner, p(2));
        assert_eq!(s.level(), 5);
        assert!(s.is_paused(), "overrides do not resume the session");
    }

    #[test]
    fn four_member_session_completes_in_three_resolved_rounds() {
        let mut s = session(4);

        // Level 6: converge on p1.
        s.cast_vote(p(2), p(1)).unwrap();
        assert!(s.cast_vote(p(3), p(1)).unwrap().resolution.is_some());
        assert_eq!((s.level(), s.active_candidates().len()), (5, 3));

        // Level 5: converge on p2.
        s.cast_vote(p(1), p(2)).unwrap();
        assert!(s.cast_vote(p(3), p(2)).unwrap().resolution.is_some());
        assert_eq!((s.level(), s.active_candidates().len()), (4, 2));

        // Level 4: converge on p3; p4 is auto-ranked at level 3.
        s.cast_vote(p(1), p(3)).unwrap();
        assert!(s.cast_vote(p(2), p(3)).unwrap().resolution.is_some());

        assert_eq!(s.phase(), SessionPhase::Completed);
        let ranking = s.final_ranking().unwrap();
        assert_eq!(ranking.len(), 4);
        let levels: Vec<_> = ranking.iter().map(|r| r.level).collect();
        assert_eq!(levels, vec![6, 5, 4, 3]);
        let respect: Vec<_> = ranking.iter().map(|r| r.respect).collect();
        assert_eq!(respect, vec![110, 68, 42, 26]);
        let ids: Vec<_> = ranking.iter().map(|r| r.participant.id).collect();
        assert_eq!(ids, vec![p(1), p(2), p(3), p(4)]);
    }

    #[test]
    fn positions_past_the_table_earn_zero() {
        let config = SessionConfig::default().with_ranking(RankingTable::new(vec![9, 5]));
        let mut s = Session::new(SessionId(1), roster(4), p(1), config).unwrap();
        s.start().unwrap();

        s.force_advance(p(1)).unwrap();
        s.force_advance(p(2)).unwrap();
        s.force_advance(p(3)).unwrap();

        let respect: Vec<_> = s
            .final_ranking()
            .unwrap()
            .iter()
            .map(|r| r.respect)
            .collect();
        assert_eq!(respect, vec![9, 5, 0, 0]);
    }

    #[test]
    fn single_member_session_completes_immediately() {
        let mut s = Session::new(SessionId(9), roster(1), p(1), SessionConfig::default()).unwrap();
        s.start().unwrap();

        assert_eq!(s.phase(), SessionPhase::Completed);
        let ranking = s.final_ranking().unwrap();
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].level, 6);
        assert_eq!(ranking[0].respect, 110);
    }

    #[test]
    fn completed_session_rejects_mutations() {
        let mut s = session(2);
        s.cast_vote(p(1), p(2)).unwrap(); // completes the session

        assert_eq!(s.cast_vote(p(1), p(2)), Err(Error::AlreadyCompleted));
        assert_eq!(s.pause(), Err(Error::AlreadyCompleted));
        assert_eq!(s.restart(), Err(Error::AlreadyCompleted));
        assert_eq!(s.force_advance(p(1)), Err(Error::AlreadyCompleted));
        assert_eq!(s.reset_votes(), Err(Error::AlreadyCompleted));
    }

    #[test]
    fn terminated_session_rejects_everything() {
        let mut s = session(4);
        s.terminate();

        assert_eq!(s.phase(), SessionPhase::Terminated);
        assert_eq!(s.cast_vote(p(2), p(1)), Err(Error::AlreadyCompleted));
        assert!(s.final_ranking().is_none(), "termination skips the ranking");
    }

    #[test]
    fn add_member_joins_pool_and_raises_threshold() {
        let mut s = session(4);
        assert_eq!(s.threshold(), 2);

        s.add_member(Participant::new(7, "late-joiner")).unwrap();

        assert_eq!(s.member_count(), 5);
        assert_eq!(s.threshold(), 3);
        assert!(s.active_candidates().contains(&p(7)));
        assert!(matches!(
            s.add_member(Participant::new(7, "late-joiner")),
            Err(Error::InvalidMembership(_))
        ));
    }

    #[test]
    fn group_size_cap_enforced() {
        let mut s = session(6);
        assert!(matches!(
            s.add_member(Participant::new(7, "overflow")),
            Err(Error::InvalidMembership(_))
        ));

        assert!(matches!(
            Session::new(SessionId(2), roster(7), p(1), SessionConfig::default()),
            Err(Error::InvalidMembership(_))
        ));
    }

    #[test]
    fn remove_member_purges_their_votes() {
        let mut s = session(5);
        s.cast_vote(p(2), p(3)).unwrap(); // for the removed member
        s.cast_vote(p(3), p(4)).unwrap(); // by the removed member

        s.remove_member(p(3)).unwrap();

        assert_eq!(s.member_count(), 4);
        assert!(!s.active_candidates().contains(&p(3)));
        assert_eq!(s.votes_cast(), 0);
    }

    #[test]
    fn removal_floor_and_facilitator_guard() {
        let mut s = session(4);
        assert!(matches!(s.remove_member(p(1)), Err(Error::InvalidMembership(_))));
        assert!(matches!(s.remove_member(p(99)), Err(Error::InvalidMembership(_))));

        let mut small = session(2);
        assert!(matches!(
            small.remove_member(p(2)),
            Err(Error::InvalidMembership(_))
        ));
    }

    #[test]
    fn removal_to_single_candidate_completes_session() {
        let mut s = session(3);
        s.cast_vote(p(1), p(2)).unwrap();
        s.cast_vote(p(3), p(2)).unwrap(); // p2 wins level 6, pool is {p1, p3}

        s.remove_member(p(3)).unwrap();

        assert_eq!(s.phase(), SessionPhase::Completed);
        let ranking = s.final_ranking().unwrap();
        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].participant.id, p(2));
        assert_eq!(ranking[1].participant.id, p(1));
    }

    #[test]
    fn facilitator_reassignment_requires_membership() {
        let mut s = session(4);

        s.change_facilitator(p(2)).unwrap();
        assert_eq!(s.facilitator(), p(2));

        assert!(matches!(
            s.change_facilitator(p(99)),
            Err(Error::InvalidMembership(_))
        ));
        assert_eq!(s.facilitator(), p(2));
    }

    #[test]
    fn notification_failures_never_block_transitions() {
        let mut s = Session::new(SessionId(1), roster(2), p(1), SessionConfig::default())
            .unwrap()
            .with_notifier(Arc::new(Unreachable));
        s.start().unwrap();

        s.cast_vote(p(1), p(2)).unwrap();
        assert_eq!(s.phase(), SessionPhase::Completed);
    }

    #[test]
    fn events_emitted_in_order() {
        let recorder = Arc::new(Recorder::default());
        let mut s = Session::new(SessionId(1), roster(2), p(1), SessionConfig::default())
            .unwrap()
            .with_notifier(recorder.clone());
        s.start().unwrap();
        s.cast_vote(p(1), p(2)).unwrap();

        assert_eq!(recorder.names(), vec!["started", "vote", "round", "complete"]);
    }

    #[test]
    fn status_reflects_round_state() {
        let mut s = session(4);
        s.cast_vote(p(2), p(1)).unwrap();

        let status = s.status();
        assert_eq!(status.level, 6);
        assert_eq!(status.threshold, 2);
        assert_eq!(status.votes_cast, 1);
        assert_eq!(status.tally, vec![(p(1), 1)]);
        assert_eq!(status.member_count, 4);
        assert!(!status.paused);
        assert!(status.winners.is_empty());
    }

    #[test]
    fn snapshot_carries_the_full_session() {
        let mut s = session(4);
        s.cast_vote(p(2), p(1)).unwrap();

        let value = serde_json::to_value(s.snapshot()).unwrap();
        assert_eq!(value["level"], 6);
        assert_eq!(value["paused"], false);
        assert_eq!(value["members"].as_array().unwrap().len(), 4);
        assert_eq!(value["votes"].as_array().unwrap().len(), 1);
        assert_eq!(value["phase"], "Voting");
    }

    #[test]
    fn duplicate_members_and_outside_facilitator_rejected() {
        let mut dup = roster(3);
        dup.push(Participant::new(2, "clone"));
        assert!(matches!(
            Session::new(SessionId(1), dup, p(1), SessionConfig::default()),
            Err(Error::InvalidMembership(_))
        ));

        assert!(matches!(
            Session::new(SessionId(1), roster(3), p(9), SessionConfig::default()),
            Err(Error::InvalidMembership(_))
        ));
    }
}
