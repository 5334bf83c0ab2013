//! Per-round vote bookkeeping.
//!
//! The ledger is storage only: one current vote per voter with
//! last-write-wins overwrite semantics. Membership and candidate-pool
//! preconditions are enforced by the session state machine, which owns
//! both sets.

use crate::participant::ParticipantId;
use std::collections::HashMap;

/// Mapping of voter to chosen candidate for the round in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteLedger {
    votes: HashMap<ParticipantId, ParticipantId>,
}

impl VoteLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            votes: HashMap::new(),
        }
    }

    /// Record `voter`'s current vote, replacing any prior entry.
    ///
    /// Returns the previously chosen candidate so callers can distinguish
    /// a changed vote from a new one. Voting twice for the same candidate
    /// is a legal overwrite, not an error.
    pub fn cast(&mut self, voter: ParticipantId, candidate: ParticipantId) -> Option<ParticipantId> {
        self.votes.insert(voter, candidate)
    }

    /// Current vote of `voter`, if any.
    pub fn vote_of(&self, voter: ParticipantId) -> Option<ParticipantId> {
        self.votes.get(&voter).copied()
    }

    /// Vote counts per candidate.
    pub fn tally(&self) -> HashMap<ParticipantId, usize> {
        let mut counts = HashMap::new();
        for candidate in self.votes.values() {
            *counts.entry(*candidate).or_insert(0) += 1;
        }
        counts
    }

    /// Tally snapshot sorted by descending count, then by id for a stable
    /// order.
    pub fn tally_sorted(&self) -> Vec<(ParticipantId, usize)> {
        let mut counts: Vec<_> = self.tally().into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        counts
    }

    /// Highest vote count and the candidates holding it, sorted by id.
    ///
    /// Returns `None` when no votes have been cast. The sorted tie set
    /// keeps tie-break index selection reproducible.
    pub fn leading(&self) -> Option<(usize, Vec<ParticipantId>)> {
        let counts = self.tally();
        let max_votes = counts.values().copied().max()?;
        let mut tied: Vec<_> = counts
            .into_iter()
            .filter(|(_, count)| *count == max_votes)
            .map(|(candidate, _)| candidate)
            .collect();
        tied.sort();
        Some((max_votes, tied))
    }

    /// Drop every entry cast *by* or *for* `participant`.
    ///
    /// Used when a participant is administratively removed mid-round.
    /// Returns the number of entries dropped.
    pub fn purge(&mut self, participant: ParticipantId) -> usize {
        let before = self.votes.len();
        self.votes
            .retain(|voter, candidate| *voter != participant && *candidate != participant);
        before - self.votes.len()
    }

    /// Empty the ledger (round advance or admin reset).
    pub fn clear(&mut self) {
        self.votes.clear();
    }

    /// Number of votes currently recorded.
    pub fn len(&self) -> usize {
        self.votes.len()
    }

    /// Check if no votes have been cast.
    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    /// Iterate over (voter, candidate) entries.
    pub fn entries(&self) -> impl Iterator<Item = (ParticipantId, ParticipantId)> + '_ {
        self.votes.iter().map(|(v, c)| (*v, *c))
    }
}
