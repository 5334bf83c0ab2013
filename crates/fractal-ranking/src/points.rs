//! Respect points per final-ranking position.

use serde::{Deserialize, Serialize};

/// Default respect schedule: doubled Fibonacci, first place highest.
pub const DEFAULT_RESPECT_POINTS: [u64; 6] = [110, 68, 42, 26, 16, 10];

/// Ordered table mapping 0-indexed ranking position to respect points.
///
/// The table is configuration supplied by the caller; the engine only
/// looks positions up. Positions past the end of the table earn zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingTable {
    points: Vec<u64>,
}

impl Default for RankingTable {
    fn default() -> Self {
        Self {
            points: DEFAULT_RESPECT_POINTS.to_vec(),
        }
    }
}

impl RankingTable {
    /// Create a table from an ordered point sequence (first place first).
    #[must_use]
    pub fn new(points: Vec<u64>) -> Self {
        Self { points }
    }

    /// Points earned by the finisher at `position` (0-indexed).
    #[must_use]
    pub fn points_for(&self, position: usize) -> u64 {
        self.points.get(position).copied().unwrap_or(0)
    }

    /// Number of positions that earn non-trivial points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the table awards no points at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
