//! Ranking policy for fractal round-elimination voting.
//!
//! Two pure pieces with no state and no dependencies on the engine:
//!
//! - **Threshold**: how many votes a candidate needs to win a round
//!   outright. Computed against *total* membership, not the surviving
//!   candidate pool, so the bar never drops as candidates are eliminated.
//! - **Ranking table**: how many respect points each final-ranking
//!   position earns. Supplied by the caller as configuration; positions
//!   past the end of the table earn zero.

mod points;
mod threshold;

pub use points::{RankingTable, DEFAULT_RESPECT_POINTS};
pub use threshold::{meets_threshold, vote_threshold};
