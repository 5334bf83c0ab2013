//! Fractal round-elimination voting engine.
//!
//! A fixed group of participants repeatedly votes to single out one
//! winner per round; the winner vacates the candidate pool, the level
//! counts down by one, and the group votes again until a full strict
//! ranking of every participant exists. Rank positions map to respect
//! points through a caller-supplied table.
//!
//! # Architecture
//!
//! - **Ledger**: last-write-wins vote bookkeeping for the round in
//!   progress ([`VoteLedger`])
//! - **Session**: the elimination state machine: levels, candidate
//!   pool, winners, pause/override surface ([`Session`])
//! - **Tie-break**: injectable randomness for candidates tied at the
//!   maximum count ([`TieBreaker`])
//! - **Events**: outbound notification port toward the chat-platform
//!   boundary layer ([`NotificationPort`])
//!
//! The crate is synchronous and runtime-free; callers that need
//! concurrency wrap sessions in their own locks (see `fractal-registry`).

pub mod error;
pub mod events;
pub mod ledger;
pub mod participant;
pub mod session;
pub mod tiebreak;

pub use error::{Error, Result};
pub use events::{NextRound, NotificationPort, NotifyError, NotifyResult, NullNotifier};
pub use ledger::VoteLedger;
pub use participant::{Participant, ParticipantId, SessionId};
pub use session::{
    RankedPlace, RoundOutcome, Session, SessionConfig, SessionPhase, SessionSnapshot,
    SessionStatus, VoteOutcome, TERMINAL_LEVEL,
};
pub use tiebreak::{EntropyTieBreaker, SeededTieBreaker, TieBreaker};
