//! Archival export of live sessions.
//!
//! The registry keeps no history of its own (persistence is a caller
//! concern); `export` hands out a serializable snapshot of one or all
//! live sessions for whatever archive the boundary layer maintains.

use fractal_engine::SessionSnapshot;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Serializable snapshot of one or all live sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSnapshot {
    /// Unix seconds at export time.
    pub exported_at: u64,
    /// Snapshots ordered by session id.
    pub sessions: Vec<SessionSnapshot>,
}

impl ExportSnapshot {
    /// Wrap session snapshots with the current timestamp.
    #[must_use]
    pub fn new(sessions: Vec<SessionSnapshot>) -> Self {
        Self {
            exported_at: unix_now(),
            sessions,
        }
    }

    /// Number of sessions captured.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Check if no sessions were captured.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Current unix time in seconds.
fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
