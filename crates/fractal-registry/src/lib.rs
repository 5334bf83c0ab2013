//! Fractal session registry - the administrative surface over live
//! voting sessions.
//!
//! The engine crate owns single-session semantics; this crate owns the
//! keyed collection of live sessions and the command surface callers use
//! to drive them: create, vote, force-resolution, pause/resume, restart,
//! membership changes, termination, status, and export.
//!
//! # Concurrency
//!
//! Per-session commands serialize behind one `tokio::sync::Mutex` each;
//! independent sessions never contend. Notifications are emitted
//! synchronously by the engine through a non-blocking port - the bundled
//! [`ChannelNotifier`] fans them into a broadcast channel for transport
//! adapters to consume at their own pace.

pub mod error;
pub mod notify;
pub mod registry;
pub mod snapshot;

pub use error::{Error, Result};
pub use notify::{ChannelNotifier, SessionEvent};
pub use registry::{RegistryStats, SessionRegistry};
pub use snapshot::ExportSnapshot;
