//! # Lifecycle
//!
//! Match session state machine: `Idle -> Recording -> Finishing -> Idle`.
//!
//! The session is the single owner of the fusion coordinator, the effect
//! engine and the match context while recording. It drives the 50 ms
//! sampling timer, merges asynchronously pushed wearable samples, watches
//! the finish geofence and hands the end-of-match summary to the submission
//! sinks.

mod geofence;
mod session;

pub use geofence::{GeofenceTracker, GeofenceVerdict};
pub use session::{MatchSession, MatchSessionConfig, SessionCommand};
