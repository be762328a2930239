//! # Scoring
//!
//! Post-hoc legitimacy scoring of a completed match and finish-time
//! reconstruction from the geofence candidate buffer.
//!
//! `score` is a pure function over the recorded path: deterministic, no side
//! effects, always in `[0, 100]` or one of two sentinels
//! (`COULD_NOT_EVALUATE`, `DID_NOT_FINISH`).

mod finish;
mod score;
pub mod thresholds;

pub use finish::reconstruct_finish_time;
pub use score::{score, score_with_config, COULD_NOT_EVALUATE, DID_NOT_FINISH};
