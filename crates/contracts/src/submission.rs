//! SubmissionSink trait - end-of-match hand-off
//!
//! At match end the engine emits the summary to an external submission
//! function. Best-effort from this core's perspective: failures are logged,
//! never retried.

use crate::{ContractError, MatchSummary};

/// External submission capability.
pub trait SubmissionSink: Send {
    /// Name used for logging.
    fn name(&self) -> &str;

    /// Submit a completed match summary.
    ///
    /// # Errors
    /// Returns a submission error; the caller treats it as best-effort
    /// telemetry after the match has already concluded locally.
    fn submit(&mut self, summary: &MatchSummary) -> Result<(), ContractError>;
}
