//! Command implementations.

mod info;
mod run;
mod score;
mod validate;

pub use info::run_info;
pub use run::run_match;
pub use score::run_score;
pub use validate::run_validate;
