//! Run summary types and helpers.

mod outcome;
mod run_summary;

pub use outcome::SyncOutcome;
pub use run_summary::RunSummary;
