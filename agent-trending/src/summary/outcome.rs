//! Overall sync outcome.

use serde::Serialize;

/// How a sync ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Every batch was written.
    Clean,

    /// Some batches failed, others were written.
    Partial,

    /// Batches failed and nothing was written.
    Failed,
}

impl SyncOutcome {
    /// Process exit code for this outcome.
    #[must_use]
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Clean => 0,
            Self::Partial => 1,
            Self::Failed => 3,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }
}
