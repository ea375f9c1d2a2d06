//! Sync results.

use crate::summary::SyncOutcome;
use crate::sync::{BatchKind, BatchState, SyncBatchFailure};
use serde::Serialize;

/// Counts of what a sync did.
///
/// In a dry run `created` and `updated` count planned writes; nothing was
/// sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,

    /// Records in failed batches.
    pub failed: usize,

    pub failures: Vec<SyncBatchFailure>,
    pub dry_run: bool,
}

impl SyncReport {
    /// Folds a finished batch into the counts.
    pub fn record_batch(&mut self, kind: BatchKind, full_names: Vec<String>, state: &BatchState) {
        match state {
            BatchState::Succeeded { .. } => match kind {
                BatchKind::Create => self.created += full_names.len(),
                BatchKind::Update => self.updated += full_names.len(),
            },
            BatchState::Failed { attempts, error } => {
                self.failed += full_names.len();
                self.failures.push(SyncBatchFailure {
                    kind,
                    full_names,
                    attempts: *attempts,
                    error: error.clone(),
                });
            }
            BatchState::Pending | BatchState::InFlight { .. } | BatchState::Retrying { .. } => {}
        }
    }

    /// Rows written successfully.
    #[must_use]
    pub fn written(&self) -> usize {
        self.created + self.updated
    }

    /// Clean without failures, Partial if something was still written,
    /// Failed otherwise.
    #[must_use]
    pub fn outcome(&self) -> SyncOutcome {
        if self.failures.is_empty() {
            SyncOutcome::Clean
        } else if self.written() > 0 {
            SyncOutcome::Partial
        } else {
            SyncOutcome::Failed
        }
    }
}
