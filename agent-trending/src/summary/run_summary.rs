//! Run summary types.

use crate::fetch::FetchReport;
use crate::summary::SyncOutcome;
use crate::sync::{SyncBatchFailure, SyncReport};

/// Summary of a complete run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Number of search targets attempted.
    pub targets_searched: usize,

    /// Targets skipped after an error.
    pub targets_failed: usize,

    /// Targets skipped because of rate limiting.
    pub targets_rate_limited: usize,

    /// Raw hits, duplicates included.
    pub hits_fetched: usize,

    /// Unique repositories before truncation.
    pub repositories_deduplicated: usize,

    /// Repositories kept after ranking.
    pub repositories_ranked: usize,

    pub rows_created: usize,
    pub rows_updated: usize,
    pub rows_unchanged: usize,
    pub rows_failed: usize,

    /// Batches that could not be written.
    pub failed_batches: Vec<SyncBatchFailure>,

    /// Whether a sync ran at all.
    pub sync_attempted: bool,

    /// Whether this was a dry run.
    pub dry_run: bool,
}

impl RunSummary {
    /// Creates a new empty summary.
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    /// Records search statistics.
    pub fn record_fetch(&mut self, report: &FetchReport) {
        self.targets_searched += report.targets_searched;
        self.targets_failed += report.targets_failed;
        self.targets_rate_limited += report.targets_rate_limited;
        self.hits_fetched += report.hits.len();
    }

    /// Records deduplication and ranking counts.
    pub fn record_aggregation(&mut self, deduplicated: usize, ranked: usize) {
        self.repositories_deduplicated = deduplicated;
        self.repositories_ranked = ranked;
    }

    /// Records the result of a sync.
    pub fn record_sync(&mut self, report: &SyncReport) {
        self.sync_attempted = true;
        self.rows_created += report.created;
        self.rows_updated += report.updated;
        self.rows_unchanged += report.unchanged;
        self.rows_failed += report.failed;
        self.failed_batches.extend(report.failures.iter().cloned());
    }

    /// Returns true if any search target was skipped.
    #[must_use]
    pub fn has_fetch_failures(&self) -> bool {
        self.targets_failed > 0 || self.targets_rate_limited > 0
    }

    /// Outcome of the sync step; `Clean` when no sync ran.
    #[must_use]
    pub fn outcome(&self) -> SyncOutcome {
        if self.failed_batches.is_empty() {
            SyncOutcome::Clean
        } else if self.rows_created + self.rows_updated > 0 {
            SyncOutcome::Partial
        } else {
            SyncOutcome::Failed
        }
    }
}
