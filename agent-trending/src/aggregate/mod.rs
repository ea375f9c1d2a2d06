//! Merges raw search hits into the ranked trending dataset.
//!
//! Deduplication is keyed by `full_name`. When the same repository is seen
//! several times, the last sighting's field values are kept and every label
//! is unioned. Fetches for different targets can finish at slightly
//! different times, so "last" is observation order; when that order is
//! itself arbitrary the chosen values are too, and this is accepted.
//!
//! Ranking is independent of input order: the score and the tie-break chain
//! (forks, then name) form a total order over distinct names.

mod record;

pub use record::{repository_url, RepoRecord};

use crate::fetch::RawHit;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

/// Score bonus for every label beyond the first.
const CROSS_MATCH_BONUS: u64 = 2;

/// Ranking score: stars plus a bonus for each additional matching label.
#[must_use]
pub fn score(stars: u64, matched_labels: usize) -> u64 {
    let extra = matched_labels.saturating_sub(1) as u64;
    stars.saturating_add(CROSS_MATCH_BONUS.saturating_mul(extra))
}

/// Ordering used for ranking: score desc, forks desc, `full_name` asc.
#[must_use]
pub fn ranking_order(a: &RepoRecord, b: &RepoRecord) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| b.forks.cmp(&a.forks))
        .then_with(|| a.full_name.cmp(&b.full_name))
}

/// Groups hits by `full_name`, keeping first-seen order.
pub fn deduplicate(hits: impl IntoIterator<Item = RawHit>) -> Vec<RepoRecord> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut records: Vec<RepoRecord> = Vec::new();

    for hit in hits {
        match index.get(&hit.full_name) {
            Some(&i) => records[i].absorb(hit),
            None => {
                index.insert(hit.full_name.clone(), records.len());
                records.push(RepoRecord::from_hit(hit));
            }
        }
    }

    debug!(unique = records.len(), "Deduplicated hits");
    records
}

/// Sorts records by [`ranking_order`] and keeps the first `limit`.
pub fn rank(mut records: Vec<RepoRecord>, limit: usize) -> Vec<RepoRecord> {
    for record in &mut records {
        record.refresh_score();
    }
    records.sort_by(ranking_order);
    records.truncate(limit);
    records
}

/// Deduplicates and ranks in one step.
pub fn aggregate(hits: impl IntoIterator<Item = RawHit>, limit: usize) -> Vec<RepoRecord> {
    rank(deduplicate(hits), limit)
}
