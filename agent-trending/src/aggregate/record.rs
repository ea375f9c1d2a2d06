//! The canonical repository record.

use crate::fetch::RawHit;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One discovered repository after deduplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoRecord {
    /// Identity key in `owner/name` form; case-sensitive.
    pub full_name: String,

    /// Repository short name.
    pub name: String,

    pub description: String,
    pub stars: u64,
    pub forks: u64,
    pub language: Option<String>,

    /// Web link, derived from `full_name`.
    pub url: String,

    /// Owner login.
    pub owner: String,

    #[serde(default)]
    pub topics: Vec<String>,

    /// Every query or topic label that surfaced this repository.
    pub matched_queries: BTreeSet<String>,

    /// Ranking score; see [`crate::aggregate::score`].
    pub score: u64,

    pub last_updated: Option<DateTime<Utc>>,
}

impl RepoRecord {
    /// Starts a record from its first sighting.
    #[must_use]
    pub fn from_hit(hit: RawHit) -> Self {
        let mut matched_queries = BTreeSet::new();
        matched_queries.insert(hit.label);
        let mut record = Self {
            url: repository_url(&hit.full_name),
            full_name: hit.full_name,
            name: hit.name,
            description: hit.description,
            stars: hit.stars,
            forks: hit.forks,
            language: hit.language,
            owner: hit.owner,
            topics: hit.topics,
            matched_queries,
            score: 0,
            last_updated: hit.last_updated,
        };
        record.refresh_score();
        record
    }

    /// Folds a later sighting of the same repository into this record.
    ///
    /// The later sighting's values win; labels accumulate.
    pub fn absorb(&mut self, hit: RawHit) {
        debug_assert_eq!(self.full_name, hit.full_name);
        self.name = hit.name;
        self.description = hit.description;
        self.stars = hit.stars;
        self.forks = hit.forks;
        self.language = hit.language;
        self.owner = hit.owner;
        self.topics = hit.topics;
        self.last_updated = hit.last_updated;
        self.matched_queries.insert(hit.label);
        self.refresh_score();
    }

    /// Recomputes `score` from the current stars and labels.
    pub fn refresh_score(&mut self) {
        self.score = super::score(self.stars, self.matched_queries.len());
    }
}

/// Canonical web link for a repository.
#[must_use]
pub fn repository_url(full_name: &str) -> String {
    format!("https://github.com/{full_name}")
}
