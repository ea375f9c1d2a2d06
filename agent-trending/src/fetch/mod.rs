//! Repository search across the configured queries and topics.
//!
//! Each target is paged independently up to its ceiling. A failure of one
//! target (rate limit, rejected request, unreadable page) is logged and
//! skipped; the remaining targets still run.

mod error;
mod github;
mod hit;

pub use error::FetchError;
pub use github::GitHubSearch;
pub use hit::RawHit;

use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::future::Future;
use tracing::{debug, info, info_span, warn, Instrument};

/// Maximum results the search API serves for a single query.
pub const MAX_SEARCH_RESULTS: usize = 1000;

/// Maximum page size of the search API.
pub const MAX_PER_PAGE: usize = 100;

/// Kind of search target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// Free-text query.
    Query,
    /// Topic tag.
    Topic,
}

/// A query or topic to search, with its result ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTarget {
    pub kind: TargetKind,
    pub term: String,
    pub limit: usize,
}

impl SearchTarget {
    /// Creates a free-text query target.
    pub fn query(term: impl Into<String>, limit: usize) -> Self {
        Self {
            kind: TargetKind::Query,
            term: term.into(),
            limit,
        }
    }

    /// Creates a topic target.
    pub fn topic(term: impl Into<String>, limit: usize) -> Self {
        Self {
            kind: TargetKind::Topic,
            term: term.into(),
            limit,
        }
    }

    /// Label recorded in `matched_queries`; also the search qualifier.
    #[must_use]
    pub fn label(&self) -> String {
        match self.kind {
            TargetKind::Query => self.term.clone(),
            TargetKind::Topic => format!("topic:{}", self.term),
        }
    }
}

/// One page of raw search items.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    /// Total matches reported by the platform.
    pub total_count: u64,

    /// Raw items, normalized later one by one.
    pub items: Vec<Value>,
}

/// Source of repository search pages.
pub trait SearchSource {
    /// Fetches one page (1-based) of repositories matching `qualifier`,
    /// sorted by stars descending.
    fn search_page(
        &self,
        qualifier: &str,
        page: u32,
        per_page: u8,
    ) -> impl Future<Output = Result<SearchPage, FetchError>> + Send;
}

/// Outcome of searching every target.
#[derive(Debug, Default)]
pub struct FetchReport {
    /// Hits in target order, duplicates included.
    pub hits: Vec<RawHit>,
    pub targets_searched: usize,
    pub targets_failed: usize,
    pub targets_rate_limited: usize,
}

/// Searches every target, running up to `concurrency` at once.
///
/// Results are collected in target order, though callers must not rely on
/// it for correctness.
pub async fn fetch_hits<S>(source: &S, targets: &[SearchTarget], concurrency: usize) -> FetchReport
where
    S: SearchSource + Sync,
{
    info!(
        targets = targets.len(),
        concurrency, "Searching repositories"
    );

    let results: Vec<(&SearchTarget, Result<Vec<RawHit>, FetchError>)> = stream::iter(targets)
        .map(|target| async move { (target, fetch_target(source, target).await) })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut report = FetchReport {
        targets_searched: results.len(),
        ..Default::default()
    };

    for (target, result) in results {
        match result {
            Ok(hits) => {
                info!(target = %target.label(), count = hits.len(), "Target searched");
                report.hits.extend(hits);
            }
            Err(e) if e.is_rate_limited() => {
                warn!(target = %target.label(), error = %e, "Target skipped, rate limited");
                report.targets_rate_limited += 1;
            }
            Err(e) => {
                warn!(target = %target.label(), error = %e, "Target skipped");
                report.targets_failed += 1;
            }
        }
    }

    info!(hits = report.hits.len(), "Search complete");
    report
}

/// Pages through one target until its ceiling or the end of results.
///
/// Items that fail normalization are skipped with a warning. Any page-level
/// error aborts the target and discards what it collected so far.
///
/// # Errors
///
/// Returns [`FetchError`] if any page request fails.
pub async fn fetch_target<S>(source: &S, target: &SearchTarget) -> Result<Vec<RawHit>, FetchError>
where
    S: SearchSource,
{
    let label = target.label();
    let span = info_span!("search", target = %label);

    async {
        let limit = target.limit.min(MAX_SEARCH_RESULTS);
        let per_page = limit.min(MAX_PER_PAGE);
        let mut hits = Vec::new();
        if per_page == 0 {
            return Ok(hits);
        }

        let mut seen = 0usize;
        let mut page = 1u32;
        loop {
            debug!(page, per_page, "Requesting page");
            let result = source.search_page(&label, page, per_page as u8).await?;
            let received = result.items.len();
            seen += received;

            for item in result.items {
                match RawHit::from_item(item, &label) {
                    Ok(hit) => hits.push(hit),
                    Err(e) => warn!(error = %e, "Skipping malformed search item"),
                }
            }

            if received < per_page || seen >= limit || seen as u64 >= result.total_count {
                break;
            }
            page += 1;
        }

        hits.truncate(limit);
        Ok(hits)
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned pages per qualifier and records every request.
    #[derive(Default)]
    struct FakeSource {
        pages: HashMap<String, Vec<SearchPage>>,
        errors: HashMap<String, fn(&str) -> FetchError>,
        requests: Mutex<Vec<(String, u32, u8)>>,
    }

    impl FakeSource {
        fn with_pages(mut self, qualifier: &str, pages: Vec<SearchPage>) -> Self {
            self.pages.insert(qualifier.to_string(), pages);
            self
        }

        fn with_error(mut self, qualifier: &str, error: fn(&str) -> FetchError) -> Self {
            self.errors.insert(qualifier.to_string(), error);
            self
        }
    }

    impl SearchSource for FakeSource {
        async fn search_page(
            &self,
            qualifier: &str,
            page: u32,
            per_page: u8,
        ) -> Result<SearchPage, FetchError> {
            self.requests
                .lock()
                .unwrap()
                .push((qualifier.to_string(), page, per_page));
            if let Some(error) = self.errors.get(qualifier) {
                return Err(error(qualifier));
            }
            Ok(self
                .pages
                .get(qualifier)
                .and_then(|pages| pages.get(page as usize - 1))
                .cloned()
                .unwrap_or_default())
        }
    }

    fn item(full_name: &str, stars: u64) -> Value {
        json!({ "full_name": full_name, "stargazers_count": stars })
    }

    fn page(total_count: u64, names: &[&str]) -> SearchPage {
        SearchPage {
            total_count,
            items: names.iter().map(|n| item(n, 1)).collect(),
        }
    }

    #[tokio::test]
    async fn pages_until_limit() {
        let source = FakeSource::default().with_pages(
            "ai-agent",
            vec![
                page(500, &["a/1", "a/2"]),
                page(500, &["a/3", "a/4"]),
                page(500, &["a/5", "a/6"]),
            ],
        );
        let target = SearchTarget::query("ai-agent", 2);

        let hits = fetch_target(&source, &target).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(source.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stops_on_short_page() {
        let source = FakeSource::default().with_pages(
            "topic:llm",
            vec![
                page(500, &["a/1", "a/2", "a/3"]),
                page(500, &["a/4"]),
                page(500, &["a/5", "a/6", "a/7"]),
            ],
        );
        let target = SearchTarget::topic("llm", 10);

        // per_page is min(limit, 100) = 10, so the first 3-item page is short.
        let hits = fetch_target(&source, &target).await.unwrap();

        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|h| h.label == "topic:llm"));
    }

    #[tokio::test]
    async fn pages_beyond_first_when_full() {
        let names: Vec<String> = (0..150).map(|i| format!("o/r{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let source = FakeSource::default().with_pages(
            "ai-agent",
            vec![page(150, &refs[..100]), page(150, &refs[100..])],
        );

        let hits = fetch_target(&source, &SearchTarget::query("ai-agent", 1000))
            .await
            .unwrap();

        assert_eq!(hits.len(), 150);
        let requests = source.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1], ("ai-agent".to_string(), 2, 100));
    }

    #[tokio::test]
    async fn skips_malformed_items() {
        let source = FakeSource::default().with_pages(
            "q",
            vec![SearchPage {
                total_count: 3,
                items: vec![item("a/1", 1), json!({ "name": "orphan" }), item("a/2", 2)],
            }],
        );

        let hits = fetch_target(&source, &SearchTarget::query("q", 20))
            .await
            .unwrap();

        let names: Vec<&str> = hits.iter().map(|h| h.full_name.as_str()).collect();
        assert_eq!(names, vec!["a/1", "a/2"]);
    }

    #[tokio::test]
    async fn failing_targets_do_not_abort_others() {
        let source = FakeSource::default()
            .with_pages("good", vec![page(1, &["a/1"])])
            .with_error("limited", |t| FetchError::RateLimited {
                target: t.to_string(),
            })
            .with_error("broken", |_| FetchError::Malformed {
                message: "truncated body".to_string(),
            })
            .with_pages("topic:also-good", vec![page(1, &["b/1"])]);
        let targets = vec![
            SearchTarget::query("limited", 20),
            SearchTarget::query("good", 20),
            SearchTarget::query("broken", 20),
            SearchTarget::topic("also-good", 20),
        ];

        let report = fetch_hits(&source, &targets, 2).await;

        assert_eq!(report.targets_searched, 4);
        assert_eq!(report.targets_rate_limited, 1);
        assert_eq!(report.targets_failed, 1);
        let names: Vec<&str> = report.hits.iter().map(|h| h.full_name.as_str()).collect();
        assert_eq!(names, vec!["a/1", "b/1"]);
    }

    #[tokio::test]
    async fn no_targets_yield_empty_report() {
        let source = FakeSource::default();
        let report = fetch_hits(&source, &[], 1).await;
        assert!(report.hits.is_empty());
        assert_eq!(report.targets_searched, 0);
    }
}
