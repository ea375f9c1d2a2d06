//! GitHub repository search through octocrab.

use crate::fetch::{FetchError, SearchPage, SearchSource};
use crate::rate_limit::ensure_search_rate_limit;
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Search source backed by the GitHub REST API.
#[derive(Clone)]
pub struct GitHubSearch {
    octocrab: Octocrab,
}

#[derive(Debug, Serialize)]
struct SearchParams<'a> {
    q: &'a str,
    sort: &'static str,
    order: &'static str,
    per_page: u8,
    page: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    total_count: u64,
    #[serde(default)]
    incomplete_results: bool,
    #[serde(default)]
    items: Vec<Value>,
}

impl GitHubSearch {
    /// Builds a client, authenticated when a token is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(token: Option<&str>) -> Result<Self, octocrab::Error> {
        let mut builder = Octocrab::builder();
        if let Some(token) = token {
            builder = builder.personal_token(token.to_string());
        }
        Ok(Self {
            octocrab: builder.build()?,
        })
    }
}

impl SearchSource for GitHubSearch {
    async fn search_page(
        &self,
        qualifier: &str,
        page: u32,
        per_page: u8,
    ) -> Result<SearchPage, FetchError> {
        if let Err(e) = ensure_search_rate_limit(&self.octocrab).await {
            warn!(error = %e, "Failed to check search rate limit, continuing");
        }

        let params = SearchParams {
            q: qualifier,
            sort: "stars",
            order: "desc",
            per_page,
            page,
        };
        let response: SearchResponse = self
            .octocrab
            .get("/search/repositories", Some(&params))
            .await
            .map_err(|e| FetchError::from_octocrab(e, qualifier))?;

        if response.incomplete_results {
            debug!(qualifier, page, "Search returned incomplete results");
        }

        Ok(SearchPage {
            total_count: response.total_count,
            items: response.items,
        })
    }
}
