//! Normalization of raw search items.

use crate::fetch::FetchError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// One sighting of a repository by one search target.
#[derive(Debug, Clone, PartialEq)]
pub struct RawHit {
    /// Query or topic label that produced this hit.
    pub label: String,

    /// Repository identity in `owner/name` form.
    pub full_name: String,

    /// Repository short name.
    pub name: String,

    pub description: String,
    pub stars: u64,
    pub forks: u64,
    pub language: Option<String>,

    /// Owner login.
    pub owner: String,

    pub topics: Vec<String>,

    /// `updated_at` as reported by the platform.
    pub last_updated: Option<DateTime<Utc>>,
}

/// The subset of a repository search item we read.
#[derive(Debug, Deserialize)]
struct SearchItem {
    full_name: Option<String>,
    name: Option<String>,
    description: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    language: Option<String>,
    owner: Option<ItemOwner>,
    #[serde(default)]
    topics: Vec<String>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ItemOwner {
    login: Option<String>,
}

impl RawHit {
    /// Builds a hit from one item of a search response.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Malformed`] if the item has the wrong shape or
    /// lacks a usable `owner/name` identity.
    pub fn from_item(item: Value, label: &str) -> Result<Self, FetchError> {
        let item: SearchItem = serde_json::from_value(item).map_err(|e| FetchError::Malformed {
            message: format!("unreadable item: {e}"),
        })?;

        let full_name = item
            .full_name
            .map(|n| n.trim().to_string())
            .unwrap_or_default();
        let Some((owner_part, name_part)) = split_full_name(&full_name) else {
            return Err(FetchError::Malformed {
                message: format!("item has invalid full_name '{full_name}'"),
            });
        };

        let owner = item
            .owner
            .and_then(|o| o.login)
            .filter(|login| !login.is_empty())
            .unwrap_or(owner_part);
        let name = item
            .name
            .filter(|name| !name.is_empty())
            .unwrap_or(name_part);

        Ok(Self {
            label: label.to_string(),
            full_name,
            name,
            description: item.description.unwrap_or_default(),
            stars: item.stargazers_count,
            forks: item.forks_count,
            language: item.language.filter(|l| !l.is_empty()),
            owner,
            topics: item.topics,
            last_updated: item.updated_at,
        })
    }
}

/// Splits `owner/name`, rejecting empty halves and nested slashes.
fn split_full_name(full_name: &str) -> Option<(String, String)> {
    let (owner, name) = full_name.split_once('/')?;
    if owner.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }
    Some((owner.to_string(), name.to_string()))
}
