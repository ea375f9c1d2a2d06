//! Static site rendering using Handlebars.
//!
//! The page is a single `index.html` with one card per repository in
//! dataset order. Search and language filtering run client-side over data
//! attributes, so no repository data is ever injected into script.

mod error;

pub use error::RenderError;

use crate::aggregate::RepoRecord;
use crate::dataset::TrendingDataset;
use handlebars::{handlebars_helper, Handlebars};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const SITE_TEMPLATE: &str = include_str!("site.hbs");
const SITE_TEMPLATE_NAME: &str = "site";

/// Topics shown per card.
const CARD_TOPIC_LIMIT: usize = 5;

/// Language filter buttons shown above the grid.
const LANGUAGE_FILTER_LIMIT: usize = 6;

/// Formats a count the way the cards show it: `999`, `1.2k`, `35.0k`.
#[must_use]
pub fn format_number(n: u64) -> String {
    if n >= 1000 {
        format!("{:.1}k", n as f64 / 1000.0)
    } else {
        n.to_string()
    }
}

handlebars_helper!(format_number_helper: |n: u64| format_number(n));

/// Renders trending datasets into a static page.
pub struct SiteRenderer {
    handlebars: Handlebars<'static>,
}

impl SiteRenderer {
    /// Creates a renderer with the built-in page template.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Template`] if the template fails to parse.
    pub fn new() -> Result<Self, RenderError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_helper("format_number", Box::new(format_number_helper));
        handlebars.register_template_string(SITE_TEMPLATE_NAME, SITE_TEMPLATE)?;
        Ok(Self { handlebars })
    }

    /// Renders the page to a string.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Render`] if rendering fails.
    pub fn render(&self, dataset: &TrendingDataset) -> Result<String, RenderError> {
        Ok(self
            .handlebars
            .render(SITE_TEMPLATE_NAME, &PageView::new(dataset))?)
    }

    /// Renders the page into `<out_dir>/index.html`, creating the directory.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if rendering or writing fails.
    pub fn write(&self, dataset: &TrendingDataset, out_dir: &Path) -> Result<PathBuf, RenderError> {
        let html = self.render(dataset)?;
        let path = out_dir.join("index.html");
        let io_error = |source| RenderError::Io {
            path: path.display().to_string(),
            source,
        };

        fs::create_dir_all(out_dir).map_err(io_error)?;
        fs::write(&path, html).map_err(io_error)?;

        info!(path = %path.display(), repositories = dataset.repositories.len(), "Rendered site");
        Ok(path)
    }
}

#[derive(Serialize)]
struct PageView<'a> {
    total_count: usize,
    total_stars: String,
    fetched_date: String,
    languages: Vec<LanguageView>,
    repositories: Vec<CardView<'a>>,
}

#[derive(Serialize)]
struct LanguageView {
    key: String,
    label: String,
    count: usize,
}

#[derive(Serialize)]
struct CardView<'a> {
    name: &'a str,
    owner: &'a str,
    url: &'a str,
    description: Option<&'a str>,
    stars: u64,
    forks: u64,
    language: Option<&'a str>,
    language_key: String,
    language_class: &'static str,
    topics: &'a [String],
    matched_queries: Vec<&'a str>,
    score: u64,
    search_text: String,
}

impl<'a> PageView<'a> {
    fn new(dataset: &'a TrendingDataset) -> Self {
        Self {
            total_count: dataset.repositories.len(),
            total_stars: group_thousands(dataset.total_stars()),
            fetched_date: dataset.fetched_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            languages: top_languages(&dataset.repositories),
            repositories: dataset.repositories.iter().map(CardView::new).collect(),
        }
    }
}

impl<'a> CardView<'a> {
    fn new(record: &'a RepoRecord) -> Self {
        let topics = &record.topics[..record.topics.len().min(CARD_TOPIC_LIMIT)];
        let search_text = [
            record.full_name.as_str(),
            record.description.as_str(),
            record.owner.as_str(),
        ]
        .into_iter()
        .chain(record.topics.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

        Self {
            name: &record.name,
            owner: &record.owner,
            url: &record.url,
            description: Some(record.description.as_str()).filter(|d| !d.is_empty()),
            stars: record.stars,
            forks: record.forks,
            language: record.language.as_deref(),
            language_key: language_key(record.language.as_deref()),
            language_class: language_class(record.language.as_deref()),
            topics,
            matched_queries: record.matched_queries.iter().map(String::as_str).collect(),
            score: record.score,
            search_text,
        }
    }
}

fn language_key(language: Option<&str>) -> String {
    language.map_or_else(|| "unknown".to_string(), str::to_lowercase)
}

fn language_class(language: Option<&str>) -> &'static str {
    match language {
        Some("JavaScript") => "lang-javascript",
        Some("Python") => "lang-python",
        Some("TypeScript") => "lang-typescript",
        Some("Go") => "lang-go",
        Some("Rust") => "lang-rust",
        Some("Java") => "lang-java",
        Some("C++") => "lang-cpp",
        Some("Ruby") => "lang-ruby",
        _ => "lang-default",
    }
}

/// Most common languages, by count then name.
fn top_languages(records: &[RepoRecord]) -> Vec<LanguageView> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for language in records.iter().filter_map(|r| r.language.as_deref()) {
        *counts.entry(language).or_default() += 1;
    }

    let mut languages: Vec<(&str, usize)> = counts.into_iter().collect();
    languages.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    languages
        .into_iter()
        .take(LANGUAGE_FILTER_LIMIT)
        .map(|(label, count)| LanguageView {
            key: language_key(Some(label)),
            label: label.to_string(),
            count,
        })
        .collect()
}

/// `1234567` -> `1,234,567`.
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::RawHit;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn record(full_name: &str, stars: u64, description: &str, language: Option<&str>) -> RepoRecord {
        let (owner, name) = full_name.split_once('/').unwrap();
        RepoRecord::from_hit(RawHit {
            label: "ai-agent".to_string(),
            full_name: full_name.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            stars,
            forks: 42,
            language: language.map(str::to_string),
            owner: owner.to_string(),
            topics: (0..8).map(|i| format!("topic{i}")).collect(),
            last_updated: None,
        })
    }

    fn dataset(records: Vec<RepoRecord>) -> TrendingDataset {
        TrendingDataset::new(Utc.with_ymd_and_hms(2026, 10, 16, 8, 30, 0).unwrap(), records)
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1.0k");
        assert_eq!(format_number(1234), "1.2k");
        assert_eq!(format_number(35_060), "35.1k");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn can_render_cards_in_order() {
        let renderer = SiteRenderer::new().unwrap();
        let html = renderer
            .render(&dataset(vec![
                record("acme/first", 1500, "First agent", Some("Python")),
                record("solo/second", 20, "", None),
            ]))
            .unwrap();

        let first = html.find("https://github.com/acme/first").unwrap();
        let second = html.find("https://github.com/solo/second").unwrap();
        assert!(first < second);
        assert!(html.contains("1.5k"));
        assert!(html.contains("1,520"));
        assert!(html.contains("2026-10-16 08:30 UTC"));
        assert!(html.contains("暂无描述"));
        assert!(html.contains("language-dot lang-python"));
        assert!(html.contains("data-filter=\"python\""));
        assert!(html.contains("<span class=\"topic\">topic4</span>"));
        assert!(!html.contains("<span class=\"topic\">topic5</span>"));
    }

    #[test]
    fn escapes_repository_text() {
        let renderer = SiteRenderer::new().unwrap();
        let html = renderer
            .render(&dataset(vec![record(
                "evil/repo",
                1,
                "<script>alert(1)</script>",
                None,
            )]))
            .unwrap();

        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn empty_dataset_renders() {
        let renderer = SiteRenderer::new().unwrap();
        let html = renderer.render(&dataset(Vec::new())).unwrap();
        assert!(html.contains("没有找到匹配的项目"));
        assert!(!html.contains("class=\"repo-card\""));
    }

    #[test]
    fn can_write_index_html() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("docs");
        let renderer = SiteRenderer::new().unwrap();

        let path = renderer
            .write(&dataset(vec![record("a/x", 1, "d", Some("Rust"))]), &out)
            .unwrap();

        assert_eq!(path, out.join("index.html"));
        assert!(fs::read_to_string(path).unwrap().contains("a/x"));
    }
}
