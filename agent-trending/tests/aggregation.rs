use std::collections::HashSet;
use std::path::{Path, PathBuf};

use agent_trending::{
    collect_dataset, load_config, ranking_order, FetchError, RunSummary, SearchPage,
    SearchSource, SiteRenderer, TrendingConfig, TrendingDataset,
};
use serde_json::Value;
use tempfile::TempDir;

fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Serves one recorded search page per qualifier from `tests/fixtures/search`.
struct FixtureSource {
    dir: PathBuf,
}

impl SearchSource for FixtureSource {
    async fn search_page(
        &self,
        qualifier: &str,
        page: u32,
        _per_page: u8,
    ) -> Result<SearchPage, FetchError> {
        if page > 1 {
            return Ok(SearchPage::default());
        }
        let file = self.dir.join(format!("{}.json", qualifier.replace(':', "-")));
        let body: Value = serde_json::from_str(&std::fs::read_to_string(file).unwrap()).unwrap();
        Ok(SearchPage {
            total_count: body["total_count"].as_u64().unwrap(),
            items: body["items"].as_array().unwrap().clone(),
        })
    }
}

fn settings() -> TrendingConfig {
    load_config(Some(&fixtures_root().join("trending.toml"))).unwrap()
}

async fn collect(settings: &TrendingConfig) -> (TrendingDataset, RunSummary) {
    let source = FixtureSource {
        dir: fixtures_root().join("search"),
    };
    let mut summary = RunSummary::new(false);
    let dataset = collect_dataset(&source, settings, &mut summary).await;
    (dataset, summary)
}

#[tokio::test]
async fn collects_and_ranks_fixture_searches() {
    let (dataset, summary) = collect(&settings()).await;

    let names: Vec<&str> = dataset
        .repositories
        .iter()
        .map(|r| r.full_name.as_str())
        .collect();
    assert_eq!(names, vec!["acme/agent-kit", "lab/llm-tools", "solo/bot", "a/x"]);
    assert_eq!(dataset.total_count, 4);

    assert_eq!(summary.targets_searched, 2);
    assert_eq!(summary.hits_fetched, 6);
    assert_eq!(summary.repositories_deduplicated, 4);
}

#[tokio::test]
async fn later_sightings_win_and_labels_merge() {
    let (dataset, _) = collect(&settings()).await;

    let record = dataset
        .repositories
        .iter()
        .find(|r| r.full_name == "a/x")
        .unwrap();
    assert_eq!(record.stars, 12);
    assert_eq!(record.topics, vec!["agent"]);
    assert_eq!(
        record.matched_queries.iter().collect::<Vec<_>>(),
        vec!["ai-agent", "topic:llm"]
    );
    assert_eq!(record.score, 14);
    assert_eq!(record.url, "https://github.com/a/x");
}

#[tokio::test]
async fn output_satisfies_ranking_invariants() {
    let (dataset, _) = collect(&settings()).await;

    let unique: HashSet<&str> = dataset
        .repositories
        .iter()
        .map(|r| r.full_name.as_str())
        .collect();
    assert_eq!(unique.len(), dataset.repositories.len());

    for pair in dataset.repositories.windows(2) {
        assert_ne!(
            ranking_order(&pair[0], &pair[1]),
            std::cmp::Ordering::Greater
        );
    }
}

#[tokio::test]
async fn limit_truncates_after_ranking() {
    let mut settings = settings();
    settings.limit = 2;

    let (dataset, summary) = collect(&settings).await;

    assert_eq!(dataset.repositories.len(), 2);
    assert_eq!(summary.repositories_deduplicated, 4);
    assert_eq!(summary.repositories_ranked, 2);
}

#[tokio::test]
async fn dataset_round_trips_through_render() {
    let (dataset, _) = collect(&settings()).await;
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("trending.json");

    dataset.save(&path).unwrap();
    let loaded = TrendingDataset::load(&path).unwrap();
    let html = SiteRenderer::new()
        .unwrap()
        .write(&loaded, &dir.path().join("docs"))
        .unwrap();

    let page = std::fs::read_to_string(html).unwrap();
    assert!(page.contains("https://github.com/acme/agent-kit"));
    assert!(page.contains("1.2k"));
}

#[test]
fn fixture_settings_parse() {
    let settings = settings();
    assert_eq!(settings.targets().len(), 2);
    assert_eq!(settings.sync.batch_size, 2);
    assert!(load_config(Some(Path::new("does/not/exist.toml"))).is_err());
}
