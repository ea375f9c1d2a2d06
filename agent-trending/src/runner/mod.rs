//! Orchestrates fetch, render and sync.

mod config;
mod error;

pub use config::RunnerConfig;
pub use error::RunnerError;

use crate::aggregate::{deduplicate, rank};
use crate::config::{
    ConfigError, TrendingConfig, APP_ID_ENV, APP_SECRET_ENV, BASE_ID_ENV, TABLE_ID_ENV,
};
use crate::dataset::TrendingDataset;
use crate::feishu::FeishuClient;
use crate::fetch::{fetch_hits, GitHubSearch, SearchSource};
use crate::render::SiteRenderer;
use crate::summary::RunSummary;
use crate::sync::{sync_records, SyncReport};

use chrono::Utc;
use std::path::PathBuf;
use tracing::{info, warn};

/// Searches every configured target and ranks the results.
///
/// Failed targets are counted in `summary` and otherwise ignored.
pub async fn collect_dataset<S>(
    source: &S,
    settings: &TrendingConfig,
    summary: &mut RunSummary,
) -> TrendingDataset
where
    S: SearchSource + Sync,
{
    let targets = settings.targets();
    let report = fetch_hits(source, &targets, settings.concurrency).await;
    summary.record_fetch(&report);
    if report.targets_searched > 0 && report.hits.is_empty() {
        warn!("Search returned no repositories");
    }

    let unique = deduplicate(report.hits);
    let deduplicated = unique.len();
    let ranked = rank(unique, settings.limit);
    summary.record_aggregation(deduplicated, ranked.len());
    info!(deduplicated, ranked = ranked.len(), "Ranked repositories");

    TrendingDataset::new(Utc::now(), ranked)
}

/// Runs pipeline steps against one configuration.
pub struct Runner {
    config: RunnerConfig,
    renderer: SiteRenderer,
}

impl Runner {
    /// Builds a runner from the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Render`] if the site template is invalid.
    pub fn new(config: RunnerConfig) -> Result<Self, RunnerError> {
        Ok(Self {
            config,
            renderer: SiteRenderer::new()?,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Searches GitHub, ranks the results and saves the dataset.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] if the client cannot be built or the dataset
    /// cannot be saved.
    pub async fn fetch(&self, summary: &mut RunSummary) -> Result<TrendingDataset, RunnerError> {
        if self.config.github_token().is_none() {
            warn!("No GitHub token configured; unauthenticated search limits apply");
        }
        let source = GitHubSearch::new(self.config.github_token())?;
        let dataset = collect_dataset(&source, self.config.settings(), summary).await;
        dataset.save(self.config.dataset_path())?;
        Ok(dataset)
    }

    /// Loads the dataset written by a previous fetch.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Dataset`] if the file is missing or invalid.
    pub fn load_dataset(&self) -> Result<TrendingDataset, RunnerError> {
        info!(path = %self.config.dataset_path().display(), "Loading dataset");
        Ok(TrendingDataset::load(self.config.dataset_path())?)
    }

    /// Renders the site for `dataset`.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Render`] if rendering or writing fails.
    pub fn render(&self, dataset: &TrendingDataset) -> Result<PathBuf, RunnerError> {
        Ok(self.renderer.write(dataset, self.config.site_dir())?)
    }

    /// Mirrors `dataset` into the configured table.
    ///
    /// An empty dataset returns a clean report without contacting the table.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] if credentials are missing, authentication
    /// fails, or the table snapshot cannot be read.
    pub async fn sync(
        &self,
        dataset: &TrendingDataset,
        summary: &mut RunSummary,
    ) -> Result<SyncReport, RunnerError> {
        let credentials = self
            .config
            .credentials()
            .ok_or(ConfigError::MissingCredential {
                names: vec![APP_ID_ENV, APP_SECRET_ENV, BASE_ID_ENV, TABLE_ID_ENV],
            })?;
        let sync_settings = &self.config.settings().sync;
        let mut options = sync_settings.sync_options(self.config.dry_run());

        if dataset.is_empty() {
            info!("Dataset is empty, nothing to sync");
            let report = SyncReport {
                dry_run: options.dry_run,
                ..Default::default()
            };
            summary.record_sync(&report);
            return Ok(report);
        }

        let client = FeishuClient::connect(credentials.app(), &sync_settings.api_base).await?;
        let table = client.table(credentials.base_id(), credentials.table_id());

        if options.dry_run {
            info!("[DRY RUN] Skipping column check");
        } else {
            match table.ensure_fields(&options.fields).await {
                Ok(columns) => options.available_columns = Some(columns.present),
                Err(e) => warn!(error = %e, "Could not check table columns"),
            }
        }

        let report = sync_records(&table, &dataset.repositories, &options).await?;
        summary.record_sync(&report);
        Ok(report)
    }

    /// Executes fetch, render and, when `sync` is set, sync.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] from the first step that fails critically.
    pub async fn run(&self, sync: bool) -> Result<RunSummary, RunnerError> {
        let mut summary = RunSummary::new(self.config.dry_run());

        let dataset = self.fetch(&mut summary).await?;
        self.render(&dataset)?;
        if sync {
            self.sync(&dataset, &mut summary).await?;
        }

        Ok(summary)
    }
}
