//! Runner configuration.

use crate::config::{TrendingConfig, WorkspaceCredentials};
use std::path::{Path, PathBuf};

/// Configuration for one invocation of the pipeline.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Search, ranking and sync settings.
    settings: TrendingConfig,
    /// Dataset file written by fetch and read by render and sync.
    dataset_path: PathBuf,
    /// Directory the site is rendered into.
    site_dir: PathBuf,
    /// GitHub token; unauthenticated search when absent.
    github_token: Option<String>,
    /// Table credentials; required for sync only.
    credentials: Option<WorkspaceCredentials>,
    /// Whether to plan the sync without writing.
    dry_run: bool,
}

impl RunnerConfig {
    /// Creates a configuration with the default site directory (`docs`).
    pub fn new(settings: TrendingConfig, dataset_path: PathBuf) -> Self {
        Self {
            settings,
            dataset_path,
            site_dir: PathBuf::from("docs"),
            github_token: None,
            credentials: None,
            dry_run: false,
        }
    }

    /// Sets the site output directory.
    pub fn with_site_dir(mut self, site_dir: PathBuf) -> Self {
        self.site_dir = site_dir;
        self
    }

    /// Sets the GitHub token.
    pub fn with_github_token(mut self, token: Option<String>) -> Self {
        self.github_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Sets the table credentials.
    pub fn with_credentials(mut self, credentials: WorkspaceCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Enables or disables dry-run sync.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Returns the settings.
    pub fn settings(&self) -> &TrendingConfig {
        &self.settings
    }

    /// Returns the dataset file path.
    pub fn dataset_path(&self) -> &Path {
        &self.dataset_path
    }

    /// Returns the site output directory.
    pub fn site_dir(&self) -> &Path {
        &self.site_dir
    }

    /// Returns the GitHub token, if any.
    pub fn github_token(&self) -> Option<&str> {
        self.github_token.as_deref()
    }

    /// Returns the table credentials, if any.
    pub fn credentials(&self) -> Option<&WorkspaceCredentials> {
        self.credentials.as_ref()
    }

    /// Returns whether dry-run mode is enabled.
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }
}
