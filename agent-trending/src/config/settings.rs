//! Settings file deserialization and validation.

use crate::config::ConfigError;
use crate::fetch::{SearchTarget, MAX_SEARCH_RESULTS};
use crate::sync::{RetryPolicy, SyncOptions, MAX_BATCH_SIZE};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Free-text queries searched when the settings file does not override them.
pub const DEFAULT_QUERIES: &[&str] = &[
    "ai-agent",
    "llm-agent",
    "ai-skill",
    "claude-skill",
    "gpt-agent",
    "autonomous-agent",
    "ai-assistant",
    "langchain-agent",
    "autogpt",
    "agent-framework",
];

/// Topic tags searched when the settings file does not override them.
pub const DEFAULT_TOPICS: &[&str] = &[
    "ai-agent",
    "llm",
    "gpt",
    "claude",
    "autonomous-agent",
    "ai-assistant",
    "langchain",
    "openai",
    "anthropic",
];

/// Feishu Open API root.
pub const DEFAULT_API_BASE: &str = "https://open.feishu.cn/open-apis/";

/// Parsed contents of a `trending.toml` settings file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct TrendingConfig {
    /// Free-text search queries.
    pub queries: Vec<String>,

    /// Topic tags, searched as `topic:<tag>`.
    pub topics: Vec<String>,

    /// Result ceiling for each query.
    pub per_query_limit: usize,

    /// Result ceiling for each topic.
    pub per_topic_limit: usize,

    /// Number of repositories kept after ranking.
    pub limit: usize,

    /// Number of search targets fetched at once.
    pub concurrency: usize,

    /// Table sync settings.
    pub sync: SyncSettings,
}

impl Default for TrendingConfig {
    fn default() -> Self {
        Self {
            queries: DEFAULT_QUERIES.iter().map(|q| q.to_string()).collect(),
            topics: DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect(),
            per_query_limit: 20,
            per_topic_limit: 15,
            limit: 100,
            concurrency: 1,
            sync: SyncSettings::default(),
        }
    }
}

/// The `[sync]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct SyncSettings {
    /// Records per create/update request.
    pub batch_size: usize,

    /// Attempts per batch before it is reported as failed.
    pub max_attempts: u32,

    /// Delay before the first retry; doubles on each further retry.
    pub base_delay_ms: u64,

    /// Upper bound for a single retry delay.
    pub max_delay_ms: u64,

    /// Open API root (switch to `https://open.larksuite.com/open-apis/` for Lark).
    pub api_base: String,

    /// Column names in the table.
    pub fields: FieldNames,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_SIZE,
            max_attempts: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            api_base: DEFAULT_API_BASE.to_string(),
            fields: FieldNames::default(),
        }
    }
}

impl SyncSettings {
    /// Builds the retry policy for batch writes and snapshot reads.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }

    /// Builds the options passed to [`crate::sync::sync_records`].
    #[must_use]
    pub fn sync_options(&self, dry_run: bool) -> SyncOptions {
        SyncOptions {
            fields: self.fields.clone(),
            retry: self.retry_policy(),
            batch_size: self.batch_size,
            dry_run,
            available_columns: None,
        }
    }
}

/// Column names of the table, keyed by meaning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct FieldNames {
    /// Repository `owner/name`; the row key.
    pub project_name: String,
    pub description: String,
    pub stars: String,
    pub forks: String,
    pub language: String,
    pub link: String,
    pub author: String,
    pub tags: String,
    pub updated_time: String,
    /// User-owned.
    pub read_flag: String,
    /// User-owned.
    pub follow_flag: String,
    /// User-owned.
    pub notes: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            project_name: "项目名称".to_string(),
            description: "描述".to_string(),
            stars: "Stars".to_string(),
            forks: "Forks".to_string(),
            language: "语言".to_string(),
            link: "链接".to_string(),
            author: "作者".to_string(),
            tags: "标签".to_string(),
            updated_time: "更新时间".to_string(),
            read_flag: "是否已读".to_string(),
            follow_flag: "是否关注".to_string(),
            notes: "备注".to_string(),
        }
    }
}

impl FieldNames {
    /// Columns this system writes on update, excluding the key.
    #[must_use]
    pub fn system_owned(&self) -> [&str; 8] {
        [
            self.description.as_str(),
            self.stars.as_str(),
            self.forks.as_str(),
            self.language.as_str(),
            self.link.as_str(),
            self.author.as_str(),
            self.tags.as_str(),
            self.updated_time.as_str(),
        ]
    }

    /// Columns maintained by people and never written after row creation.
    #[must_use]
    pub fn user_owned(&self) -> [&str; 3] {
        [
            self.read_flag.as_str(),
            self.follow_flag.as_str(),
            self.notes.as_str(),
        ]
    }

    fn all(&self) -> Vec<&str> {
        let mut names = vec![self.project_name.as_str()];
        names.extend(self.system_owned());
        names.extend(self.user_owned());
        names
    }
}

impl TrendingConfig {
    /// Parses and validates settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TomlError`] for malformed TOML or unknown keys,
    /// and [`ConfigError::ValidationError`] for out-of-range values.
    pub fn parse(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|e| ConfigError::TomlError {
            path: path.display().to_string(),
            source: e,
        })?;
        config.validate(path)?;
        Ok(config)
    }

    /// Validates value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] describing the first problem found.
    pub fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        let fail = |message: String| {
            Err(ConfigError::ValidationError {
                path: path.display().to_string(),
                message,
            })
        };

        if self.queries.is_empty() && self.topics.is_empty() {
            return fail("at least one query or topic is required".to_string());
        }
        if self
            .queries
            .iter()
            .chain(&self.topics)
            .any(|term| term.trim().is_empty())
        {
            return fail("queries and topics must not be blank".to_string());
        }
        for (key, value) in [
            ("per-query-limit", self.per_query_limit),
            ("per-topic-limit", self.per_topic_limit),
        ] {
            if value == 0 || value > MAX_SEARCH_RESULTS {
                return fail(format!(
                    "{key} must be between 1 and {MAX_SEARCH_RESULTS}, got {value}"
                ));
            }
        }
        if self.limit == 0 {
            return fail("limit must be at least 1".to_string());
        }
        if self.concurrency == 0 {
            return fail("concurrency must be at least 1".to_string());
        }

        let sync = &self.sync;
        if sync.batch_size == 0 || sync.batch_size > MAX_BATCH_SIZE {
            return fail(format!(
                "sync.batch-size must be between 1 and {MAX_BATCH_SIZE}, got {}",
                sync.batch_size
            ));
        }
        if sync.max_attempts == 0 {
            return fail("sync.max-attempts must be at least 1".to_string());
        }
        if sync.base_delay_ms > sync.max_delay_ms {
            return fail("sync.base-delay-ms must not exceed sync.max-delay-ms".to_string());
        }
        if let Err(e) = Url::parse(&sync.api_base) {
            return fail(format!("sync.api-base '{}' is not a URL: {e}", sync.api_base));
        }

        let names = sync.fields.all();
        if names.iter().any(|name| name.trim().is_empty()) {
            return fail("sync.fields entries must not be blank".to_string());
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return fail(format!("sync.fields uses '{name}' more than once"));
            }
        }

        Ok(())
    }

    /// Expands queries and topics into search targets with their ceilings.
    #[must_use]
    pub fn targets(&self) -> Vec<SearchTarget> {
        self.queries
            .iter()
            .map(|q| SearchTarget::query(q.trim(), self.per_query_limit))
            .chain(
                self.topics
                    .iter()
                    .map(|t| SearchTarget::topic(t.trim(), self.per_topic_limit)),
            )
            .collect()
    }
}
