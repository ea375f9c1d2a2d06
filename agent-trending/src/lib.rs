#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

pub mod aggregate;
pub mod config;
pub mod dataset;
pub mod feishu;
pub mod fetch;
pub mod rate_limit;
pub mod render;
pub mod runner;
pub mod summary;
pub mod sync;

pub use aggregate::{aggregate, deduplicate, rank, ranking_order, score, RepoRecord};
pub use config::{
    load_config, AppCredentials, ConfigError, FieldNames, SyncSettings, TrendingConfig,
    WorkspaceCredentials,
};
pub use dataset::{DatasetError, TrendingDataset};
pub use feishu::{bootstrap_table, BootstrapResult, FeishuClient, FeishuTable};
pub use fetch::{
    fetch_hits, fetch_target, FetchError, FetchReport, GitHubSearch, RawHit, SearchPage,
    SearchSource, SearchTarget,
};
pub use rate_limit::{
    check_search_rate_limit, ensure_search_rate_limit, wait_if_needed, RateLimitInfo,
};
pub use render::{RenderError, SiteRenderer};
pub use runner::{collect_dataset, Runner, RunnerConfig, RunnerError};
pub use summary::{RunSummary, SyncOutcome};
pub use sync::{
    sync_records, BatchKind, BatchState, FieldMap, RecordUpdate, RemoteRecord, RemoteRow,
    RemoteSnapshot, RetryPolicy, RowPage, SyncBatchFailure, SyncError, SyncOptions, SyncPlan,
    SyncReport, Workspace, WorkspaceError,
};
