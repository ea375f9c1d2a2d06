//! CLI for agent-trending.
//!
//! Finds trending AI agent and skill repositories on GitHub, renders them
//! as a static page and mirrors them into a Feishu Bitable.

use agent_trending::feishu::DEFAULT_APP_NAME;
use agent_trending::{
    bootstrap_table, load_config, AppCredentials, FeishuClient, RunSummary, Runner, RunnerConfig,
    RunnerError, TrendingConfig, WorkspaceCredentials,
};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Exit code for errors that stop a run before it completes.
const CRITICAL_EXIT_CODE: u8 = 2;

/// agent-trending - Rank trending AI agent repositories and sync them to Feishu.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (TOML). Built-in defaults apply when omitted.
    #[arg(long, global = true, env = "TRENDING_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search GitHub and write the ranked dataset.
    Fetch {
        /// Dataset file to write.
        #[arg(short, long, default_value = "trending.json")]
        output: PathBuf,

        /// Override the number of repositories kept.
        #[arg(long)]
        limit: Option<usize>,

        #[command(flatten)]
        github: GitHubArgs,
    },

    /// Render the static site from a dataset.
    Render {
        /// Dataset file to read.
        #[arg(short, long, default_value = "trending.json")]
        input: PathBuf,

        /// Output directory for index.html.
        #[arg(short, long, default_value = "docs")]
        output: PathBuf,
    },

    /// Mirror a dataset into the Bitable.
    Sync {
        /// Dataset file to read.
        #[arg(short, long, default_value = "trending.json")]
        input: PathBuf,

        /// Plan the sync without writing.
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        feishu: FeishuArgs,
    },

    /// Fetch, render and sync in one go.
    Run {
        /// Dataset file to write.
        #[arg(short, long, default_value = "trending.json")]
        output: PathBuf,

        /// Output directory for index.html.
        #[arg(long, default_value = "docs")]
        site: PathBuf,

        /// Override the number of repositories kept.
        #[arg(long)]
        limit: Option<usize>,

        /// Skip the Bitable sync.
        #[arg(long)]
        no_sync: bool,

        /// Plan the sync without writing.
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        github: GitHubArgs,

        #[command(flatten)]
        feishu: FeishuArgs,
    },

    /// Create a new Bitable with the expected columns.
    Bootstrap {
        /// Name of the new base.
        #[arg(long, default_value = DEFAULT_APP_NAME)]
        name: String,

        /// Feishu app id [default: $FEISHU_APP_ID].
        #[arg(long)]
        app_id: Option<String>,

        /// Feishu app secret [default: $FEISHU_APP_SECRET].
        #[arg(long)]
        app_secret: Option<String>,
    },
}

#[derive(Args, Debug)]
struct GitHubArgs {
    /// GitHub token (falls back to GH_TOKEN).
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

impl GitHubArgs {
    fn resolve(self) -> Option<String> {
        self.token.or_else(|| std::env::var("GH_TOKEN").ok())
    }
}

/// Table credentials. Each value not given falls back to its `FEISHU_*`
/// environment variable.
#[derive(Args, Debug)]
struct FeishuArgs {
    /// Feishu app id [default: $FEISHU_APP_ID].
    #[arg(long)]
    app_id: Option<String>,

    /// Feishu app secret [default: $FEISHU_APP_SECRET].
    #[arg(long)]
    app_secret: Option<String>,

    /// Bitable base (app token) [default: $FEISHU_BASE_ID].
    #[arg(long)]
    base_id: Option<String>,

    /// Table id within the base [default: $FEISHU_TABLE_ID].
    #[arg(long)]
    table_id: Option<String>,
}

impl FeishuArgs {
    fn credentials(self) -> Result<WorkspaceCredentials, RunnerError> {
        Ok(WorkspaceCredentials::with_env_fallback(
            self.app_id,
            self.app_secret,
            self.base_id,
            self.table_id,
        )?)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    // Both octocrab and reqwest sit on rustls; pin one provider for the process.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!(error = %e, "Critical failure");
            ExitCode::from(CRITICAL_EXIT_CODE)
        }
    }
}

/// Initializes tracing with environment filter support.
///
/// Sets up the global tracing subscriber with:
/// - Compact log formatting (single-line output)
/// - Log level filtering via `RUST_LOG` env var (defaults to "info")
fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// Main execution logic. Returns the process exit code.
async fn run(cli: Cli) -> Result<u8, RunnerError> {
    let settings = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Fetch {
            output,
            limit,
            github,
        } => {
            let settings = with_limit(settings, limit)?;
            let runner = Runner::new(
                RunnerConfig::new(settings, output).with_github_token(github.resolve()),
            )?;
            let mut summary = RunSummary::new(false);
            runner.fetch(&mut summary).await?;
            print_summary(&summary);
            Ok(0)
        }
        Command::Render { input, output } => {
            let runner = Runner::new(RunnerConfig::new(settings, input).with_site_dir(output))?;
            let dataset = runner.load_dataset()?;
            let path = runner.render(&dataset)?;
            println!(
                "\nRendered {} repositories to {}",
                dataset.repositories.len(),
                path.display()
            );
            Ok(0)
        }
        Command::Sync {
            input,
            dry_run,
            feishu,
        } => {
            let credentials = feishu.credentials()?;
            let runner = Runner::new(
                RunnerConfig::new(settings, input)
                    .with_credentials(credentials)
                    .with_dry_run(dry_run),
            )?;
            let dataset = runner.load_dataset()?;
            let mut summary = RunSummary::new(dry_run);
            summary.record_aggregation(dataset.repositories.len(), dataset.repositories.len());
            runner.sync(&dataset, &mut summary).await?;
            print_summary(&summary);
            Ok(summary.outcome().exit_code())
        }
        Command::Run {
            output,
            site,
            limit,
            no_sync,
            dry_run,
            github,
            feishu,
        } => {
            let settings = with_limit(settings, limit)?;
            let mut config = RunnerConfig::new(settings, output)
                .with_site_dir(site)
                .with_github_token(github.resolve())
                .with_dry_run(dry_run);
            if !no_sync {
                config = config.with_credentials(feishu.credentials()?);
            }
            let runner = Runner::new(config)?;
            let summary = runner.run(!no_sync).await?;
            print_summary(&summary);
            Ok(summary.outcome().exit_code())
        }
        Command::Bootstrap {
            name,
            app_id,
            app_secret,
        } => {
            let app = AppCredentials::with_env_fallback(app_id, app_secret)?;
            let client = FeishuClient::connect(&app, &settings.sync.api_base).await?;
            let result = bootstrap_table(&client, &settings.sync.fields, &name).await?;

            println!("\nCreated Bitable '{name}'");
            if let Some(url) = &result.url {
                println!("  URL: {url}");
            }
            println!("  Columns created: {}", result.created_fields.len());
            println!("\nAdd these to your environment:");
            println!("  FEISHU_BASE_ID={}", result.base_id);
            println!("  FEISHU_TABLE_ID={}", result.table_id);
            Ok(0)
        }
    }
}

/// Applies a `--limit` override and re-validates.
fn with_limit(mut settings: TrendingConfig, limit: Option<usize>) -> Result<TrendingConfig, RunnerError> {
    if let Some(limit) = limit {
        settings.limit = limit;
        settings.validate(Path::new("--limit"))?;
    }
    Ok(settings)
}

/// Prints the final run summary.
fn print_summary(summary: &RunSummary) {
    println!("\nSummary:");
    println!(
        "  Mode: {}",
        if summary.dry_run { "Dry Run" } else { "Live" }
    );

    if summary.targets_searched > 0 {
        println!("  Targets searched: {}", summary.targets_searched);
        println!("  Targets failed: {}", summary.targets_failed);
        println!("  Targets rate limited: {}", summary.targets_rate_limited);
        println!("  Hits fetched: {}", summary.hits_fetched);
        println!(
            "  Unique repositories: {}",
            summary.repositories_deduplicated
        );
    }
    println!("  Repositories ranked: {}", summary.repositories_ranked);
    if summary.has_fetch_failures() {
        println!("  Note: some targets were skipped, the ranking may be incomplete");
    }

    if summary.sync_attempted {
        let verb = if summary.dry_run { "to create" } else { "created" };
        println!("  Rows {verb}: {}", summary.rows_created);
        let verb = if summary.dry_run { "to update" } else { "updated" };
        println!("  Rows {verb}: {}", summary.rows_updated);
        println!("  Rows unchanged: {}", summary.rows_unchanged);
        println!("  Rows failed: {}", summary.rows_failed);
        for failure in &summary.failed_batches {
            println!(
                "    {} batch of {} failed after {} attempt(s): {}",
                failure.kind.as_str(),
                failure.full_names.len(),
                failure.attempts,
                failure.error
            );
        }
        println!("  Outcome: {}", summary.outcome().as_str());
    }
}
