use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use prism_bias::{BiasAnalyzer, ImmediateBiasEnricher};
use prism_cluster::{BatchLimits, CascadeThresholds, ClusterEnricher};
use prism_common::{BiasLabel, Config};
use prism_coverage::CoverageTracker;
use prism_feed::discover_feed_urls;
use prism_llm::LlmClient;
use prism_scheduler::{CompositeEnricher, Pipeline, Scheduler};
use prism_store::{SearchIndex, StoreGateway, TypesenseIndex};

#[derive(Parser)]
#[command(name = "prism-cli", about = "Operator CLI for the news pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bulk-upsert the seed source list from a CSV file
    /// (name,home_url,feed_url,bias per line).
    SeedSources {
        #[arg(long, default_value = "sources.csv")]
        file: PathBuf,
    },
    /// One shot of the Feed Reader.
    Ingest,
    /// One shot of Clustering + Analyzer.
    Enrich,
    /// Ingest then enrich.
    Full,
    /// Run the scheduler in the foreground until SIGINT/SIGTERM.
    Schedule {
        #[arg(long, default_value_t = 30)]
        interval: u64,
    },
    /// Run the cleanup pass once.
    Cleanup,
    /// Print a snapshot of source/cluster/job counts.
    Status,
    /// Print the loaded configuration (secrets redacted).
    Config,
    /// Source management helpers.
    #[command(subcommand)]
    Sources(SourcesCommand),
}

#[derive(Subcommand)]
enum SourcesCommand {
    /// Scan a page for RSS/Atom `<link>` tags and print candidate feed URLs.
    Discover { url: String },
    /// List every seeded source.
    List,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to start async runtime: {e:#}");
            return ExitCode::from(1);
        }
    };

    match runtime.block_on(run()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::SeedSources { file } => cmd_seed_sources(&file).await,
        Command::Ingest => cmd_ingest().await,
        Command::Enrich => cmd_enrich().await,
        Command::Full => cmd_full().await,
        Command::Schedule { interval } => cmd_schedule(interval).await,
        Command::Cleanup => cmd_cleanup().await,
        Command::Status => cmd_status().await,
        Command::Config => cmd_config().await,
        Command::Sources(SourcesCommand::Discover { url }) => cmd_sources_discover(&url).await,
        Command::Sources(SourcesCommand::List) => cmd_sources_list().await,
    }
}

async fn connect_store(config: &Config) -> Result<StoreGateway> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(8)
        .connect(&config.database_url)
        .await
        .context("connecting to the store")?;
    let store = StoreGateway::new(pool);
    store.migrate().await.context("running migrations")?;
    Ok(store)
}

fn build_pipeline(config: Config, store: StoreGateway) -> Pipeline {
    let llm = Arc::new(LlmClient::new(config.clone()));
    let bias_analyzer = Arc::new(BiasAnalyzer::new(store.clone(), Arc::clone(&llm)));
    let child_enrichers: Vec<Box<dyn ClusterEnricher>> = vec![
        Box::new(ImmediateBiasEnricher::new(Arc::clone(&bias_analyzer))),
        Box::new(CoverageTracker::new(store.clone())),
    ];
    let enricher: Arc<dyn ClusterEnricher> = Arc::new(CompositeEnricher::new(child_enrichers));
    let index: Arc<dyn SearchIndex> = Arc::new(TypesenseIndex::new(
        &config.search_index_url,
        &config.search_index_key,
        &config.search_index_name,
    ));
    let batch_limits = BatchLimits {
        max_total: config.dev_article_cap,
        ..BatchLimits::default()
    };
    Pipeline::new(
        store,
        llm,
        index,
        enricher,
        CascadeThresholds::default(),
        batch_limits,
    )
}

/// A single `name,home_url,feed_url,bias` row, parsed from a seed CSV.
struct SeedRow {
    name: String,
    home_url: String,
    feed_url: String,
    bias: BiasLabel,
}

/// Parses one seed-file line. Returns `None` for blank lines, `#`-comments,
/// and the header row; malformed rows (wrong field count) are also skipped,
/// logging a warning keyed by `line_no` (1-based, for operator-facing output).
fn parse_seed_line(line_no: usize, line: &str) -> Option<SeedRow> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with("name,") {
        return None;
    }
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 4 {
        tracing::warn!(line = line_no, "skipping malformed seed row");
        return None;
    }
    let (name, home_url, feed_url, bias) = (fields[0], fields[1], fields[2], fields[3]);
    let bias = BiasLabel::from_str(bias).unwrap_or_else(|_| {
        tracing::warn!(line = line_no, bias, "unknown bias label, defaulting to unknown");
        BiasLabel::Unknown
    });
    Some(SeedRow {
        name: name.to_string(),
        home_url: home_url.to_string(),
        feed_url: feed_url.to_string(),
        bias,
    })
}

async fn cmd_seed_sources(file: &PathBuf) -> Result<()> {
    let config = Config::from_env();
    let store = connect_store(&config).await?;

    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("reading seed file {}", file.display()))?;

    let mut seeded = 0;
    for (line_no, line) in contents.lines().enumerate() {
        let Some(row) = parse_seed_line(line_no + 1, line) else {
            continue;
        };
        store
            .upsert_source(&row.name, &row.home_url, &row.feed_url, row.bias)
            .await?;
        seeded += 1;
    }

    println!("seeded {seeded} sources from {}", file.display());
    Ok(())
}

async fn cmd_ingest() -> Result<()> {
    let config = Config::from_env();
    let store = connect_store(&config).await?;
    let pipeline = build_pipeline(config, store);
    let stats = pipeline.run_ingest().await?;
    println!("{stats:?}");
    Ok(())
}

async fn cmd_enrich() -> Result<()> {
    let config = Config::from_env();
    let store = connect_store(&config).await?;
    let pipeline = build_pipeline(config, store);
    let stats = pipeline.run_enrich_once().await?;
    println!("{stats:?}");
    Ok(())
}

async fn cmd_full() -> Result<()> {
    let config = Config::from_env();
    let store = connect_store(&config).await?;
    let pipeline = build_pipeline(config, store);
    let (ingest, enrich, cleanup) = pipeline.run_full().await?;
    println!("ingest: {ingest:?}");
    println!("enrich: {enrich:?}");
    println!("cleanup: {cleanup:?}");
    Ok(())
}

async fn cmd_cleanup() -> Result<()> {
    let config = Config::from_env();
    let store = connect_store(&config).await?;
    let pipeline = build_pipeline(config, store);
    let stats = pipeline.run_cleanup().await?;
    println!("{stats:?}");
    Ok(())
}

/// Rejects an `--interval` too small to be a sane polling period.
fn validate_interval(interval: u64) -> Result<()> {
    if interval < 5 {
        anyhow::bail!("--interval must be at least 5 minutes");
    }
    Ok(())
}

async fn cmd_schedule(interval: u64) -> Result<()> {
    validate_interval(interval)?;
    let config = Config::from_env();
    let store = connect_store(&config).await?;
    let pipeline = Arc::new(build_pipeline(config, store));
    tracing::info!(interval_minutes = interval, "scheduler starting");
    Scheduler::new(pipeline, interval).run_until_shutdown().await;
    Ok(())
}

async fn cmd_status() -> Result<()> {
    let config = Config::from_env();
    let store = connect_store(&config).await?;

    let sources = store.list_sources().await?;
    let eligible = store.list_eligible_sources().await?;
    let clusters = store.list_all_clusters().await?;
    let overview = store.analytics_overview().await?;
    let recent_jobs = store.list_recent_ai_jobs(10).await?;

    println!("sources: {} ({} eligible)", sources.len(), eligible.len());
    println!("clusters: {}", clusters.len());
    println!(
        "analytics: total_clusters={} average_coverage={:.1} blindspots={}",
        overview.total_clusters, overview.average_coverage, overview.blindspot_count
    );
    println!("recent AI jobs:");
    for job in recent_jobs {
        println!("  {:?} {:?} {:?}", job.kind, job.status, job.id);
    }
    Ok(())
}

async fn cmd_config() -> Result<()> {
    let config = Config::from_env();
    config.log_redacted();
    println!("api_host = {}", config.api_host);
    println!("api_port = {}", config.api_port);
    println!("ingest_interval_minutes = {}", config.ingest_interval_minutes);
    println!("dev_article_cap = {}", config.dev_article_cap);
    println!("daily_budget_cents = {}", config.daily_budget_cents);
    Ok(())
}

async fn cmd_sources_discover(url: &str) -> Result<()> {
    let html = reqwest::get(url)
        .await
        .with_context(|| format!("fetching {url}"))?
        .text()
        .await
        .context("reading response body")?;
    let feeds = discover_feed_urls(&html, url);
    if feeds.is_empty() {
        println!("no feed links found at {url}");
    } else {
        for feed in feeds {
            println!("{feed}");
        }
    }
    Ok(())
}

async fn cmd_sources_list() -> Result<()> {
    let config = Config::from_env();
    let store = connect_store(&config).await?;
    for source in store.list_sources().await? {
        println!(
            "{}\t{}\t{}\t{:?}",
            source.name, source.feed_url, source.bias, source.last_fetched_at
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_row() {
        let row = parse_seed_line(
            1,
            "Daily Signal, https://daily.example , https://daily.example/feed ,left",
        )
        .unwrap();
        assert_eq!(row.name, "Daily Signal");
        assert_eq!(row.home_url, "https://daily.example");
        assert_eq!(row.feed_url, "https://daily.example/feed");
        assert_eq!(row.bias, BiasLabel::Left);
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        assert!(parse_seed_line(1, "").is_none());
        assert!(parse_seed_line(2, "   ").is_none());
        assert!(parse_seed_line(3, "# a comment").is_none());
    }

    #[test]
    fn skips_the_header_row() {
        assert!(parse_seed_line(1, "name,home_url,feed_url,bias").is_none());
    }

    #[test]
    fn skips_rows_with_the_wrong_field_count() {
        assert!(parse_seed_line(1, "Only,Three,Fields").is_none());
        assert!(parse_seed_line(1, "Too,Many,Fields,Here,Now").is_none());
    }

    #[test]
    fn unknown_bias_label_falls_back_to_unknown() {
        let row = parse_seed_line(
            1,
            "Some Outlet,https://outlet.example,https://outlet.example/feed,nonsense",
        )
        .unwrap();
        assert_eq!(row.bias, BiasLabel::Unknown);
    }

    #[test]
    fn interval_below_five_minutes_is_rejected() {
        assert!(validate_interval(4).is_err());
        assert!(validate_interval(0).is_err());
    }

    #[test]
    fn interval_of_five_or_more_is_accepted() {
        assert!(validate_interval(5).is_ok());
        assert!(validate_interval(30).is_ok());
    }
}
