//! OA announcement crawler CLI
//!
//! Local execution entry point.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::{Parser, Subcommand};
use oa_notices::{
    error::Result,
    models::{API_KEY_ENV, Config},
    pipeline::{self, AnnouncementQuery, ApiResponse, CrawlPlan, Facets, SortOrder},
    storage::{AnnouncementStorage, LocalStorage},
    utils::time::portal_now,
};

/// oa-notices - University OA Announcement Crawler
#[derive(Parser, Debug)]
#[command(
    name = "oa-notices",
    version,
    about = "Incremental crawler and tagger for the OA announcement list"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch new announcements and merge them into the store
    Crawl {
        /// First listing page to fetch
        #[arg(long)]
        start_page: Option<u32>,

        /// Last listing page to fetch
        #[arg(long)]
        end_page: Option<u32>,

        /// Only keep announcements from the last N days
        #[arg(long, conflicts_with = "full")]
        since_days: Option<i64>,

        /// Walk the page range without a date cutoff
        #[arg(long)]
        full: bool,
    },

    /// Print one page of stored announcements as JSON
    Query {
        #[arg(long, default_value_t = 1)]
        page: usize,

        #[arg(long, default_value_t = pipeline::query::DEFAULT_PAGE_SIZE)]
        size: usize,

        /// time_desc or time_asc
        #[arg(long, default_value_t = SortOrder::TimeDesc)]
        sort: SortOrder,

        /// Exact publishing unit
        #[arg(long)]
        unit: Option<String>,

        /// Comma-separated tags that must all match
        #[arg(long)]
        tags: Option<String>,

        /// Substring of title or unit, case-insensitive
        #[arg(long)]
        keyword: Option<String>,
    },

    /// Print units and tags with counts as JSON
    Filters,

    /// Validate configuration file
    Validate,

    /// Show store location and contents summary
    Info,
}

const INCREMENTAL_DAYS: i64 = 7;

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Build the crawl plan from the command-line flags.
fn crawl_plan(
    config: &Config,
    start_page: Option<u32>,
    end_page: Option<u32>,
    since_days: Option<i64>,
    full: bool,
) -> Result<CrawlPlan> {
    let now = portal_now(config.crawler.offset()?);
    let ceiling = config.crawler.auto_page_ceiling;

    let mut plan = if full {
        CrawlPlan::pages(1, ceiling)
    } else {
        CrawlPlan::incremental(now, since_days.unwrap_or(INCREMENTAL_DAYS), ceiling)?
    };
    if let Some(start) = start_page {
        plan.start_page = start.max(1);
    }
    if let Some(end) = end_page {
        plan.end_page = end;
    }
    Ok(plan)
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    config.apply_env();
    log::debug!("Configuration from {}", cli.config.display());

    let storage = LocalStorage::new(&config.store.data_file);

    match cli.command {
        Command::Crawl {
            start_page,
            end_page,
            since_days,
            full,
        } => {
            config.validate()?;
            let plan = crawl_plan(&config, start_page, end_page, since_days, full)?;

            let cancel = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&cancel);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    log::warn!("Interrupt received; finishing the current page");
                    flag.store(true, Ordering::SeqCst);
                }
            });

            let report = pipeline::run_crawler(&config, &storage, &plan, Some(cancel)).await?;

            log::info!("Crawl {}", report.termination);
            log::info!(
                "Pages: {}, entries seen: {}, new: {}, already stored: {}, old: {}, invalid: {}",
                report.stats.pages_fetched,
                report.stats.entries_seen,
                report.added,
                report.stats.known_skipped,
                report.stats.stale_skipped,
                report.stats.invalid_skipped
            );
            log::info!("Store now holds {} announcements", report.total);
        }

        Command::Query {
            page,
            size,
            sort,
            unit,
            tags,
            keyword,
        } => {
            let records = storage.load_announcements().await?;
            let query = AnnouncementQuery {
                page,
                size,
                sort,
                unit,
                tags,
                keyword,
            };
            let result = query.run(&records, config.crawler.offset()?);
            println!(
                "{}",
                serde_json::to_string_pretty(&ApiResponse::success(result))?
            );
        }

        Command::Filters => {
            let records = storage.load_announcements().await?;
            let facets = Facets::collect(&records);
            println!(
                "{}",
                serde_json::to_string_pretty(&ApiResponse::success(facets))?
            );
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");

            if config.classifier.credential().is_none() {
                log::warn!("No classifier credential; set {API_KEY_ENV} to enable tagging");
            }
        }

        Command::Info => {
            log::info!("Data file: {}", storage.path().display());

            let records = storage.load_announcements().await?;
            log::info!("Announcements: {}", records.len());

            let offset = config.crawler.offset()?;
            if let Some(newest) = records.values().map(|r| r.published_at).max() {
                log::info!("Newest publish time: {}", newest.with_timezone(&offset));
            }
            let unlabelled = records
                .values()
                .filter(|r| oa_notices::models::tags::is_sentinel(&r.primary_tag))
                .count();
            if unlabelled > 0 {
                log::info!("Without a topic label: {unlabelled}");
            }
        }
    }

    Ok(())
}
