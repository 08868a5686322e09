// src/pipeline/crawl.rs

//! Incremental crawl pipeline: load, crawl, merge, save.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use chrono::{NaiveDateTime, Utc};

use crate::error::Result;
use crate::models::Config;
use crate::pipeline::controller::{CrawlController, CrawlPlan, CrawlSettings, CrawlStats, Termination};
use crate::pipeline::merge::merge;
use crate::services::{ClassifierClient, ListingFetcher, Sleeper, TokioSleeper};
use crate::storage::AnnouncementStorage;
use crate::utils::http::create_async_client;
use crate::utils::time::portal_now;

/// Summary of one crawl-and-store run.
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub termination: Termination,
    pub stats: CrawlStats,
    /// Announcements written by this run
    pub added: usize,
    /// Store size after the run
    pub total: usize,
}

/// Run the crawler against the live portal and persist the results.
pub async fn run_crawler(
    config: &Config,
    storage: &dyn AnnouncementStorage,
    plan: &CrawlPlan,
    cancel: Option<Arc<AtomicBool>>,
) -> Result<CrawlReport> {
    let settings = CrawlSettings::from_config(config)?;
    let now = portal_now(settings.offset);

    let client = create_async_client(&config.crawler)?;
    let source = ListingFetcher::new(client, config.portal.clone());
    let sleeper: Arc<dyn Sleeper> = Arc::new(TokioSleeper);
    let classifier = ClassifierClient::from_config(&config.classifier, Arc::clone(&sleeper))?;

    let mut controller = CrawlController::new(settings, &source, &classifier, sleeper);
    if let Some(cancel) = cancel {
        controller = controller.with_cancel_flag(cancel);
    }
    crawl_into_store(controller, storage, plan, now).await
}

/// Seed `controller` with the stored links, run it, and merge its output
/// back into `storage`.
pub async fn crawl_into_store(
    controller: CrawlController<'_>,
    storage: &dyn AnnouncementStorage,
    plan: &CrawlPlan,
    now: NaiveDateTime,
) -> Result<CrawlReport> {
    let existing = storage.load_announcements().await?;
    let controller = controller.with_known_links(existing.keys().cloned());

    let outcome = controller.run(plan, now).await;
    let added = outcome.announcements.len();

    let total = if added == 0 {
        log::info!("No new announcements; store left unchanged");
        existing.len()
    } else {
        let combined = merge(existing, outcome.announcements, Utc::now());
        storage.save_announcements(&combined).await?;
        combined.len()
    };

    Ok(CrawlReport {
        termination: outcome.termination,
        stats: outcome.stats,
        added,
        total,
    })
}
