// src/pipeline/controller.rs

//! Page-by-page crawl control.
//!
//! Walks listing pages in order, keeps only entries it has not seen before,
//! classifies them page by page, and decides when to stop. The stopping
//! signals are the listing running out, a run of old entries under a
//! cutoff, too many pages with nothing new, a fetch failure, or
//! cancellation.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{FixedOffset, NaiveDateTime, TimeDelta};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Announcement, AnnouncementMap, Config, NormalizedLink, RawListingEntry};
use crate::models::tags::CLASSIFICATION_FAILED;
use crate::services::{ClassifierClient, ListingSource, Sleeper};
use crate::utils::time::to_utc;
use crate::utils::{parse_time, resolve_url};

/// Which pages to visit and how far back to look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlPlan {
    pub start_page: u32,
    pub end_page: u32,
    /// Entries published before this local time count as old
    pub cutoff: Option<NaiveDateTime>,
}

impl CrawlPlan {
    /// Visit an explicit page range with no cutoff.
    pub fn pages(start_page: u32, end_page: u32) -> Self {
        Self {
            start_page,
            end_page,
            cutoff: None,
        }
    }

    /// Visit pages from 1 up to `ceiling`, keeping entries from the last `days` days.
    pub fn incremental(now: NaiveDateTime, days: i64, ceiling: u32) -> Result<Self> {
        let cutoff = TimeDelta::try_days(days)
            .and_then(|window| now.checked_sub_signed(window))
            .ok_or_else(|| {
                AppError::validation(format!("a {days}-day window is out of range"))
            })?;
        Ok(Self {
            start_page: 1,
            end_page: ceiling,
            cutoff: Some(cutoff),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A later page held fewer items than a full page
    EndOfList,
    /// Too many old or known entries in a row under a cutoff
    StaleThreshold,
    /// Too many consecutive pages without a new entry
    NoNewPages,
    /// An incremental run reached its last allowed page
    PageCeiling,
    /// A page after the first could not be fetched
    FetchFailed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    FirstPageFetchFailed,
    FirstPageEmpty,
}

/// How a crawl ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Every planned page was visited
    Completed,
    StoppedEarly(StopReason),
    Aborted(AbortReason),
}

impl Termination {
    pub fn is_aborted(&self) -> bool {
        matches!(self, Termination::Aborted(_))
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Completed => f.write_str("completed"),
            Termination::StoppedEarly(reason) => {
                let reason = match reason {
                    StopReason::EndOfList => "end of listing",
                    StopReason::StaleThreshold => "consecutive old entries",
                    StopReason::NoNewPages => "no new entries on recent pages",
                    StopReason::PageCeiling => "page ceiling reached",
                    StopReason::FetchFailed => "page fetch failed",
                    StopReason::Cancelled => "cancelled",
                };
                write!(f, "stopped early ({reason})")
            }
            Termination::Aborted(reason) => {
                let reason = match reason {
                    AbortReason::FirstPageFetchFailed => "first page could not be fetched",
                    AbortReason::FirstPageEmpty => "first page was empty",
                };
                write!(f, "aborted ({reason})")
            }
        }
    }
}

/// Counters for one crawl run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    pub pages_fetched: usize,
    pub entries_seen: usize,
    pub new_entries: usize,
    pub known_skipped: usize,
    pub stale_skipped: usize,
    pub invalid_skipped: usize,
}

/// Result of a crawl: the new announcements plus how and why it ended.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub announcements: AnnouncementMap,
    pub termination: Termination,
    pub stats: CrawlStats,
}

/// Thresholds and constants the controller runs with.
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub base_url: Url,
    pub min_valid: NaiveDateTime,
    pub offset: FixedOffset,
    pub max_consecutive_stale: usize,
    pub max_no_new_pages: usize,
    pub min_items_per_page: usize,
    pub auto_page_ceiling: u32,
    pub page_delay: Duration,
}

impl CrawlSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        let crawler = &config.crawler;
        Ok(Self {
            base_url: Url::parse(&config.portal.base_url)?,
            min_valid: crawler.min_valid_date()?,
            offset: crawler.offset()?,
            max_consecutive_stale: crawler.max_consecutive_stale,
            max_no_new_pages: crawler.max_no_new_pages,
            min_items_per_page: crawler.min_items_per_page,
            auto_page_ceiling: crawler.auto_page_ceiling,
            page_delay: Duration::from_millis(crawler.page_delay_ms),
        })
    }
}

/// An entry that survived filtering and waits for classification.
struct Pending {
    link: NormalizedLink,
    title: String,
    unit: String,
    published_at: chrono::DateTime<chrono::Utc>,
}

/// What one page contributed.
#[derive(Default)]
struct PageScan {
    fresh: Vec<Pending>,
    stale_limit_hit: bool,
}

/// Drives a single crawl run.
pub struct CrawlController<'a> {
    settings: CrawlSettings,
    source: &'a dyn ListingSource,
    classifier: &'a ClassifierClient,
    sleeper: Arc<dyn Sleeper>,
    known: HashSet<NormalizedLink>,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> CrawlController<'a> {
    pub fn new(
        settings: CrawlSettings,
        source: &'a dyn ListingSource,
        classifier: &'a ClassifierClient,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            settings,
            source,
            classifier,
            sleeper,
            known: HashSet::new(),
            cancel: None,
        }
    }

    /// Links already stored; entries pointing at them are skipped.
    pub fn with_known_links(mut self, links: impl IntoIterator<Item = NormalizedLink>) -> Self {
        self.known.extend(links);
        self
    }

    /// Flag checked before each page; once set, the run stops with what it has.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn is_known(&self, link: &NormalizedLink) -> bool {
        self.known.contains(link)
    }

    fn mark_known(&mut self, link: NormalizedLink) {
        self.known.insert(link);
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Crawl `plan` with `now` as the portal-local current time.
    pub async fn run(mut self, plan: &CrawlPlan, now: NaiveDateTime) -> CrawlOutcome {
        let mut announcements = AnnouncementMap::new();
        let mut stats = CrawlStats::default();
        let mut termination = Termination::Completed;
        let mut pages_without_new = 0usize;

        log::info!(
            "Crawling pages {}..={} (cutoff: {})",
            plan.start_page,
            plan.end_page,
            plan.cutoff
                .map(|c| c.to_string())
                .unwrap_or_else(|| "none".to_string())
        );

        for page in plan.start_page..=plan.end_page {
            if self.is_cancelled() {
                log::warn!("Cancellation requested; stopping before page {page}");
                termination = Termination::StoppedEarly(StopReason::Cancelled);
                break;
            }

            let listing = match self.source.fetch_page(page).await {
                Ok(listing) => listing,
                Err(e) => {
                    log::error!("Failed to fetch page {page}: {e}");
                    termination = if page == plan.start_page {
                        Termination::Aborted(AbortReason::FirstPageFetchFailed)
                    } else {
                        Termination::StoppedEarly(StopReason::FetchFailed)
                    };
                    break;
                }
            };
            stats.pages_fetched += 1;

            if page > plan.start_page && listing.item_count < self.settings.min_items_per_page {
                log::info!(
                    "Page {page} holds {} items; treating it as the end of the listing",
                    listing.item_count
                );
                termination = Termination::StoppedEarly(StopReason::EndOfList);
                break;
            }
            if page == plan.start_page && listing.item_count == 0 {
                log::error!("First page {page} has no items; check selectors or access");
                termination = Termination::Aborted(AbortReason::FirstPageEmpty);
                break;
            }

            let scan = self.scan_page(listing.entries, plan.cutoff, now, &mut stats);

            if scan.fresh.is_empty() {
                pages_without_new += 1;
                log::info!(
                    "Page {page}: nothing new ({pages_without_new}/{} pages in a row)",
                    self.settings.max_no_new_pages
                );
                if pages_without_new >= self.settings.max_no_new_pages {
                    termination = Termination::StoppedEarly(StopReason::NoNewPages);
                    break;
                }
            } else {
                pages_without_new = 0;
                log::info!("Page {page}: {} new entries", scan.fresh.len());
                stats.new_entries += scan.fresh.len();
                for announcement in self.classify(scan.fresh).await {
                    announcements.insert(announcement.link.clone(), announcement);
                }
            }

            if scan.stale_limit_hit {
                termination = Termination::StoppedEarly(StopReason::StaleThreshold);
                break;
            }
            if plan.cutoff.is_some() && page >= self.settings.auto_page_ceiling {
                log::info!("Reached page ceiling {}", self.settings.auto_page_ceiling);
                termination = Termination::StoppedEarly(StopReason::PageCeiling);
                break;
            }
            if page < plan.end_page {
                self.sleeper.sleep(self.settings.page_delay).await;
            }
        }

        log::info!(
            "Crawl {termination}: {} pages, {} new announcements",
            stats.pages_fetched,
            announcements.len()
        );
        CrawlOutcome {
            announcements,
            termination,
            stats,
        }
    }

    /// Filter one page's entries in order.
    ///
    /// Known links and entries older than the cutoff both extend the run of
    /// stale entries; only the cutoff branch can end the page early.
    fn scan_page(
        &mut self,
        entries: Vec<RawListingEntry>,
        cutoff: Option<NaiveDateTime>,
        now: NaiveDateTime,
        stats: &mut CrawlStats,
    ) -> PageScan {
        let mut scan = PageScan::default();
        let mut consecutive_stale = 0usize;

        for entry in entries {
            stats.entries_seen += 1;
            let link = NormalizedLink::new(&resolve_url(&self.settings.base_url, &entry.href));

            if self.is_known(&link) {
                log::debug!("Already stored: {link}");
                stats.known_skipped += 1;
                consecutive_stale += 1;
                continue;
            }

            let (Some(raw_time), Some(unit)) = (entry.raw_time, entry.unit) else {
                log::warn!("Skipping '{}': missing time or unit", entry.title);
                stats.invalid_skipped += 1;
                continue;
            };

            let local = parse_time(&raw_time, now).or_epoch();
            if local < self.settings.min_valid {
                log::warn!("Skipping '{}': unusable time '{raw_time}'", entry.title);
                stats.invalid_skipped += 1;
                continue;
            }

            if let Some(cutoff) = cutoff {
                if local < cutoff {
                    stats.stale_skipped += 1;
                    consecutive_stale += 1;
                    log::debug!("Older than cutoff: '{}' ({local})", entry.title);
                    if consecutive_stale >= self.settings.max_consecutive_stale {
                        log::info!("{consecutive_stale} old entries in a row; stopping");
                        scan.stale_limit_hit = true;
                        break;
                    }
                    continue;
                }
            }
            consecutive_stale = 0;

            let Some(published_at) = to_utc(local, self.settings.offset) else {
                log::warn!("Skipping '{}': time {local} does not map to UTC", entry.title);
                stats.invalid_skipped += 1;
                continue;
            };

            self.mark_known(link.clone());
            scan.fresh.push(Pending {
                link,
                title: entry.title,
                unit,
                published_at,
            });
        }
        scan
    }

    async fn classify(&self, pending: Vec<Pending>) -> Vec<Announcement> {
        let titles: Vec<String> = pending.iter().map(|p| p.title.clone()).collect();
        let labels = self.classifier.classify_titles(&titles).await;

        pending
            .into_iter()
            .map(|p| {
                let (primary_tag, secondary_tags) = match labels.get(&p.title) {
                    Some(label) => (label.primary_tag.clone(), label.secondary_tags.clone()),
                    None => (
                        CLASSIFICATION_FAILED.to_string(),
                        vec![CLASSIFICATION_FAILED.to_string()],
                    ),
                };
                Announcement {
                    published_at: p.published_at,
                    title: p.title,
                    unit: p.unit,
                    primary_tag,
                    secondary_tags,
                    link: p.link,
                    updated_at: None,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClassifierConfig;
    use crate::models::tags::UNCLASSIFIED;
    use crate::testing::{FixtureSource, RecordingSleeper, ScriptedTransport, entry};
    use chrono::NaiveDate;

    const BASE: &str = "https://oa.jlu.edu.cn/defaultroot/";

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 11, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn settings() -> CrawlSettings {
        let mut config = Config::default();
        config.crawler.page_delay_ms = 500;
        CrawlSettings::from_config(&config).unwrap()
    }

    fn link(id: u32) -> NormalizedLink {
        NormalizedLink::new(&format!("{BASE}read.action?id={id}"))
    }

    fn href(id: u32) -> String {
        format!("read.action?id={id}&channelId=179577")
    }

    fn unclassified() -> ClassifierClient {
        ClassifierClient::new(
            &ClassifierConfig::default(),
            None,
            Arc::new(RecordingSleeper::default()),
        )
    }

    fn full_page(first_id: u32, day: &str) -> Vec<RawListingEntry> {
        (first_id..first_id + 5)
            .map(|id| entry(&format!("notice {id}"), day, &href(id)))
            .collect()
    }

    #[tokio::test]
    async fn test_known_and_old_entries_hit_stale_limit() {
        let source = FixtureSource::default().page(
            1,
            vec![
                entry("A", "2025-11-09", &href(1)),
                entry("B", "2025-10-01", &href(2)),
                entry("C", "2025-11-09 10:00", &href(3)),
            ],
        );
        let classifier = unclassified();
        let mut s = settings();
        s.max_consecutive_stale = 1;
        let controller = CrawlController::new(s, &source, &classifier, Arc::new(RecordingSleeper::default()))
            .with_known_links([link(1)]);

        let plan = CrawlPlan::incremental(now(), 7, 10).unwrap();
        let outcome = controller.run(&plan, now()).await;

        assert!(outcome.announcements.is_empty());
        assert_eq!(
            outcome.termination,
            Termination::StoppedEarly(StopReason::StaleThreshold)
        );
        assert_eq!(source.fetched(), vec![1]);
    }

    #[test]
    fn test_incremental_window() {
        let plan = CrawlPlan::incremental(now(), 7, 10).unwrap();
        assert_eq!(plan.start_page, 1);
        assert_eq!(plan.end_page, 10);
        assert_eq!(
            plan.cutoff,
            NaiveDate::from_ymd_opt(2025, 11, 3).unwrap().and_hms_opt(12, 0, 0)
        );
    }

    #[test]
    fn test_incremental_window_out_of_range() {
        assert!(matches!(
            CrawlPlan::incremental(now(), 99_999_999_999, 10),
            Err(AppError::Validation(_))
        ));
        assert!(CrawlPlan::incremental(now(), i64::MIN, 10).is_err());
    }

    #[tokio::test]
    async fn test_first_page_empty_aborts() {
        let source = FixtureSource::default();
        let classifier = unclassified();
        let controller =
            CrawlController::new(settings(), &source, &classifier, Arc::new(RecordingSleeper::default()));

        let outcome = controller.run(&CrawlPlan::pages(1, 3), now()).await;
        assert!(outcome.announcements.is_empty());
        assert_eq!(
            outcome.termination,
            Termination::Aborted(AbortReason::FirstPageEmpty)
        );
    }

    #[tokio::test]
    async fn test_first_page_fetch_failure_aborts() {
        let source = FixtureSource::default().broken(1);
        let classifier = unclassified();
        let controller =
            CrawlController::new(settings(), &source, &classifier, Arc::new(RecordingSleeper::default()));

        let outcome = controller.run(&CrawlPlan::pages(1, 3), now()).await;
        assert!(outcome.termination.is_aborted());
    }

    #[tokio::test]
    async fn test_later_fetch_failure_keeps_partial_results() {
        let source = FixtureSource::default()
            .page(1, full_page(1, "2025-11-09"))
            .broken(2);
        let classifier = unclassified();
        let sleeper = Arc::new(RecordingSleeper::default());
        let controller = CrawlController::new(settings(), &source, &classifier, sleeper.clone());

        let outcome = controller.run(&CrawlPlan::pages(1, 3), now()).await;
        assert_eq!(outcome.announcements.len(), 5);
        assert_eq!(
            outcome.termination,
            Termination::StoppedEarly(StopReason::FetchFailed)
        );
        assert_eq!(sleeper.recorded(), vec![Duration::from_millis(500)]);

        let record = outcome.announcements.get(&link(3)).unwrap();
        assert_eq!(record.primary_tag, UNCLASSIFIED);
        assert_eq!(record.unit, "教务处");
    }

    #[tokio::test]
    async fn test_short_later_page_ends_listing() {
        let source = FixtureSource::default()
            .page(1, full_page(1, "2025-11-09"))
            .page(2, full_page(10, "2025-11-08").into_iter().take(4).collect());
        let classifier = unclassified();
        let controller =
            CrawlController::new(settings(), &source, &classifier, Arc::new(RecordingSleeper::default()));

        let outcome = controller.run(&CrawlPlan::pages(1, 5), now()).await;
        assert_eq!(outcome.announcements.len(), 5);
        assert_eq!(
            outcome.termination,
            Termination::StoppedEarly(StopReason::EndOfList)
        );
        assert_eq!(source.fetched(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_unusable_items_count_towards_page_size() {
        let source = FixtureSource::default()
            .page(1, full_page(1, "2025-11-09"))
            .page_with_items(2, 5, full_page(10, "2025-11-08").into_iter().take(4).collect())
            .page_with_items(3, 2, vec![]);
        let classifier = unclassified();
        let controller =
            CrawlController::new(settings(), &source, &classifier, Arc::new(RecordingSleeper::default()));

        let outcome = controller.run(&CrawlPlan::pages(1, 5), now()).await;
        assert_eq!(outcome.announcements.len(), 9);
        assert!(outcome.announcements.contains_key(&link(13)));
        assert_eq!(
            outcome.termination,
            Termination::StoppedEarly(StopReason::EndOfList)
        );
        assert_eq!(source.fetched(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_first_page_of_unusable_items_is_not_empty() {
        let source = FixtureSource::default().page_with_items(1, 3, vec![]);
        let classifier = unclassified();
        let controller =
            CrawlController::new(settings(), &source, &classifier, Arc::new(RecordingSleeper::default()));

        let outcome = controller.run(&CrawlPlan::pages(1, 1), now()).await;
        assert!(outcome.announcements.is_empty());
        assert_eq!(outcome.termination, Termination::Completed);
    }

    #[tokio::test]
    async fn test_pages_without_new_entries_stop_run() {
        let mut source = FixtureSource::default();
        for page in 1..=4 {
            source = source.page(page, full_page(page * 10, "2025-11-09"));
        }
        let known: Vec<NormalizedLink> = (1..=4)
            .flat_map(|page| (page * 10..page * 10 + 5).map(link))
            .collect();
        let classifier = unclassified();
        let mut s = settings();
        s.max_no_new_pages = 3;
        let controller = CrawlController::new(s, &source, &classifier, Arc::new(RecordingSleeper::default()))
            .with_known_links(known);

        let outcome = controller.run(&CrawlPlan::pages(1, 4), now()).await;
        assert!(outcome.announcements.is_empty());
        assert_eq!(
            outcome.termination,
            Termination::StoppedEarly(StopReason::NoNewPages)
        );
        assert_eq!(outcome.stats.known_skipped, 15);
    }

    #[tokio::test]
    async fn test_invalid_entries_are_dropped() {
        let mut entries = full_page(1, "2025-11-09");
        entries[0].unit = None;
        entries[1].raw_time = Some("sometime".to_string());
        entries[2].raw_time = Some("1999-12-31".to_string());
        let source = FixtureSource::default().page(1, entries);
        let classifier = unclassified();
        let controller =
            CrawlController::new(settings(), &source, &classifier, Arc::new(RecordingSleeper::default()));

        let outcome = controller.run(&CrawlPlan::pages(1, 1), now()).await;
        assert_eq!(outcome.announcements.len(), 2);
        assert_eq!(outcome.stats.invalid_skipped, 3);
        assert_eq!(outcome.termination, Termination::Completed);
    }

    #[tokio::test]
    async fn test_duplicate_link_within_page_kept_once() {
        let mut entries = full_page(1, "2025-11-09");
        entries[4].href = href(1);
        let source = FixtureSource::default().page(1, entries);
        let classifier = unclassified();
        let controller =
            CrawlController::new(settings(), &source, &classifier, Arc::new(RecordingSleeper::default()));

        let outcome = controller.run(&CrawlPlan::pages(1, 1), now()).await;
        assert_eq!(outcome.announcements.len(), 4);
        assert_eq!(outcome.stats.known_skipped, 1);
    }

    #[tokio::test]
    async fn test_cancel_flag_stops_before_next_page() {
        let source = FixtureSource::default().page(1, full_page(1, "2025-11-09"));
        let classifier = unclassified();
        let cancel = Arc::new(AtomicBool::new(true));
        let controller =
            CrawlController::new(settings(), &source, &classifier, Arc::new(RecordingSleeper::default()))
                .with_cancel_flag(cancel);

        let outcome = controller.run(&CrawlPlan::pages(1, 2), now()).await;
        assert_eq!(
            outcome.termination,
            Termination::StoppedEarly(StopReason::Cancelled)
        );
        assert!(source.fetched().is_empty());
    }

    #[tokio::test]
    async fn test_incremental_run_respects_page_ceiling() {
        let mut source = FixtureSource::default();
        for page in 1..=3 {
            source = source.page(page, full_page(page * 10, "今天 09:00"));
        }
        let classifier = unclassified();
        let mut s = settings();
        s.auto_page_ceiling = 2;
        let controller = CrawlController::new(s, &source, &classifier, Arc::new(RecordingSleeper::default()));

        let plan = CrawlPlan::incremental(now(), 7, 3).unwrap();
        let outcome = controller.run(&plan, now()).await;
        assert_eq!(outcome.announcements.len(), 10);
        assert_eq!(
            outcome.termination,
            Termination::StoppedEarly(StopReason::PageCeiling)
        );
    }

    #[tokio::test]
    async fn test_classified_labels_attached() {
        let source = FixtureSource::default().page(
            1,
            vec![
                entry("关于举办数学建模竞赛的通知", "2025-11-09 08:30", &href(1)),
                entry("图书馆闭馆通知", "昨天 17:00", &href(2)),
            ],
        );
        let reply = r#"[
            {"title": "关于举办数学建模竞赛的通知", "primary_tag": "竞赛/奖学金", "secondary_tags": ["数学建模"]},
            {"title": "图书馆闭馆通知", "primary_tag": "学校公共设施运营", "secondary_tags": ["图书馆", "闭馆"]}
        ]"#;
        let transport = ScriptedTransport::new(vec![Ok(reply.to_string())]);
        let config = ClassifierConfig {
            api_key: Some("sk-test".to_string()),
            ..ClassifierConfig::default()
        };
        let sleeper = Arc::new(RecordingSleeper::default());
        let classifier = ClassifierClient::new(&config, Some(Box::new(transport)), sleeper.clone());
        let controller = CrawlController::new(settings(), &source, &classifier, sleeper);

        let outcome = controller.run(&CrawlPlan::pages(1, 1), now()).await;
        assert_eq!(outcome.announcements.len(), 2);

        let contest = outcome.announcements.get(&link(1)).unwrap();
        assert_eq!(contest.primary_tag, "竞赛/奖学金");
        assert_eq!(contest.secondary_tags, vec!["数学建模".to_string()]);
        // 2025-11-09 08:30 at UTC+8
        assert_eq!(contest.published_at.timestamp(), 1_762_648_200);

        let library = outcome.announcements.get(&link(2)).unwrap();
        assert_eq!(library.secondary_tags.len(), 2);
    }
}
