//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{FixedOffset, NaiveDate, NaiveDateTime};
use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::ListingSelectors;
use crate::utils::time::portal_offset;

/// Environment variable that overrides `classifier.api_key`.
pub const API_KEY_ENV: &str = "DEEPSEEK_API_KEY";

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Where the announcement list lives and how to read it
    #[serde(default)]
    pub portal: PortalConfig,

    /// Classification service settings
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Persisted record set
    #[serde(default)]
    pub store: StoreConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Fill the API key from the environment when it is set there.
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.classifier.api_key = Some(key);
            }
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_consecutive_stale == 0 {
            return Err(AppError::validation(
                "crawler.max_consecutive_stale must be > 0",
            ));
        }
        if self.crawler.max_no_new_pages == 0 {
            return Err(AppError::validation("crawler.max_no_new_pages must be > 0"));
        }
        self.crawler.min_valid_date()?;
        self.crawler.offset()?;

        url::Url::parse(&self.portal.base_url)?;
        if !self.portal.list_url_template.contains("{page}") {
            return Err(AppError::validation(
                "portal.list_url_template must contain {page}",
            ));
        }
        for selector in self.portal.selectors.all() {
            Selector::parse(selector)
                .map_err(|e| AppError::selector(selector, format!("{e:?}")))?;
        }

        if self.classifier.max_batch_size == 0 {
            return Err(AppError::validation(
                "classifier.max_batch_size must be > 0",
            ));
        }
        if self.classifier.max_attempts == 0 {
            return Err(AppError::validation("classifier.max_attempts must be > 0"));
        }
        if self.classifier.timeout_secs == 0 {
            return Err(AppError::validation("classifier.timeout_secs must be > 0"));
        }
        url::Url::parse(&self.classifier.api_url)?;

        if self.store.data_file.as_os_str().is_empty() {
            return Err(AppError::validation("store.data_file is empty"));
        }
        Ok(())
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Accept header for listing requests
    #[serde(default = "defaults::accept")]
    pub accept: String,

    /// Accept-Language header for listing requests
    #[serde(default = "defaults::accept_language")]
    pub accept_language: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Pause between listing pages in milliseconds
    #[serde(default = "defaults::page_delay")]
    pub page_delay_ms: u64,

    /// Back-to-back old entries on one page that end the crawl
    #[serde(default = "defaults::max_consecutive_stale")]
    pub max_consecutive_stale: usize,

    /// Consecutive pages without new entries that end the crawl
    #[serde(default = "defaults::max_no_new_pages")]
    pub max_no_new_pages: usize,

    /// Fewer items than this on a later page means the list has ended
    #[serde(default = "defaults::min_items_per_page")]
    pub min_items_per_page: usize,

    /// Last page an incremental run may reach
    #[serde(default = "defaults::auto_page_ceiling")]
    pub auto_page_ceiling: u32,

    /// Entries published before this date (YYYY-MM-DD) are rejected
    #[serde(default = "defaults::min_valid_date")]
    pub min_valid_date: String,

    /// Offset of the portal's local time from UTC, in hours
    #[serde(default = "defaults::utc_offset_hours")]
    pub utc_offset_hours: i32,
}

impl CrawlerConfig {
    /// The validity floor as a local midnight.
    pub fn min_valid_date(&self) -> Result<NaiveDateTime> {
        NaiveDate::parse_from_str(&self.min_valid_date, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or_else(|| {
                AppError::validation(format!(
                    "crawler.min_valid_date '{}' is not YYYY-MM-DD",
                    self.min_valid_date
                ))
            })
    }

    /// The portal's time zone.
    pub fn offset(&self) -> Result<FixedOffset> {
        portal_offset(self.utc_offset_hours).ok_or_else(|| {
            AppError::validation(format!(
                "crawler.utc_offset_hours {} is out of range",
                self.utc_offset_hours
            ))
        })
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            accept: defaults::accept(),
            accept_language: defaults::accept_language(),
            timeout_secs: defaults::timeout(),
            page_delay_ms: defaults::page_delay(),
            max_consecutive_stale: defaults::max_consecutive_stale(),
            max_no_new_pages: defaults::max_no_new_pages(),
            min_items_per_page: defaults::min_items_per_page(),
            auto_page_ceiling: defaults::auto_page_ceiling(),
            min_valid_date: defaults::min_valid_date(),
            utc_offset_hours: defaults::utc_offset_hours(),
        }
    }
}

/// Listing location and scraping rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Base that relative links are resolved against
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Listing URL with a `{page}` placeholder
    #[serde(default = "defaults::list_url_template")]
    pub list_url_template: String,

    /// Item, title, unit and time selectors
    #[serde(default)]
    pub selectors: ListingSelectors,
}

impl PortalConfig {
    /// URL of one listing page.
    pub fn page_url(&self, page: u32) -> String {
        self.list_url_template.replace("{page}", &page.to_string())
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            list_url_template: defaults::list_url_template(),
            selectors: ListingSelectors::default(),
        }
    }
}

/// Classification service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Chat-completions endpoint
    #[serde(default = "defaults::api_url")]
    pub api_url: String,

    /// Model name sent with every request
    #[serde(default = "defaults::model")]
    pub model: String,

    /// Bearer credential; classification is skipped when absent
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Titles per request
    #[serde(default = "defaults::max_batch_size")]
    pub max_batch_size: usize,

    /// Requests per batch before it is marked failed, the first one included
    #[serde(default = "defaults::max_attempts", alias = "max_retries")]
    pub max_attempts: u32,

    /// Backoff after the first failed request in seconds; doubles per failure
    #[serde(default = "defaults::backoff_base")]
    pub backoff_base_secs: u64,

    /// Request timeout in seconds
    #[serde(default = "defaults::classifier_timeout")]
    pub timeout_secs: u64,

    /// Sampling temperature
    #[serde(default = "defaults::temperature")]
    pub temperature: f32,

    /// Pause after a full-size batch, in milliseconds
    #[serde(default = "defaults::batch_pause")]
    pub batch_pause_ms: u64,
}

impl ClassifierConfig {
    /// The configured credential, if it is non-blank.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            api_url: defaults::api_url(),
            model: defaults::model(),
            api_key: None,
            max_batch_size: defaults::max_batch_size(),
            max_attempts: defaults::max_attempts(),
            backoff_base_secs: defaults::backoff_base(),
            timeout_secs: defaults::classifier_timeout(),
            temperature: defaults::temperature(),
            batch_pause_ms: defaults::batch_pause(),
        }
    }
}

/// Persisted record set location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON file holding every announcement
    #[serde(default = "defaults::data_file")]
    pub data_file: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_file: defaults::data_file(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/100.0.4896.75 Safari/537.36".into()
    }
    pub fn accept() -> String {
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8".into()
    }
    pub fn accept_language() -> String {
        "zh-CN,zh;q=0.8,en-US;q=0.5,en;q=0.3".into()
    }
    pub fn timeout() -> u64 {
        15
    }
    pub fn page_delay() -> u64 {
        1000
    }
    pub fn max_consecutive_stale() -> usize {
        5
    }
    pub fn max_no_new_pages() -> usize {
        10
    }
    pub fn min_items_per_page() -> usize {
        5
    }
    pub fn auto_page_ceiling() -> u32 {
        10
    }
    pub fn min_valid_date() -> String {
        "2000-01-01".into()
    }
    pub fn utc_offset_hours() -> i32 {
        8
    }

    // Portal defaults
    pub fn base_url() -> String {
        "https://oa.jlu.edu.cn/defaultroot/".into()
    }
    pub fn list_url_template() -> String {
        "https://oa.jlu.edu.cn/defaultroot/PortalInformation!jldxList.action?channelId=179577&startPage={page}".into()
    }

    // Classifier defaults
    pub fn api_url() -> String {
        "https://api.deepseek.com/v1/chat/completions".into()
    }
    pub fn model() -> String {
        "deepseek-chat".into()
    }
    pub fn max_batch_size() -> usize {
        15
    }
    pub fn max_attempts() -> u32 {
        3
    }
    pub fn backoff_base() -> u64 {
        1
    }
    pub fn classifier_timeout() -> u64 {
        45
    }
    pub fn temperature() -> f32 {
        0.1
    }
    pub fn batch_pause() -> u64 {
        1500
    }

    // Store defaults
    pub fn data_file() -> PathBuf {
        PathBuf::from("data/jlu_oa_data.json")
    }
}
