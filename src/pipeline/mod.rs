//! Pipeline entry points for crawler operations.
//!
//! - `run_crawler`: Fetch new announcements, classify them and merge them into the store
//! - `AnnouncementQuery` / `Facets`: Read-side views over the stored set

pub mod controller;
pub mod crawl;
pub mod merge;
pub mod query;

pub use controller::{
    AbortReason, CrawlController, CrawlOutcome, CrawlPlan, CrawlSettings, CrawlStats, StopReason,
    Termination,
};
pub use crawl::{CrawlReport, crawl_into_store, run_crawler};
pub use merge::merge;
pub use query::{AnnouncementQuery, ApiResponse, Facets, QueryPage, SortOrder};
