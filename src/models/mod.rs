// src/models/mod.rs

//! Domain models for the crawler application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod announcement;
mod config;
mod selectors;
pub mod tags;

// Re-export all public types
pub use announcement::{Announcement, AnnouncementMap, NormalizedLink, RawListingEntry};
pub use config::{
    API_KEY_ENV, ClassifierConfig, Config, CrawlerConfig, PortalConfig, StoreConfig,
};
pub use selectors::ListingSelectors;
pub use tags::{CLASSIFICATION_FAILED, PrimaryTag, UNCLASSIFIED};
