// src/models/announcement.rs

//! Announcement data structures.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::tags::UNCLASSIFIED;
use crate::utils::normalize_link;

/// One list item as scraped from a listing page, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawListingEntry {
    /// Title attribute, or the anchor text when the attribute is absent
    pub title: String,

    /// Time text exactly as printed
    pub raw_time: Option<String>,

    /// Publishing unit text
    pub unit: Option<String>,

    /// Link target as written in the page (may be relative)
    pub href: String,
}

/// Announcement identity: an absolute URL with the volatile `channelId`
/// parameter removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedLink(String);

impl NormalizedLink {
    /// Normalize an absolute URL.
    pub fn new(raw: &str) -> Self {
        Self(normalize_link(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedLink {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Announcements keyed by their identity.
pub type AnnouncementMap = HashMap<NormalizedLink, Announcement>;

/// The durable record for one announcement.
///
/// Serialized field names follow the store's column names. Files written
/// with the older Chinese keys still load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Announcement {
    /// Publish time, seconds resolution
    #[serde(
        rename = "timestamp",
        alias = "新闻发布时间戳",
        with = "chrono::serde::ts_seconds"
    )]
    pub published_at: DateTime<Utc>,

    /// Announcement title
    #[serde(alias = "新闻标题")]
    pub title: String,

    /// Publishing unit
    #[serde(alias = "发布单位")]
    pub unit: String,

    /// One taxonomy label, or a sentinel
    #[serde(rename = "tag_primary", alias = "一级分类TAG", default = "default_tag")]
    pub primary_tag: String,

    /// 1-5 keywords, or a single sentinel
    #[serde(rename = "tags_secondary", alias = "二级分类TAG", default = "default_tags")]
    pub secondary_tags: Vec<String>,

    /// Identity key
    #[serde(alias = "链接")]
    pub link: NormalizedLink,

    /// When the record was last written by a merge
    #[serde(
        rename = "update_time",
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_tag() -> String {
    UNCLASSIFIED.to_string()
}

fn default_tags() -> Vec<String> {
    vec![UNCLASSIFIED.to_string()]
}

impl Announcement {
    /// Restore the secondary-tag invariant on records read from older files.
    pub fn ensure_secondary_tags(&mut self) {
        self.secondary_tags.retain(|tag| !tag.trim().is_empty());
        if self.secondary_tags.is_empty() {
            self.secondary_tags = default_tags();
        }
    }

    /// Whether `tag` equals the primary tag or one of the secondary tags.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.primary_tag == tag || self.secondary_tags.iter().any(|t| t == tag)
    }
}
