// src/testing.rs

//! In-memory fakes for the network and timer seams.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::RawListingEntry;
use crate::services::classifier::{ChatRequest, ChatTransport};
use crate::services::listing::{ListingPage, ListingSource};
use crate::services::pacing::Sleeper;

/// Records requested waits without waiting.
#[derive(Default)]
pub struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn recorded(&self) -> Vec<Duration> {
        self.waits.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut waits) = self.waits.lock() {
            waits.push(duration);
        }
    }
}

/// Shared call counter handed out before a fake is boxed.
#[derive(Clone, Default)]
pub struct CallCount(Arc<AtomicUsize>);

impl CallCount {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Replays canned replies in order, then fails every further call.
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<String>>>,
    calls: CallCount,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: CallCount::default(),
        }
    }

    pub fn failing() -> Self {
        Self::new(Vec::new())
    }

    pub fn calls(&self) -> CallCount {
        self.calls.clone()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn complete(&self, _request: &ChatRequest) -> Result<String> {
        self.calls.bump();
        self.replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front())
            .unwrap_or_else(|| Err(AppError::classification("service unavailable")))
    }
}

/// Serves listing pages from memory. Unknown pages are empty.
#[derive(Default)]
pub struct FixtureSource {
    pages: HashMap<u32, ListingPage>,
    broken: HashSet<u32>,
    fetched: Mutex<Vec<u32>>,
}

impl FixtureSource {
    pub fn page(self, number: u32, entries: Vec<RawListingEntry>) -> Self {
        let item_count = entries.len();
        self.page_with_items(number, item_count, entries)
    }

    /// A page whose markup held `item_count` list items, only `entries` of
    /// them usable.
    pub fn page_with_items(
        mut self,
        number: u32,
        item_count: usize,
        entries: Vec<RawListingEntry>,
    ) -> Self {
        self.pages.insert(number, ListingPage { item_count, entries });
        self
    }

    pub fn broken(mut self, number: u32) -> Self {
        self.broken.insert(number);
        self
    }

    pub fn fetched(&self) -> Vec<u32> {
        self.fetched.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ListingSource for FixtureSource {
    async fn fetch_page(&self, page: u32) -> Result<ListingPage> {
        if let Ok(mut fetched) = self.fetched.lock() {
            fetched.push(page);
        }
        if self.broken.contains(&page) {
            return Err(AppError::crawl(format!("page {page}"), "connection reset"));
        }
        Ok(self.pages.get(&page).cloned().unwrap_or_default())
    }
}

/// A listing entry with both time and unit present.
pub fn entry(title: &str, raw_time: &str, href: &str) -> RawListingEntry {
    RawListingEntry {
        title: title.to_string(),
        raw_time: Some(raw_time.to_string()),
        unit: Some("教务处".to_string()),
        href: href.to_string(),
    }
}
