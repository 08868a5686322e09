// src/services/listing.rs

//! Listing page fetcher.
//!
//! Retrieves one page of the announcement list and turns each list item into
//! a [`RawListingEntry`] using the configured CSS selectors.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{ListingSelectors, PortalConfig, RawListingEntry};
use crate::utils::http::fetch_text;

/// One fetched listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// List items matched on the page, usable or not
    pub item_count: usize,
    /// Items that carried an anchor and at least a time or a unit
    pub entries: Vec<RawListingEntry>,
}

/// A source of listing pages.
///
/// An `Err` means the page could not be retrieved at all; the crawl treats it
/// as fatal and does not retry.
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch_page(&self, page: u32) -> Result<ListingPage>;
}

/// Fetches listing pages from the portal over HTTP.
pub struct ListingFetcher {
    client: Client,
    portal: PortalConfig,
}

impl ListingFetcher {
    /// Create a fetcher sharing the given client and its identity headers.
    pub fn new(client: Client, portal: PortalConfig) -> Self {
        Self { client, portal }
    }
}

#[async_trait]
impl ListingSource for ListingFetcher {
    async fn fetch_page(&self, page: u32) -> Result<ListingPage> {
        let url = self.portal.page_url(page);
        log::info!("Fetching page {page}: {url}");

        let html = fetch_text(&self.client, &url)
            .await
            .map_err(|e| AppError::crawl(&url, e))?;
        extract_entries(&html, &self.portal.selectors)
    }
}

/// Compiled form of [`ListingSelectors`].
struct CompiledSelectors<'a> {
    item: Selector,
    title: Selector,
    unit: Selector,
    time: Vec<Selector>,
    title_attr: &'a str,
    attr_name: &'a str,
}

impl<'a> CompiledSelectors<'a> {
    fn compile(selectors: &'a ListingSelectors) -> Result<Self> {
        Ok(Self {
            item: parse_selector(&selectors.item_selector)?,
            title: parse_selector(&selectors.title_selector)?,
            unit: parse_selector(&selectors.unit_selector)?,
            time: selectors
                .time_selectors
                .iter()
                .map(|s| parse_selector(s))
                .collect::<Result<_>>()?,
            title_attr: &selectors.title_attr,
            attr_name: &selectors.attr_name,
        })
    }
}

/// Extract the raw entries of one listing page, in page order.
///
/// Items without a title anchor are dropped silently; items with neither a
/// time nor a unit are dropped with a warning. Dropped items still count
/// towards `item_count`.
pub fn extract_entries(html: &str, selectors: &ListingSelectors) -> Result<ListingPage> {
    let compiled = CompiledSelectors::compile(selectors)?;
    let document = Html::parse_document(html);

    let mut page = ListingPage::default();
    for item in document.select(&compiled.item) {
        page.item_count += 1;
        if let Some(entry) = parse_item(&item, &compiled) {
            page.entries.push(entry);
        }
    }
    Ok(page)
}

fn parse_item(item: &ElementRef, selectors: &CompiledSelectors) -> Option<RawListingEntry> {
    let anchor = item.select(&selectors.title).next()?;

    let title = anchor
        .value()
        .attr(selectors.title_attr)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| stripped_text(&anchor));
    let href = anchor
        .value()
        .attr(selectors.attr_name)
        .unwrap_or("")
        .trim()
        .to_string();

    let raw_time = selectors
        .time
        .iter()
        .find_map(|sel| item.select(sel).next())
        .map(|el| stripped_text(&el))
        .filter(|t| !t.is_empty());
    let unit = item
        .select(&selectors.unit)
        .next()
        .map(|el| stripped_text(&el))
        .filter(|u| !u.is_empty());

    if raw_time.is_none() && unit.is_none() {
        log::warn!("Skipping list item '{title}': no time and no publishing unit");
        return None;
    }

    Some(RawListingEntry {
        title,
        raw_time,
        unit,
        href,
    })
}

/// Concatenate an element's text nodes, each trimmed.
fn stripped_text(element: &ElementRef) -> String {
    element.text().map(str::trim).collect()
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
