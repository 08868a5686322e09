// src/models/selectors.rs

//! CSS selectors for scraping the announcement list.

use serde::{Deserialize, Serialize};

/// CSS selectors for scraping a listing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSelectors {
    /// Selector for each item in the announcement list
    #[serde(default = "default_item_selector")]
    pub item_selector: String,

    /// Selector for the title anchor within an item
    #[serde(default = "default_title_selector")]
    pub title_selector: String,

    /// Selector for the publishing unit within an item
    #[serde(default = "default_unit_selector")]
    pub unit_selector: String,

    /// Selectors for the time element, tried in order
    #[serde(default = "default_time_selectors")]
    pub time_selectors: Vec<String>,

    /// Attribute preferred over the anchor text for the title
    #[serde(default = "default_title_attr")]
    pub title_attr: String,

    /// HTML attribute name for extracting links (usually "href")
    #[serde(default = "default_attr_name")]
    pub attr_name: String,
}

fn default_item_selector() -> String {
    ".list_box ul.list_li .li, .sub_ul .li, .sub_ul div.li".to_string()
}

fn default_title_selector() -> String {
    "a".to_string()
}

fn default_unit_selector() -> String {
    ".column".to_string()
}

fn default_time_selectors() -> Vec<String> {
    vec![
        ".time".to_string(),
        ".date".to_string(),
        "span[style*=\"color\"]".to_string(),
    ]
}

fn default_title_attr() -> String {
    "title".to_string()
}

fn default_attr_name() -> String {
    "href".to_string()
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            item_selector: default_item_selector(),
            title_selector: default_title_selector(),
            unit_selector: default_unit_selector(),
            time_selectors: default_time_selectors(),
            title_attr: default_title_attr(),
            attr_name: default_attr_name(),
        }
    }
}

impl ListingSelectors {
    /// Every selector string, for validation.
    pub fn all(&self) -> impl Iterator<Item = &str> {
        [
            self.item_selector.as_str(),
            self.title_selector.as_str(),
            self.unit_selector.as_str(),
        ]
        .into_iter()
        .chain(self.time_selectors.iter().map(String::as_str))
    }
}
