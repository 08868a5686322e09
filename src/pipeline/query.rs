// src/pipeline/query.rs

//! Read-side queries over the stored announcements.
//!
//! Produces the paginated list and the facet aggregate consumed by readers,
//! wrapped in the `{code, message, data}` response envelope.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{Announcement, AnnouncementMap};

/// Default page size for list queries.
pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    TimeDesc,
    TimeAsc,
}

impl FromStr for SortOrder {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "time_desc" => Ok(SortOrder::TimeDesc),
            "time_asc" => Ok(SortOrder::TimeAsc),
            other => Err(AppError::validation(format!(
                "unknown sort '{other}' (expected time_desc or time_asc)"
            ))),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortOrder::TimeDesc => "time_desc",
            SortOrder::TimeAsc => "time_asc",
        })
    }
}

/// Filters, ordering and pagination for a list query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnouncementQuery {
    /// 1-based page number
    pub page: usize,
    pub size: usize,
    pub sort: SortOrder,
    /// Exact publishing unit
    pub unit: Option<String>,
    /// Comma-separated tags; every one must match
    pub tags: Option<String>,
    /// Case-insensitive substring of title or unit
    pub keyword: Option<String>,
}

impl Default for AnnouncementQuery {
    fn default() -> Self {
        Self {
            page: 1,
            size: DEFAULT_PAGE_SIZE,
            sort: SortOrder::TimeDesc,
            unit: None,
            tags: None,
            keyword: None,
        }
    }
}

/// An announcement as returned to readers.
#[derive(Debug, Clone, Serialize)]
pub struct AnnouncementView<'a> {
    #[serde(flatten)]
    pub record: &'a Announcement,
    /// Publish date in the portal's time zone
    pub date: String,
}

/// One page of query results.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPage<'a> {
    pub current_page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub announcements: Vec<AnnouncementView<'a>>,
}

impl AnnouncementQuery {
    fn tag_list(&self) -> Vec<&str> {
        self.tags
            .as_deref()
            .map(|tags| {
                tags.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn matches(&self, record: &Announcement, tags: &[&str], keyword: Option<&str>) -> bool {
        if let Some(unit) = self.unit.as_deref().filter(|u| !u.is_empty()) {
            if record.unit != unit {
                return false;
            }
        }
        if !tags.iter().all(|tag| record.has_tag(tag)) {
            return false;
        }
        match keyword {
            Some(keyword) => {
                record.title.to_lowercase().contains(keyword)
                    || record.unit.to_lowercase().contains(keyword)
            }
            None => true,
        }
    }

    /// Filter, sort and paginate `records`.
    pub fn run<'a>(&self, records: &'a AnnouncementMap, offset: FixedOffset) -> QueryPage<'a> {
        let tags = self.tag_list();
        let keyword = self
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_lowercase);

        let mut matched: Vec<&Announcement> = records
            .values()
            .filter(|r| self.matches(r, &tags, keyword.as_deref()))
            .collect();
        matched.sort_by(|a, b| {
            let by_time = match self.sort {
                SortOrder::TimeDesc => b.published_at.cmp(&a.published_at),
                SortOrder::TimeAsc => a.published_at.cmp(&b.published_at),
            };
            by_time.then_with(|| a.link.cmp(&b.link))
        });

        let page = self.page.max(1);
        let size = self.size.max(1);
        let total_items = matched.len();
        let total_pages = total_items.div_ceil(size);

        let announcements = matched
            .into_iter()
            .skip((page - 1).saturating_mul(size))
            .take(size)
            .map(|record| AnnouncementView {
                record,
                date: record
                    .published_at
                    .with_timezone(&offset)
                    .format("%Y-%m-%d")
                    .to_string(),
            })
            .collect();

        QueryPage {
            current_page: page,
            page_size: size,
            total_pages,
            total_items,
            announcements,
        }
    }
}

/// A distinct value and how many announcements carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetCount {
    pub name: String,
    pub count: usize,
}

/// Distinct units and tags with counts, most common first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Facets {
    pub units: Vec<FacetCount>,
    pub tags_primary: Vec<FacetCount>,
    pub tags_secondary_all: Vec<FacetCount>,
}

impl Facets {
    pub fn collect(records: &AnnouncementMap) -> Self {
        let mut units: HashMap<&str, usize> = HashMap::new();
        let mut primary: HashMap<&str, usize> = HashMap::new();
        let mut secondary: HashMap<&str, usize> = HashMap::new();

        for record in records.values() {
            *units.entry(record.unit.as_str()).or_default() += 1;
            *primary.entry(record.primary_tag.as_str()).or_default() += 1;
            for tag in &record.secondary_tags {
                *secondary.entry(tag.as_str()).or_default() += 1;
            }
        }

        Self {
            units: ranked(units),
            tags_primary: ranked(primary),
            tags_secondary_all: ranked(secondary),
        }
    }
}

fn ranked(counts: HashMap<&str, usize>) -> Vec<FacetCount> {
    let mut facets: Vec<FacetCount> = counts
        .into_iter()
        .map(|(name, count)| FacetCount {
            name: name.to_string(),
            count,
        })
        .collect();
    facets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    facets
}

/// Response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub code: u16,
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 200,
            message: "Success".to_string(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NormalizedLink;
    use chrono::{TimeZone, Utc};

    fn offset() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    fn record(id: u32, ts: i64, title: &str, unit: &str, primary: &str, secondary: &[&str]) -> Announcement {
        Announcement {
            published_at: Utc.timestamp_opt(ts, 0).unwrap(),
            title: title.to_string(),
            unit: unit.to_string(),
            primary_tag: primary.to_string(),
            secondary_tags: secondary.iter().map(|s| s.to_string()).collect(),
            link: NormalizedLink::new(&format!("https://oa.jlu.edu.cn/r?id={id}")),
            updated_at: None,
        }
    }

    fn store() -> AnnouncementMap {
        [
            record(1, 1_762_650_000, "Python 编程竞赛报名", "计算机学院", "竞赛/奖学金", &["竞赛", "编程"]),
            record(2, 1_762_560_000, "图书馆闭馆通知", "图书馆", "学校公共设施运营", &["图书馆"]),
            record(3, 1_762_470_000, "英语竞赛初赛安排", "外国语学院", "竞赛/奖学金", &["竞赛", "英语"]),
            record(4, 1_762_380_000, "计算机学院讲座", "计算机学院", "讲座/社团活动/学校活动/项目", &["讲座"]),
        ]
        .into_iter()
        .map(|r| (r.link.clone(), r))
        .collect()
    }

    fn titles<'a>(page: &QueryPage<'a>) -> Vec<&'a str> {
        page.announcements.iter().map(|v| v.record.title.as_str()).collect()
    }

    #[test]
    fn test_default_query_newest_first() {
        let records = store();
        let page = AnnouncementQuery::default().run(&records, offset());
        assert_eq!(page.total_items, 4);
        assert_eq!(page.total_pages, 1);
        assert_eq!(titles(&page)[0], "Python 编程竞赛报名");
        assert_eq!(titles(&page)[3], "计算机学院讲座");
    }

    #[test]
    fn test_pagination_ascending() {
        let records = store();
        let query = AnnouncementQuery {
            page: 2,
            size: 3,
            sort: SortOrder::TimeAsc,
            ..AnnouncementQuery::default()
        };
        let page = query.run(&records, offset());
        assert_eq!(page.total_pages, 2);
        assert_eq!(titles(&page), vec!["Python 编程竞赛报名"]);
    }

    #[test]
    fn test_tags_must_all_match() {
        let records = store();
        let query = AnnouncementQuery {
            tags: Some("竞赛/奖学金, 英语".to_string()),
            ..AnnouncementQuery::default()
        };
        let page = query.run(&records, offset());
        assert_eq!(titles(&page), vec!["英语竞赛初赛安排"]);
    }

    #[test]
    fn test_keyword_matches_title_or_unit() {
        let records = store();
        let query = AnnouncementQuery {
            keyword: Some("python".to_string()),
            ..AnnouncementQuery::default()
        };
        assert_eq!(query.run(&records, offset()).total_items, 1);

        let query = AnnouncementQuery {
            keyword: Some("计算机".to_string()),
            unit: Some("计算机学院".to_string()),
            ..AnnouncementQuery::default()
        };
        assert_eq!(query.run(&records, offset()).total_items, 2);
    }

    #[test]
    fn test_view_shape() {
        let records = store();
        let query = AnnouncementQuery {
            size: 1,
            ..AnnouncementQuery::default()
        };
        let value = serde_json::to_value(ApiResponse::success(query.run(&records, offset()))).unwrap();
        assert_eq!(value["code"], 200);
        assert_eq!(value["message"], "Success");
        assert_eq!(value["data"]["currentPage"], 1);
        assert_eq!(value["data"]["totalPages"], 4);
        let first = &value["data"]["announcements"][0];
        assert_eq!(first["tag_primary"], "竞赛/奖学金");
        // 1762650000 is 2025-11-09 09:00 at UTC+8
        assert_eq!(first["date"], "2025-11-09");
    }

    #[test]
    fn test_facets_ranked() {
        let facets = Facets::collect(&store());
        assert_eq!(facets.units[0], FacetCount { name: "计算机学院".to_string(), count: 2 });
        assert_eq!(facets.tags_primary[0].name, "竞赛/奖学金");
        assert_eq!(facets.tags_secondary_all[0], FacetCount { name: "竞赛".to_string(), count: 2 });
        assert_eq!(facets.tags_secondary_all.len(), 5);
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("time_asc".parse::<SortOrder>().unwrap(), SortOrder::TimeAsc);
        assert!("newest".parse::<SortOrder>().is_err());
    }
}
