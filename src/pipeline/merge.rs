// src/pipeline/merge.rs

//! Folding one run's announcements into the stored set.

use chrono::{DateTime, Utc};

use crate::models::AnnouncementMap;

/// Combine `existing` with `fresh`. Fresh records win on clashing links and
/// are stamped with `now` as their update time.
pub fn merge(existing: AnnouncementMap, fresh: AnnouncementMap, now: DateTime<Utc>) -> AnnouncementMap {
    let mut combined = existing;
    let mut replaced = 0usize;
    let added = fresh.len();

    for (link, mut announcement) in fresh {
        announcement.updated_at = Some(now);
        if combined.insert(link, announcement).is_some() {
            replaced += 1;
        }
    }

    if replaced > 0 {
        log::warn!("{replaced} stored announcements replaced by newer records");
    }
    log::info!(
        "Merged {added} new announcements; store now holds {}",
        combined.len()
    );
    combined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Announcement, NormalizedLink};
    use chrono::TimeZone;

    fn record(id: u32, title: &str) -> Announcement {
        Announcement {
            published_at: Utc.timestamp_opt(1_700_000_000 + i64::from(id), 0).unwrap(),
            title: title.to_string(),
            unit: "研究生院".to_string(),
            primary_tag: "其它信息".to_string(),
            secondary_tags: vec!["研究生".to_string()],
            link: NormalizedLink::new(&format!("https://oa.jlu.edu.cn/r?id={id}")),
            updated_at: None,
        }
    }

    fn map_of(records: Vec<Announcement>) -> AnnouncementMap {
        records.into_iter().map(|r| (r.link.clone(), r)).collect()
    }

    #[test]
    fn test_new_entry_wins_on_shared_key() {
        let now = Utc.timestamp_opt(1_762_000_000, 0).unwrap();
        let existing = map_of(vec![record(1, "old title"), record(2, "untouched")]);
        let fresh = map_of(vec![record(1, "new title"), record(3, "added")]);

        let combined = merge(existing, fresh, now);
        assert_eq!(combined.len(), 3);

        let shared = combined.get(&NormalizedLink::new("https://oa.jlu.edu.cn/r?id=1")).unwrap();
        assert_eq!(shared.title, "new title");
        assert_eq!(shared.updated_at, Some(now));

        let untouched = combined.get(&NormalizedLink::new("https://oa.jlu.edu.cn/r?id=2")).unwrap();
        assert_eq!(untouched.updated_at, None);
    }

    #[test]
    fn test_merge_into_empty() {
        let now = Utc::now();
        let combined = merge(AnnouncementMap::new(), map_of(vec![record(7, "t")]), now);
        assert_eq!(combined.len(), 1);
    }
}
