//! Local filesystem storage implementation.
//!
//! Records are written to a temporary sibling first and renamed over the
//! data file, so readers never observe a half-written store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{Announcement, AnnouncementMap, NormalizedLink};
use crate::storage::AnnouncementStorage;

/// Single-file JSON storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    /// Create a LocalStorage backed by the given data file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_dir().await?;

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl AnnouncementStorage for LocalStorage {
    async fn load_announcements(&self) -> Result<AnnouncementMap> {
        let Some(bytes) = self.read_bytes().await? else {
            log::info!("No data file at {}; starting empty", self.path.display());
            return Ok(AnnouncementMap::new());
        };

        let records: Vec<Announcement> = serde_json::from_slice(&bytes)?;
        let total = records.len();
        let map = rekey(records);
        if map.len() < total {
            log::warn!(
                "{} records in {} collapsed onto existing links",
                total - map.len(),
                self.path.display()
            );
        }
        log::info!("Loaded {} announcements from {}", map.len(), self.path.display());
        Ok(map)
    }

    async fn save_announcements(&self, announcements: &AnnouncementMap) -> Result<()> {
        let records = sorted_records(announcements);
        let bytes = serde_json::to_vec_pretty(&records)?;
        self.write_bytes(&bytes).await?;
        log::info!(
            "Saved {} announcements to {}",
            records.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Key records by link, normalizing links written by older versions.
fn rekey(records: Vec<Announcement>) -> AnnouncementMap {
    let mut map = AnnouncementMap::with_capacity(records.len());
    for mut record in records {
        record.link = NormalizedLink::new(record.link.as_str());
        record.ensure_secondary_tags();
        map.insert(record.link.clone(), record);
    }
    map
}

/// Newest first; ties broken by link so output is stable.
pub fn sorted_records(announcements: &AnnouncementMap) -> Vec<&Announcement> {
    let mut records: Vec<&Announcement> = announcements.values().collect();
    records.sort_by(|a, b| {
        b.published_at
            .cmp(&a.published_at)
            .then_with(|| a.link.cmp(&b.link))
    });
    records
}
