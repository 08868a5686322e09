//! Storage abstractions for announcement persistence.
//!
//! The record set lives in a single JSON array, newest first:
//!
//! ```text
//! data/
//! └── jlu_oa_data.json      # every announcement, keyed by normalized link
//! ```

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::AnnouncementMap;

// Re-export for convenience
pub use local::LocalStorage;

/// Trait for announcement storage backends.
#[async_trait]
pub trait AnnouncementStorage: Send + Sync {
    /// Load every stored announcement, keyed by normalized link.
    ///
    /// A missing store yields an empty map; an unreadable one is an error.
    async fn load_announcements(&self) -> Result<AnnouncementMap>;

    /// Replace the stored set with `announcements`.
    async fn save_announcements(&self, announcements: &AnnouncementMap) -> Result<()>;
}
