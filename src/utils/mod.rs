//! Utility functions and helpers.

pub mod http;
pub mod time;
pub mod url;

pub use self::time::{ParsedTime, parse_time};
pub use self::url::{normalize_link, resolve_url};
