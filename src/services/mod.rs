// src/services/mod.rs

//! Network-facing services: the listing fetcher and the classifier client.

pub mod classifier;
pub mod listing;
pub mod pacing;

pub use classifier::{ChatTransport, Classification, ClassifierClient, HttpChatTransport, RetryPolicy};
pub use listing::{ListingFetcher, ListingPage, ListingSource, extract_entries};
pub use pacing::{Sleeper, TokioSleeper};
