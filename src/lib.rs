// src/lib.rs

//! Incremental crawler for the university OA announcement list.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

#[cfg(test)]
mod testing;
