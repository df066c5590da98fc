//! Headless RSS ingestion: scheduled, bounded-concurrency fetching of feeds
//! into a SQLite entry store.

pub mod config;
pub mod feed;
pub mod ingest;
pub mod storage;
