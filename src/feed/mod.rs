//! Feed retrieval and decoding.
//!
//! - [`fetcher`] - single bounded-time HTTP GET of a feed body
//! - [`parser`] - RSS 2.0 channel/item extraction with `quick-xml`
//! - [`date`] - strict RFC 1123 `pubDate` parsing

mod date;
mod fetcher;
mod parser;

pub use date::{parse_rfc1123, DateError};
pub use fetcher::{
    FeedSource, FetchError, HttpFetcher, DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_FEED_SIZE,
};
pub use parser::{parse_document, FetchedDocument, FetchedItem, ParseError};
