mod accounts;
mod feeds;
mod posts;
mod schema;
mod store;
mod types;

pub use schema::Database;
pub use store::EntryStore;
pub use types::{Account, Feed, NewPost, Post, StoreError};
