pub mod clock;
pub mod crawler;
pub mod error;
pub mod fetcher;
pub mod memory;
pub mod models;
pub mod traits;

#[cfg(test)]
mod testing;

pub use clock::{Clock, SystemClock};
pub use crawler::{Crawler, PersistMode};
pub use error::{CrawlError, Result};
pub use fetcher::{FetchOptions, Fetcher, StartPosition, PAGE_SIZE};
pub use memory::{MemoryStore, StoredRepository};
pub use models::*;
pub use traits::{dedupe_by_id, PageSource, RepoStore};
