use thiserror::Error;

/// Common errors for the crawl loop, page sources and stores
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Giving up after {attempts} consecutive failed requests: {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

pub type Result<T> = std::result::Result<T, CrawlError>;
