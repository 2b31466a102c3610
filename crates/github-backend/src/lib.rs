pub mod client;
mod convert;
pub mod error;
pub mod models;
pub mod query;
mod trait_impl;


pub use client::{DEFAULT_GRAPHQL_URL, DEFAULT_TIMEOUT, GitHubClient};
pub use error::{GitHubError, Result};
pub use query::STARRED_REPOSITORIES;

// Re-export crawler-core types for convenience
pub use crawler_core::{CrawlError, PageOutcome, PageSource};
