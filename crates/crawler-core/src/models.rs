use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Repository record as crawled from the search API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Stable opaque node ID, used as the primary key
    pub id: String,
    pub name: String,
    /// Owner login
    pub owner: String,
    pub stars: i64,
    pub url: String,
}

/// One page of search results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub repositories: Vec<Repository>,
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

/// Result of a single page request
///
/// Rate limits and failed requests are not errors: the fetch loop recovers
/// from both by sleeping and retrying the same cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Page(Page),
    /// Quota exhausted; `reset_at` is the epoch second at which it refills
    RateLimited { reset_at: Option<i64> },
    /// Any other failed attempt (non-success status, transport error, timeout)
    Failed {
        status: Option<u16>,
        message: String,
    },
}

/// Durable crawl position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub crawl_key: String,
    /// End cursor of the last persisted page
    pub cursor: Option<String>,
    /// Records persisted so far
    pub fetched: usize,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of a full crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    /// Records fetched from the upstream, including any resumed count
    pub fetched: usize,
    /// Rows written (inserted or updated) during this run
    pub stored: usize,
    /// Record count recovered from a checkpoint, if the run resumed
    pub resumed_from: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_serializes_flat() {
        let repo = Repository {
            id: "R_1".to_string(),
            name: "rust".to_string(),
            owner: "rust-lang".to_string(),
            stars: 100_000,
            url: "https://github.com/rust-lang/rust".to_string(),
        };

        let json = serde_json::to_value(&repo).unwrap();
        assert_eq!(json["id"], "R_1");
        assert_eq!(json["owner"], "rust-lang");
        assert_eq!(json["stars"], 100_000);
    }
}
