//! Implementation of crawler-core traits for GitHubClient

use crawler_core::{CrawlError, PageOutcome, PageSource, Result};
use tracing::debug;

use crate::client::GitHubClient;
use crate::error::GitHubError;

impl PageSource for GitHubClient {
    fn fetch_page(&self, after: Option<&str>) -> Result<PageOutcome> {
        match self.search_repositories(after) {
            Ok(page) => Ok(PageOutcome::Page(page)),
            Err(GitHubError::RateLimited { reset_at }) => Ok(PageOutcome::RateLimited { reset_at }),
            Err(GitHubError::Api { status, message }) => Ok(PageOutcome::Failed {
                status: Some(status),
                message,
            }),
            // Transport failures, including deadline expiry, are retried like bad statuses
            Err(GitHubError::Http(e)) => {
                debug!("Transport error: {:?}", e);
                Ok(PageOutcome::Failed {
                    status: None,
                    message: e.to_string(),
                })
            }
            Err(GitHubError::GraphQl(message)) => Ok(PageOutcome::Failed {
                status: None,
                message: format!("GraphQL error: {}", message),
            }),
            // A 200 that does not decode would fail the same way on every retry
            Err(GitHubError::Parse(e)) => Err(CrawlError::Parse(e.to_string())),
        }
    }
}
