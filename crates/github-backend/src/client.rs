use std::time::Duration;

use tracing::debug;
use ureq::Agent;

use crate::convert::search_connection_to_page;
use crate::error::{GitHubError, Result};
use crate::models::*;
use crate::query::{STARRED_REPOSITORIES, search_document};
use crawler_core::Page;

pub const DEFAULT_GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// Per-request deadline unless overridden
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// GitHub GraphQL API client for repository search
pub struct GitHubClient {
    agent: Agent,
    endpoint: String,
    token: String,
    search_query: String,
    document: String,
}

impl GitHubClient {
    /// Create a new GitHub client with a custom GraphQL endpoint (for GitHub Enterprise or testing)
    pub fn with_endpoint(endpoint: &str, token: &str) -> Self {
        Self::with_timeout(endpoint, token, DEFAULT_TIMEOUT)
    }

    /// Create a new GitHub client with an explicit per-request deadline
    pub fn with_timeout(endpoint: &str, token: &str, timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: token.to_string(),
            search_query: STARRED_REPOSITORIES.to_string(),
            document: search_document(STARRED_REPOSITORIES),
        }
    }

    /// The search filter sent upstream; doubles as the checkpoint key
    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    /// Build the Authorization header value
    fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Check response status and return error if not successful
    fn check_response(
        &self,
        mut response: ureq::http::Response<ureq::Body>,
    ) -> Result<ureq::http::Response<ureq::Body>> {
        let status = response.status().as_u16();

        if status == 200 {
            return Ok(response);
        }

        // Any 403 from the search endpoint means the quota ran out
        if status == 403 {
            let reset_at = response
                .headers()
                .get("x-ratelimit-reset")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<i64>().ok());
            return Err(GitHubError::RateLimited { reset_at });
        }

        let body = response
            .body_mut()
            .read_to_string()
            .unwrap_or_else(|_| String::new());

        let message = if body.is_empty() {
            format!("HTTP {}", status)
        } else {
            body
        };

        Err(GitHubError::Api { status, message })
    }

    // ==================== Search Operations ====================

    /// Fetch one page of starred repositories following `after`
    pub fn search_repositories(&self, after: Option<&str>) -> Result<Page> {
        let request = GraphQlRequest {
            query: &self.document,
            variables: SearchVariables { after },
        };

        debug!(endpoint = %self.endpoint, after = ?after, "POST search");

        let response = self
            .agent
            .post(&self.endpoint)
            .header("Authorization", &self.auth_header())
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .send_json(&request)
            .map_err(GitHubError::Http)?;

        let mut response = self.check_response(response)?;
        let body = response.body_mut().read_to_string()?;
        let parsed: GraphQlResponse<SearchData> = serde_json::from_str(&body)?;

        match parsed.data {
            Some(data) => search_connection_to_page(data.search),
            None => {
                let messages: Vec<String> = parsed.errors.into_iter().map(|e| e.message).collect();
                let message = if messages.is_empty() {
                    "response carried neither data nor errors".to_string()
                } else {
                    messages.join("; ")
                };
                Err(GitHubError::GraphQl(message))
            }
        }
    }
}
