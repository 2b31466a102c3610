use thiserror::Error;

#[derive(Error, Debug)]
pub enum GitHubError {
    #[error("HTTP error: {0}")]
    Http(#[from] ureq::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited")]
    RateLimited {
        /// Epoch second from `X-RateLimit-Reset`, when present
        reset_at: Option<i64>,
    },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("GraphQL error: {0}")]
    GraphQl(String),
}

pub type Result<T> = std::result::Result<T, GitHubError>;
