use std::time::Duration;

use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{CrawlError, Result};
use crate::models::*;
use crate::traits::PageSource;

/// Records per search request. Fixed by the upstream protocol.
pub const PAGE_SIZE: usize = 100;

pub const DEFAULT_MAX_COUNT: usize = 100_000;
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_FALLBACK_DELAY: Duration = Duration::from_secs(10);

/// Assumed wait when a rate-limited response carries no usable reset time
const DEFAULT_RATE_LIMIT_WAIT_SECS: i64 = 60;

/// Knobs for a single fetch run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Upper bound on records returned
    pub max_count: usize,
    /// Pause after every request, independent of any backoff
    pub request_delay: Duration,
    /// Pause after a failed request before retrying the same cursor
    pub fallback_delay: Duration,
    /// Consecutive failures tolerated before giving up; `None` retries forever
    pub max_retries: Option<u32>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_count: DEFAULT_MAX_COUNT,
            request_delay: DEFAULT_REQUEST_DELAY,
            fallback_delay: DEFAULT_FALLBACK_DELAY,
            max_retries: None,
        }
    }
}

/// Where a fetch run begins
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartPosition {
    pub cursor: Option<String>,
    /// Records already collected by an earlier run
    pub fetched: usize,
}

/// Cursor-paginated crawl over a [`PageSource`]
pub struct Fetcher<'a> {
    source: &'a dyn PageSource,
    clock: &'a dyn Clock,
    options: FetchOptions,
}

impl<'a> Fetcher<'a> {
    pub fn new(source: &'a dyn PageSource, clock: &'a dyn Clock, options: FetchOptions) -> Self {
        Self {
            source,
            clock,
            options,
        }
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Fetch up to `max_count` repositories from the first page onward
    pub fn fetch(&self) -> Result<Vec<Repository>> {
        let mut repos = Vec::new();
        self.fetch_with(StartPosition::default(), |records, _next| {
            repos.extend_from_slice(records);
            Ok(())
        })?;
        Ok(repos)
    }

    /// Drive the pagination loop from `start`, handing each page to `on_page`.
    ///
    /// `on_page` receives the page's records, clipped so the running total
    /// never exceeds `max_count`, and the cursor of the following page
    /// (`None` once the upstream reports no further pages). Rate limits and
    /// failed requests are retried on the same cursor. Returns the total
    /// record count including `start.fetched`.
    pub fn fetch_with<F>(&self, start: StartPosition, mut on_page: F) -> Result<usize>
    where
        F: FnMut(&[Repository], Option<&str>) -> Result<()>,
    {
        let max_count = self.options.max_count;
        let mut cursor = start.cursor;
        let mut fetched = start.fetched;
        let mut failures: u32 = 0;

        while fetched < max_count {
            debug!(cursor = cursor.as_deref().unwrap_or("<start>"), "Requesting page");

            match self.source.fetch_page(cursor.as_deref())? {
                PageOutcome::Page(page) => {
                    failures = 0;

                    let take = page.repositories.len().min(max_count - fetched);
                    let accepted = &page.repositories[..take];
                    fetched += take;

                    let next = if page.has_next_page {
                        page.end_cursor
                    } else {
                        None
                    };
                    on_page(accepted, next.as_deref())?;
                    info!("Fetched {} repositories so far", fetched);

                    match next {
                        Some(next) => cursor = Some(next),
                        None => break,
                    }
                }
                PageOutcome::RateLimited { reset_at } => {
                    let wait = self.rate_limit_wait(reset_at);
                    warn!("Rate limit reached. Sleeping for {} seconds", wait.as_secs());
                    self.clock.sleep(wait);
                    info!("Fetched {} repositories so far", fetched);
                }
                PageOutcome::Failed { status, message } => {
                    failures += 1;
                    let last = match status {
                        Some(status) => format!("HTTP {}: {}", status, message),
                        None => message,
                    };
                    warn!("Request failed (attempt {}): {}", failures, last);

                    if let Some(max_retries) = self.options.max_retries {
                        if failures >= max_retries {
                            return Err(CrawlError::RetriesExhausted {
                                attempts: failures,
                                last,
                            });
                        }
                    }

                    self.clock.sleep(self.options.fallback_delay);
                    info!("Fetched {} repositories so far", fetched);
                }
            }

            self.clock.sleep(self.options.request_delay);
        }

        Ok(fetched)
    }

    /// Seconds until the quota resets, never less than one
    fn rate_limit_wait(&self, reset_at: Option<i64>) -> Duration {
        let now = self.clock.now_epoch_secs();
        let reset_at = reset_at.unwrap_or(now.saturating_add(DEFAULT_RATE_LIMIT_WAIT_SECS));
        let secs = reset_at.saturating_sub(now).max(1);
        Duration::from_secs(secs as u64)
    }
}
