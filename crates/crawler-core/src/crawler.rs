use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::fetcher::{Fetcher, StartPosition};
use crate::models::{Checkpoint, CrawlSummary};
use crate::traits::RepoStore;

/// When fetched records reach the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PersistMode {
    /// Upsert every page as soon as it arrives and checkpoint the cursor
    #[default]
    PerPage,
    /// Hold the whole crawl in memory and upsert it once at the end
    Batch,
}

/// Couples a [`Fetcher`] with a [`RepoStore`] for one crawl run
pub struct Crawler<'a> {
    fetcher: Fetcher<'a>,
    crawl_key: String,
    mode: PersistMode,
    resume: bool,
}

impl<'a> Crawler<'a> {
    pub fn new(fetcher: Fetcher<'a>, crawl_key: &str) -> Self {
        Self {
            fetcher,
            crawl_key: crawl_key.to_string(),
            mode: PersistMode::default(),
            resume: true,
        }
    }

    pub fn with_mode(mut self, mode: PersistMode) -> Self {
        self.mode = mode;
        self
    }

    /// Whether a per-page crawl picks up from a stored checkpoint
    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    pub fn run(&self, store: &mut dyn RepoStore) -> Result<CrawlSummary> {
        match self.mode {
            PersistMode::Batch => self.run_batch(store),
            PersistMode::PerPage => self.run_per_page(store),
        }
    }

    fn run_batch(&self, store: &mut dyn RepoStore) -> Result<CrawlSummary> {
        let repos = self.fetcher.fetch()?;
        info!("Fetched {} repos, saving to database", repos.len());
        let stored = store.upsert(&repos)?;

        Ok(CrawlSummary {
            fetched: repos.len(),
            stored,
            resumed_from: None,
        })
    }

    fn run_per_page(&self, store: &mut dyn RepoStore) -> Result<CrawlSummary> {
        let checkpoint = if self.resume {
            store.load_checkpoint(&self.crawl_key)?
        } else {
            None
        };

        let start = match &checkpoint {
            Some(cp) => {
                info!(
                    "Resuming crawl '{}' after {} repositories",
                    self.crawl_key, cp.fetched
                );
                StartPosition {
                    cursor: cp.cursor.clone(),
                    fetched: cp.fetched,
                }
            }
            None => StartPosition::default(),
        };
        let resumed_from = checkpoint.map(|cp| cp.fetched);

        let max_count = self.fetcher.options().max_count;
        if resumed_from.is_some() && start.fetched >= max_count {
            warn!(
                "Checkpoint for '{}' already covers {} repositories, limit is {}; nothing to fetch",
                self.crawl_key, start.fetched, max_count
            );
        }

        let mut total = start.fetched;
        let mut stored = 0;
        let fetched = self.fetcher.fetch_with(start, |records, next| {
            stored += store.upsert(records)?;
            total += records.len();

            if let Some(next) = next {
                store.save_checkpoint(&Checkpoint {
                    crawl_key: self.crawl_key.clone(),
                    cursor: Some(next.to_string()),
                    fetched: total,
                    updated_at: Utc::now(),
                })?;
            }
            Ok(())
        })?;

        store.clear_checkpoint(&self.crawl_key)?;

        Ok(CrawlSummary {
            fetched: fetched.min(max_count),
            stored,
            resumed_from,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CrawlError;
    use crate::fetcher::FetchOptions;
    use crate::memory::MemoryStore;
    use crate::models::{Page, PageOutcome, Repository};
    use crate::testing::{repos, RecordingClock, ScriptedSource};

    const KEY: &str = "stars:>0";

    fn page(start: usize, len: usize, next: Option<&str>) -> PageOutcome {
        PageOutcome::Page(Page {
            repositories: repos(start, len),
            end_cursor: next.map(str::to_string),
            has_next_page: next.is_some(),
        })
    }

    fn options(max_count: usize) -> FetchOptions {
        FetchOptions {
            max_count,
            ..FetchOptions::default()
        }
    }

    #[test]
    fn batch_mode_writes_once_at_the_end() {
        let source = ScriptedSource::new(vec![page(0, 100, Some("c1")), page(100, 40, None)]);
        let clock = RecordingClock::new(0);
        let mut store = MemoryStore::new();

        let summary = Crawler::new(Fetcher::new(&source, &clock, options(1_000)), KEY)
            .with_mode(PersistMode::Batch)
            .run(&mut store)
            .unwrap();

        assert_eq!(summary.fetched, 140);
        assert_eq!(summary.stored, 140);
        assert_eq!(store.batches(), 1);
        assert_eq!(store.len(), 140);
    }

    #[test]
    fn batch_mode_with_nothing_fetched_skips_the_store() {
        let source = ScriptedSource::new(vec![page(0, 0, None)]);
        let clock = RecordingClock::new(0);
        let mut store = MemoryStore::new();

        let summary = Crawler::new(Fetcher::new(&source, &clock, options(10)), KEY)
            .with_mode(PersistMode::Batch)
            .run(&mut store)
            .unwrap();

        assert_eq!(summary.stored, 0);
        assert_eq!(store.batches(), 0);
    }

    #[test]
    fn end_to_end_five_records() {
        let source = ScriptedSource::new(vec![page(0, 5, None)]);
        let clock = RecordingClock::new(0);
        let mut store = MemoryStore::new();

        let fetched = Fetcher::new(&source, &clock, options(5)).fetch().unwrap();
        let stored = store.upsert(&fetched).unwrap();

        assert_eq!(fetched, repos(0, 5));
        assert_eq!(stored, 5);
        let ids: Vec<&str> = store
            .rows()
            .iter()
            .map(|r| r.repository.id.as_str())
            .collect();
        assert_eq!(ids, vec!["R_0", "R_1", "R_2", "R_3", "R_4"]);
    }

    #[test]
    fn per_page_mode_writes_each_page_and_clears_checkpoint() {
        let source = ScriptedSource::new(vec![
            page(0, 100, Some("c1")),
            page(100, 100, Some("c2")),
            page(200, 10, None),
        ]);
        let clock = RecordingClock::new(0);
        let mut store = MemoryStore::new();

        let summary = Crawler::new(Fetcher::new(&source, &clock, options(1_000)), KEY)
            .run(&mut store)
            .unwrap();

        assert_eq!(summary.fetched, 210);
        assert_eq!(summary.stored, 210);
        assert_eq!(summary.resumed_from, None);
        assert_eq!(store.batches(), 3);
        assert_eq!(store.load_checkpoint(KEY).unwrap(), None);
    }

    #[test]
    fn interrupted_crawl_resumes_from_checkpoint() {
        // First run dies with a malformed response on the third page
        let source = ScriptedSource::with_results(vec![
            Ok(page(0, 100, Some("c1"))),
            Ok(page(100, 100, Some("c2"))),
            Err(CrawlError::Parse("truncated body".to_string())),
        ]);
        let clock = RecordingClock::new(0);
        let mut store = MemoryStore::new();

        let err = Crawler::new(Fetcher::new(&source, &clock, options(1_000)), KEY)
            .run(&mut store)
            .unwrap_err();
        assert!(matches!(err, CrawlError::Parse(_)));

        let checkpoint = store.load_checkpoint(KEY).unwrap().unwrap();
        assert_eq!(checkpoint.cursor.as_deref(), Some("c2"));
        assert_eq!(checkpoint.fetched, 200);

        // Second run continues from c2 without refetching earlier pages
        let source = ScriptedSource::new(vec![page(200, 100, Some("c3")), page(300, 100, None)]);
        let summary = Crawler::new(Fetcher::new(&source, &clock, options(250)), KEY)
            .run(&mut store)
            .unwrap();

        assert_eq!(source.cursors(), vec![Some("c2".to_string())]);
        assert_eq!(summary.resumed_from, Some(200));
        assert_eq!(summary.fetched, 250);
        assert_eq!(summary.stored, 50);
        assert_eq!(store.len(), 250);
        assert_eq!(store.load_checkpoint(KEY).unwrap(), None);
    }

    #[test]
    fn checkpoint_beyond_limit_fetches_nothing() {
        let mut store = MemoryStore::new();
        store
            .save_checkpoint(&Checkpoint {
                crawl_key: KEY.to_string(),
                cursor: Some("c3".to_string()),
                fetched: 300,
                updated_at: Utc::now(),
            })
            .unwrap();
        let source = ScriptedSource::new(vec![]);
        let clock = RecordingClock::new(0);

        let summary = Crawler::new(Fetcher::new(&source, &clock, options(100)), KEY)
            .run(&mut store)
            .unwrap();

        assert!(source.cursors().is_empty());
        assert_eq!(summary.resumed_from, Some(300));
        assert_eq!(summary.fetched, 100);
        assert_eq!(summary.stored, 0);
        assert_eq!(store.load_checkpoint(KEY).unwrap(), None);
    }

    #[test]
    fn resume_disabled_ignores_checkpoint() {
        let mut store = MemoryStore::new();
        store
            .save_checkpoint(&Checkpoint {
                crawl_key: KEY.to_string(),
                cursor: Some("c9".to_string()),
                fetched: 900,
                updated_at: Utc::now(),
            })
            .unwrap();
        let source = ScriptedSource::new(vec![page(0, 3, None)]);
        let clock = RecordingClock::new(0);

        let summary = Crawler::new(Fetcher::new(&source, &clock, options(10)), KEY)
            .with_resume(false)
            .run(&mut store)
            .unwrap();

        assert_eq!(source.cursors(), vec![None]);
        assert_eq!(summary.fetched, 3);
        assert_eq!(summary.resumed_from, None);
    }

    #[test]
    fn recrawl_updates_star_counts_in_place() {
        let clock = RecordingClock::new(0);
        let mut store = MemoryStore::new();

        let first = ScriptedSource::new(vec![page(0, 5, None)]);
        Crawler::new(Fetcher::new(&first, &clock, options(5)), KEY)
            .run(&mut store)
            .unwrap();

        let mut bumped: Vec<Repository> = repos(0, 5);
        for repo in &mut bumped {
            repo.stars += 1;
            repo.name = format!("{}-renamed", repo.name);
        }
        let second = ScriptedSource::new(vec![PageOutcome::Page(Page {
            repositories: bumped,
            end_cursor: None,
            has_next_page: false,
        })]);
        Crawler::new(Fetcher::new(&second, &clock, options(5)), KEY)
            .run(&mut store)
            .unwrap();

        assert_eq!(store.len(), 5);
        let row = store.get("R_0").unwrap();
        assert_eq!(row.repository.stars, 100_001);
        assert_eq!(row.repository.name, "repo-0");
    }
}
