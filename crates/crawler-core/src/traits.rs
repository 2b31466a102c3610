use std::collections::HashMap;

use crate::error::Result;
use crate::models::*;

/// Upstream that serves search results one cursor-addressed page at a time
pub trait PageSource {
    /// Request the page following `after` (`None` for the first page).
    ///
    /// Recoverable conditions are reported through [`PageOutcome`]; `Err` is
    /// reserved for responses the loop cannot make sense of.
    fn fetch_page(&self, after: Option<&str>) -> Result<PageOutcome>;
}

/// Durable store for crawled repositories
///
/// Implementors provide `write_batch`; callers go through `upsert`, which
/// skips empty batches entirely and collapses duplicate IDs before writing.
pub trait RepoStore {
    /// Write a non-empty batch with unique IDs in one transaction.
    ///
    /// New rows are inserted in full. Existing rows only get `stars` and
    /// their last-updated timestamp refreshed.
    fn write_batch(&mut self, records: &[Repository]) -> Result<usize>;

    /// Insert or refresh `records`, returning the number of rows written
    fn upsert(&mut self, records: &[Repository]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let unique = dedupe_by_id(records);
        self.write_batch(&unique)
    }

    fn load_checkpoint(&mut self, crawl_key: &str) -> Result<Option<Checkpoint>>;

    fn save_checkpoint(&mut self, checkpoint: &Checkpoint) -> Result<()>;

    fn clear_checkpoint(&mut self, crawl_key: &str) -> Result<()>;
}

/// Collapse records sharing an ID, keeping the first position and the last value
pub fn dedupe_by_id(records: &[Repository]) -> Vec<Repository> {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(records.len());
    let mut unique: Vec<Repository> = Vec::with_capacity(records.len());

    for record in records {
        match index.get(record.id.as_str()) {
            Some(&pos) => unique[pos] = record.clone(),
            None => {
                index.insert(record.id.as_str(), unique.len());
                unique.push(record.clone());
            }
        }
    }

    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(id: &str, stars: i64) -> Repository {
        Repository {
            id: id.to_string(),
            name: format!("name-{}", id),
            owner: "owner".to_string(),
            stars,
            url: format!("https://github.com/owner/{}", id),
        }
    }

    /// Store that counts every call reaching the backend
    #[derive(Default)]
    struct StubStore {
        writes: usize,
        last_batch: Vec<Repository>,
    }

    impl RepoStore for StubStore {
        fn write_batch(&mut self, records: &[Repository]) -> Result<usize> {
            self.writes += 1;
            self.last_batch = records.to_vec();
            Ok(records.len())
        }

        fn load_checkpoint(&mut self, _crawl_key: &str) -> Result<Option<Checkpoint>> {
            Ok(None)
        }

        fn save_checkpoint(&mut self, _checkpoint: &Checkpoint) -> Result<()> {
            Ok(())
        }

        fn clear_checkpoint(&mut self, _crawl_key: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn upsert_empty_batch_touches_nothing() {
        let mut store = StubStore::default();

        let written = store.upsert(&[]).unwrap();

        assert_eq!(written, 0);
        assert_eq!(store.writes, 0);
    }

    #[test]
    fn upsert_collapses_duplicate_ids_before_writing() {
        let mut store = StubStore::default();

        let written = store
            .upsert(&[repo("a", 1), repo("b", 2), repo("a", 3)])
            .unwrap();

        assert_eq!(written, 2);
        assert_eq!(store.writes, 1);
        assert_eq!(store.last_batch[0].id, "a");
        assert_eq!(store.last_batch[0].stars, 3);
        assert_eq!(store.last_batch[1].id, "b");
    }

    #[test]
    fn dedupe_preserves_order_of_first_appearance() {
        let unique = dedupe_by_id(&[repo("c", 1), repo("a", 1), repo("c", 9), repo("b", 1)]);
        let ids: Vec<&str> = unique.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }
}
