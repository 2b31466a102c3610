use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{Checkpoint, Repository};
use crate::traits::RepoStore;

/// Row held by [`MemoryStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRepository {
    pub repository: Repository,
    pub updated_at: DateTime<Utc>,
}

/// In-process [`RepoStore`] with the same conflict policy as the SQL store
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Vec<StoredRepository>,
    index: HashMap<String, usize>,
    checkpoints: HashMap<String, Checkpoint>,
    batches: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows in first-insertion order
    pub fn rows(&self) -> &[StoredRepository] {
        &self.rows
    }

    pub fn get(&self, id: &str) -> Option<&StoredRepository> {
        self.index.get(id).map(|&pos| &self.rows[pos])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of batches that reached `write_batch`
    pub fn batches(&self) -> usize {
        self.batches
    }

    /// Rows ordered by star count, highest first
    pub fn top(&self, limit: usize) -> Vec<&Repository> {
        let mut repos: Vec<&Repository> = self.rows.iter().map(|r| &r.repository).collect();
        repos.sort_by(|a, b| b.stars.cmp(&a.stars));
        repos.truncate(limit);
        repos
    }
}

impl RepoStore for MemoryStore {
    fn write_batch(&mut self, records: &[Repository]) -> Result<usize> {
        self.batches += 1;
        let now = Utc::now();

        for record in records {
            match self.index.get(&record.id) {
                Some(&pos) => {
                    let row = &mut self.rows[pos];
                    row.repository.stars = record.stars;
                    row.updated_at = now;
                }
                None => {
                    self.index.insert(record.id.clone(), self.rows.len());
                    self.rows.push(StoredRepository {
                        repository: record.clone(),
                        updated_at: now,
                    });
                }
            }
        }

        Ok(records.len())
    }

    fn load_checkpoint(&mut self, crawl_key: &str) -> Result<Option<Checkpoint>> {
        Ok(self.checkpoints.get(crawl_key).cloned())
    }

    fn save_checkpoint(&mut self, checkpoint: &Checkpoint) -> Result<()> {
        self.checkpoints
            .insert(checkpoint.crawl_key.clone(), checkpoint.clone());
        Ok(())
    }

    fn clear_checkpoint(&mut self, crawl_key: &str) -> Result<()> {
        self.checkpoints.remove(crawl_key);
        Ok(())
    }
}
