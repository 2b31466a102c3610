use chrono::{DateTime, Utc};
use crawler_core::{Checkpoint, RepoStore, Repository};
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{Connection, Row};
use tokio::runtime::Runtime;
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::settings::DatabaseSettings;

/// Idempotent DDL for the repository and checkpoint tables
pub const SCHEMA: &str = include_str!("../schema.sql");

const UPSERT_REPOS: &str = r#"
INSERT INTO github_repos (id, name, owner, stars, url, updated_at)
SELECT id, name, owner, stars, url, NOW()
FROM UNNEST($1::text[], $2::text[], $3::text[], $4::bigint[], $5::text[])
    AS t(id, name, owner, stars, url)
ON CONFLICT (id)
DO UPDATE SET stars = EXCLUDED.stars, updated_at = NOW()
"#;

const LOAD_CHECKPOINT: &str = r#"
SELECT crawl_key, end_cursor, fetched, updated_at
FROM crawl_checkpoints
WHERE crawl_key = $1
"#;

const SAVE_CHECKPOINT: &str = r#"
INSERT INTO crawl_checkpoints (crawl_key, end_cursor, fetched, updated_at)
VALUES ($1, $2, $3, $4)
ON CONFLICT (crawl_key)
DO UPDATE SET end_cursor = EXCLUDED.end_cursor,
              fetched = EXCLUDED.fetched,
              updated_at = EXCLUDED.updated_at
"#;

const CLEAR_CHECKPOINT: &str = "DELETE FROM crawl_checkpoints WHERE crawl_key = $1";

/// [`RepoStore`] backed by a single PostgreSQL connection.
///
/// The connection is opened on first use and kept until [`close`](Self::close).
/// sqlx is driven on a private current-thread runtime so callers stay blocking.
pub struct PostgresStore {
    runtime: Runtime,
    options: PgConnectOptions,
    target: String,
    conn: Option<PgConnection>,
}

impl PostgresStore {
    pub fn new(settings: &DatabaseSettings) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            runtime,
            options: settings.connect_options()?,
            target: settings.describe(),
            conn: None,
        })
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    fn connection(&mut self) -> Result<(&Runtime, &mut PgConnection)> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => {
                info!("Connecting to PostgreSQL at {}", self.target);
                self.runtime
                    .block_on(PgConnection::connect_with(&self.options))?
            }
        };
        let conn = self.conn.insert(conn);
        Ok((&self.runtime, conn))
    }

    /// Create the tables if they do not exist yet
    pub fn create_schema(&mut self) -> Result<()> {
        let (runtime, conn) = self.connection()?;
        runtime.block_on(sqlx::raw_sql(SCHEMA).execute(&mut *conn))?;
        Ok(())
    }

    /// Upsert `records` in one statement inside one transaction
    pub fn upsert_rows(&mut self, records: &[Repository]) -> Result<usize> {
        let mut ids = Vec::with_capacity(records.len());
        let mut names = Vec::with_capacity(records.len());
        let mut owners = Vec::with_capacity(records.len());
        let mut stars = Vec::with_capacity(records.len());
        let mut urls = Vec::with_capacity(records.len());
        for r in records {
            ids.push(r.id.clone());
            names.push(r.name.clone());
            owners.push(r.owner.clone());
            stars.push(r.stars);
            urls.push(r.url.clone());
        }

        let (runtime, conn) = self.connection()?;
        let affected = runtime.block_on(async move {
            let mut tx = conn.begin().await?;
            let result = sqlx::query(UPSERT_REPOS)
                .bind(ids)
                .bind(names)
                .bind(owners)
                .bind(stars)
                .bind(urls)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            Ok::<_, sqlx::Error>(result.rows_affected())
        })?;

        debug!("Upserted {} rows", affected);
        Ok(affected as usize)
    }

    pub fn get_checkpoint(&mut self, crawl_key: &str) -> Result<Option<Checkpoint>> {
        let (runtime, conn) = self.connection()?;
        let row = runtime.block_on(
            sqlx::query(LOAD_CHECKPOINT)
                .bind(crawl_key)
                .fetch_optional(&mut *conn),
        )?;

        let Some(row) = row else {
            return Ok(None);
        };

        let fetched: i64 = row.try_get("fetched")?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at")?;
        Ok(Some(Checkpoint {
            crawl_key: row.try_get("crawl_key")?,
            cursor: row.try_get("end_cursor")?,
            fetched: usize::try_from(fetched)
                .map_err(|_| StoreError::InvalidValue(format!("fetched = {}", fetched)))?,
            updated_at,
        }))
    }

    pub fn put_checkpoint(&mut self, checkpoint: &Checkpoint) -> Result<()> {
        let fetched = i64::try_from(checkpoint.fetched)
            .map_err(|_| StoreError::InvalidValue(format!("fetched = {}", checkpoint.fetched)))?;

        let (runtime, conn) = self.connection()?;
        runtime.block_on(
            sqlx::query(SAVE_CHECKPOINT)
                .bind(&checkpoint.crawl_key)
                .bind(checkpoint.cursor.as_deref())
                .bind(fetched)
                .bind(checkpoint.updated_at)
                .execute(&mut *conn),
        )?;
        Ok(())
    }

    pub fn delete_checkpoint(&mut self, crawl_key: &str) -> Result<()> {
        let (runtime, conn) = self.connection()?;
        runtime.block_on(
            sqlx::query(CLEAR_CHECKPOINT)
                .bind(crawl_key)
                .execute(&mut *conn),
        )?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn get_repository(&mut self, id: &str) -> Result<Option<Repository>> {
        let (runtime, conn) = self.connection()?;
        let row = runtime.block_on(
            sqlx::query("SELECT id, name, owner, stars, url FROM github_repos WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *conn),
        )?;

        row.map(|row| -> Result<Repository> {
            Ok(Repository {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                owner: row.try_get("owner")?,
                stars: row.try_get("stars")?,
                url: row.try_get("url")?,
            })
        })
        .transpose()
    }

    /// Close the connection, if one was opened
    pub fn close(mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            self.runtime.block_on(conn.close())?;
            debug!("Closed PostgreSQL connection");
        }
        Ok(())
    }
}

impl RepoStore for PostgresStore {
    fn write_batch(&mut self, records: &[Repository]) -> crawler_core::Result<usize> {
        Ok(self.upsert_rows(records)?)
    }

    fn load_checkpoint(&mut self, crawl_key: &str) -> crawler_core::Result<Option<Checkpoint>> {
        Ok(self.get_checkpoint(crawl_key)?)
    }

    fn save_checkpoint(&mut self, checkpoint: &Checkpoint) -> crawler_core::Result<()> {
        Ok(self.put_checkpoint(checkpoint)?)
    }

    fn clear_checkpoint(&mut self, crawl_key: &str) -> crawler_core::Result<()> {
        Ok(self.delete_checkpoint(crawl_key)?)
    }
}
