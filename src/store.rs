// src/store.rs
//! Read-only access to the story table.

use std::sync::{Arc, RwLock};

use deadpool_postgres::{Config, Pool, PoolConfig, Runtime};
use once_cell::sync::Lazy;
use regex::Regex;
use tokio_postgres::NoTls;
use tracing::debug;

use crate::config::DatabaseConfig;
use crate::error::StoreError;
use crate::story::RawStory;

/// Source of story rows. Every call is a full, unfiltered read.
#[async_trait::async_trait]
pub trait StoryStore: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<RawStory>, StoreError>;
    fn name(&self) -> &'static str;
}

static TABLE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$").expect("table name regex")
});

/// Build the single select issued per refresh. Columns are cast to the
/// shapes `RawStory` expects, whatever their declared types.
pub fn select_all_sql(table: &str) -> Result<String, StoreError> {
    if !TABLE_NAME.is_match(table) {
        return Err(StoreError::InvalidTable(table.to_string()));
    }
    Ok(format!(
        "SELECT id::bigint AS id, story_id::text AS story_id, title::text AS title, \
         created_at::text AS created_at FROM {table}"
    ))
}

/// PostgreSQL-backed store.
pub struct PgStoryStore {
    pool: Pool,
    query: String,
}

impl PgStoryStore {
    /// Build the pool lazily; no connection is opened until the first fetch.
    pub fn new(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let query = select_all_sql(&config.table)?;

        let mut cfg = Config::new();
        cfg.url = Some(config.url.clone());
        cfg.pool = Some(PoolConfig {
            max_size: config.pool_size.max(1),
            ..Default::default()
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| StoreError::Pool(e.to_string()))?;

        Ok(Self { pool, query })
    }
}

#[async_trait::async_trait]
impl StoryStore for PgStoryStore {
    async fn fetch_all(&self) -> Result<Vec<RawStory>, StoreError> {
        // Connection goes back to the pool when `conn` drops, on error too.
        let conn = self.pool.get().await?;
        let rows = conn.query(self.query.as_str(), &[]).await?;
        debug!(target: "store", rows = rows.len(), "fetched story rows");

        rows.iter()
            .map(|row| -> Result<RawStory, StoreError> {
                Ok(RawStory {
                    id: row.try_get("id")?,
                    story_id: row.try_get("story_id")?,
                    title: row.try_get("title")?,
                    created_at: row
                        .try_get::<_, Option<String>>("created_at")?
                        .unwrap_or_default(),
                })
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

/// In-memory store for tests and local demos.
#[derive(Debug, Default, Clone)]
pub struct MemoryStoryStore {
    rows: Arc<RwLock<Vec<RawStory>>>,
}

impl MemoryStoryStore {
    pub fn new(rows: Vec<RawStory>) -> Self {
        Self {
            rows: Arc::new(RwLock::new(rows)),
        }
    }

    /// Replace the table contents.
    pub fn replace(&self, rows: Vec<RawStory>) {
        let mut g = self.rows.write().unwrap_or_else(|p| p.into_inner());
        *g = rows;
    }
}

#[async_trait::async_trait]
impl StoryStore for MemoryStoryStore {
    async fn fetch_all(&self) -> Result<Vec<RawStory>, StoreError> {
        let g = self.rows.read().unwrap_or_else(|p| p.into_inner());
        Ok(g.clone())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_sql_accepts_plain_and_qualified_names() {
        let q = select_all_sql("public.hacker_news_stories").unwrap();
        assert!(q.ends_with("FROM public.hacker_news_stories"));
        assert!(select_all_sql("stories").is_ok());
    }

    #[test]
    fn select_sql_rejects_injection() {
        for bad in ["", "a;drop table x", "a.b.c", "1stories", "stories --"] {
            assert!(
                matches!(select_all_sql(bad), Err(StoreError::InvalidTable(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn pg_store_builds_without_connecting() {
        let store = PgStoryStore::new(&DatabaseConfig::default()).unwrap();
        assert_eq!(store.name(), "postgres");
    }

    #[tokio::test]
    async fn memory_store_returns_current_rows() {
        let store = MemoryStoryStore::default();
        assert!(store.fetch_all().await.unwrap().is_empty());
        store.replace(vec![RawStory::new(1, "1", Some("x"), "2024-01-01")]);
        assert_eq!(store.fetch_all().await.unwrap().len(), 1);
    }
}
