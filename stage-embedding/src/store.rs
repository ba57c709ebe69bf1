//! SQLite record store for performances using rusqlite
//!
//! Rows keep their embedding as the literal-list text it was exported as;
//! the store never decodes it.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection, Row};
use stage_core::{DisplayFields, ItemRow, ItemSummary};
use tracing::{debug, info, instrument};

use crate::error::{EmbeddingError, Result};

/// State value of performances currently on stage
pub const DEFAULT_RUNNING_STATE: &str = "공연중";

/// Source of catalogue rows for the recommender
pub trait RecordStore: Send + Sync {
    /// First `limit` catalogue entries, without embeddings
    fn list_items(&self, limit: usize) -> Result<Vec<ItemSummary>>;

    /// Rows for the given ids, whatever their running state
    fn fetch_by_ids(&self, ids: &[String]) -> Result<Vec<ItemRow>>;

    /// Candidate pool: every running performance, in catalogue order
    fn fetch_pool(&self) -> Result<Vec<ItemRow>>;

    /// Number of stored performances
    fn count(&self) -> Result<usize>;
}

/// SQLite-backed record store
pub struct SqliteRecordStore {
    conn: Arc<Mutex<Connection>>,
    running_state: String,
}

impl SqliteRecordStore {
    /// Open (or create) the performance database
    ///
    /// # Arguments
    /// * `database_path` - Path to SQLite database file
    #[instrument(skip(database_path))]
    pub fn new<P: AsRef<Path> + std::fmt::Debug>(database_path: P) -> Result<Self> {
        info!("Opening performance database: {:?}", database_path.as_ref());
        let conn = Connection::open(database_path.as_ref()).map_err(|e| {
            EmbeddingError::Database(format!("Failed to open database: {}", e))
        })?;

        Self::from_connection(conn)
    }

    /// Create an in-memory store (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| EmbeddingError::Database(format!("Failed to create in-memory DB: {}", e)))?;

        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            running_state: DEFAULT_RUNNING_STATE.to_string(),
        };

        store.init_tables()?;
        Ok(store)
    }

    /// Use a different state value to select the candidate pool
    pub fn with_running_state(mut self, state: impl Into<String>) -> Self {
        self.running_state = state.into();
        self
    }

    pub fn running_state(&self) -> &str {
        &self.running_state
    }

    fn init_tables(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS performances (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                genre TEXT,
                poster TEXT,
                related_url TEXT,
                state TEXT NOT NULL,
                embedding TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_performances_state
            ON performances(state, seq);
            "#,
        )
        .map_err(|e| EmbeddingError::Database(e.to_string()))?;

        debug!("Performance tables initialized");
        Ok(())
    }

    /// Insert or update a performance row
    ///
    /// An update keeps the row's original catalogue position.
    #[instrument(skip(self, row), fields(id = %row.id))]
    pub fn upsert_item(&self, row: &ItemRow, state: &str) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            "INSERT INTO performances
             (id, name, genre, poster, related_url, state, embedding)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                genre = excluded.genre,
                poster = excluded.poster,
                related_url = excluded.related_url,
                state = excluded.state,
                embedding = excluded.embedding",
            params![
                &row.id,
                &row.display.name,
                &row.display.genre,
                &row.display.poster,
                &row.display.related_url,
                state,
                &row.embedding,
            ],
        )
        .map_err(|e| EmbeddingError::Database(e.to_string()))?;

        debug!("Saved performance: {}", row.id);
        Ok(())
    }

    fn query_rows<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<ItemRow>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| EmbeddingError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params, |row| {
                Ok(ItemRow {
                    id: row.get(0)?,
                    display: display_fields(row)?,
                    embedding: row.get(5)?,
                })
            })
            .map_err(|e| EmbeddingError::Database(e.to_string()))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| EmbeddingError::Database(e.to_string()))
    }
}

fn display_fields(row: &Row<'_>) -> rusqlite::Result<DisplayFields> {
    Ok(DisplayFields {
        name: row.get(1)?,
        genre: row.get(2)?,
        poster: row.get(3)?,
        related_url: row.get(4)?,
    })
}

impl RecordStore for SqliteRecordStore {
    #[instrument(skip(self))]
    fn list_items(&self, limit: usize) -> Result<Vec<ItemSummary>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(
                "SELECT id, name, genre, poster, related_url
                 FROM performances
                 ORDER BY seq
                 LIMIT ?",
            )
            .map_err(|e| EmbeddingError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(ItemSummary {
                    id: row.get(0)?,
                    display: display_fields(row)?,
                })
            })
            .map_err(|e| EmbeddingError::Database(e.to_string()))?;

        let items = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| EmbeddingError::Database(e.to_string()))?;

        debug!("Listed {} performances", items.len());
        Ok(items)
    }

    #[instrument(skip(self, ids), fields(ids = ids.len()))]
    fn fetch_by_ids(&self, ids: &[String]) -> Result<Vec<ItemRow>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, name, genre, poster, related_url, embedding
             FROM performances
             WHERE id IN ({})
             ORDER BY seq",
            placeholders
        );

        let rows = self.query_rows(&sql, params_from_iter(ids.iter()))?;
        debug!("Fetched {} of {} selected performances", rows.len(), ids.len());
        Ok(rows)
    }

    #[instrument(skip(self))]
    fn fetch_pool(&self) -> Result<Vec<ItemRow>> {
        let rows = self.query_rows(
            "SELECT id, name, genre, poster, related_url, embedding
             FROM performances
             WHERE state = ?
             ORDER BY seq",
            params![&self.running_state],
        )?;

        info!("Loaded {} running performances", rows.len());
        Ok(rows)
    }

    fn count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM performances", [], |row| row.get(0))
            .map_err(|e| EmbeddingError::Database(e.to_string()))?;
        Ok(count as usize)
    }
}
