use crate::error::{Result, TranslationError};
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

/// Shared handle to the storage engine.
///
/// Clones share one connection. The domain layer uses the same handle for its
/// own tables, which is what lets the batch loader join entity rows against
/// `translations` in a single statement.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) a database file and make sure the schema exists.
    pub fn open(database_path: &str) -> Result<Self> {
        let conn = Connection::open(database_path)?;
        debug!("Opened translation database at {}", database_path);
        Self::from_connection(conn)
    }

    /// Open a private in-memory database (used by tests and tools).
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        // Batch loads bind their key lists through rarray()
        rusqlite::vtab::array::load_module(&conn)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Set how long a statement waits on a locked database before failing.
    pub fn with_busy_timeout(self, timeout: Duration) -> Result<Self> {
        self.connection()?.busy_timeout(timeout)?;
        Ok(self)
    }

    /// Create the translation tables and seed the counter record.
    ///
    /// Safe to run on every open.
    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS translations (
                autoid INTEGER PRIMARY KEY AUTOINCREMENT,
                id INTEGER NOT NULL,
                locale TEXT NOT NULL,
                localized_string TEXT,
                created TEXT NOT NULL,
                modified TEXT NOT NULL,
                UNIQUE (id, locale)
            );
            CREATE TABLE IF NOT EXISTS translations_seq (
                id INTEGER NOT NULL
            );
            INSERT INTO translations_seq (id)
                SELECT 0 WHERE NOT EXISTS (SELECT 1 FROM translations_seq);",
        )?;
        Ok(())
    }

    /// Lock the shared connection.
    pub fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| TranslationError::ConnectionPoisoned)
    }

    /// Total number of translation rows (all locales).
    pub fn translation_count(&self) -> Result<usize> {
        let conn = self.connection()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM translations", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// The last logical id handed out by the counter.
    pub fn last_logical_id(&self) -> Result<i64> {
        let conn = self.connection()?;
        let id = conn.query_row("SELECT id FROM translations_seq", [], |row| row.get(0))?;
        Ok(id)
    }
}
