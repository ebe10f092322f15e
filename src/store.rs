//! Create/read/update of translation rows, with cache-aside reads.

use crate::cache::{Cache, MemoryCache, NoCache};
use crate::config::Config;
use crate::db::Database;
use crate::error::{is_unique_violation, Result, TranslationError};
use crate::locale::to_language;
use crate::metrics::StoreMetrics;
use crate::sequence::SequenceAllocator;
use crate::translation::{Translation, TranslationKind};
use chrono::{SubsecRound, Utc};
use rusqlite::{params, params_from_iter, OptionalExtension};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const SELECT_ROWS: &str =
    "SELECT autoid, id, locale, localized_string, created, modified FROM translations";

#[derive(Clone)]
pub struct TranslationStore {
    db: Database,
    sequence: SequenceAllocator,
    cache: Arc<dyn Cache>,
    cache_prefix: String,
    metrics: Arc<StoreMetrics>,
}

impl TranslationStore {
    pub fn new(db: Database, cache: Arc<dyn Cache>) -> Self {
        Self {
            sequence: SequenceAllocator::new(db.clone()),
            db,
            cache,
            cache_prefix: "translations".to_string(),
            metrics: Arc::new(StoreMetrics::default()),
        }
    }

    /// Open the configured database and cache.
    pub fn from_config(config: &Config) -> Result<Self> {
        let db = Database::open(&config.database_path)?
            .with_busy_timeout(Duration::from_millis(config.db_busy_timeout_ms))?;

        let cache: Arc<dyn Cache> = if config.cache_enabled {
            Arc::new(MemoryCache::new(Duration::from_secs(config.cache_ttl_secs)))
        } else {
            Arc::new(NoCache)
        };

        Ok(Self::new(db, cache).with_cache_prefix(&config.cache_prefix))
    }

    pub fn with_cache_prefix(mut self, prefix: &str) -> Self {
        self.cache_prefix = prefix.to_string();
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn metrics(&self) -> &StoreMetrics {
        &self.metrics
    }

    fn cache_key(&self, row_id: i64) -> String {
        format!("{}:row:{}", self.cache_prefix, row_id)
    }

    fn cache_put(&self, row: &Translation) -> Result<()> {
        let payload = serde_json::to_string(row)?;
        self.cache.set(&self.cache_key(row.row_id), payload);
        Ok(())
    }

    /// Insert a new row.
    ///
    /// Without `logical_id` a fresh id is allocated, starting a new logical
    /// translation. With one, the row joins that group as another locale.
    /// A row that already exists for `(logical_id, locale)` is a caller error
    /// and fails with [`TranslationError::DuplicateTranslation`].
    pub fn create(&self, text: &str, locale: &str, logical_id: Option<i64>) -> Result<Translation> {
        let logical_id = match logical_id {
            Some(id) => id,
            None => {
                let id = self.sequence.allocate()?;
                self.metrics.record_id_allocated();
                id
            }
        };

        let now = Utc::now().trunc_subsecs(6);
        let row_id = {
            let conn = self.db.connection()?;
            conn.execute(
                "INSERT INTO translations (id, locale, localized_string, created, modified)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![logical_id, locale, text, now],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    TranslationError::DuplicateTranslation {
                        logical_id,
                        locale: locale.to_string(),
                        source: e,
                    }
                } else {
                    TranslationError::Database(e)
                }
            })?;
            conn.last_insert_rowid()
        };

        let row = Translation {
            row_id,
            logical_id,
            locale: locale.to_string(),
            text: text.to_string(),
            created: now,
            modified: now,
            kind: TranslationKind::Plain,
        };
        debug!(
            "Created translation row {} ({} / {})",
            row.row_id, row.logical_id, row.locale
        );

        self.metrics.record_row_created();
        self.cache_put(&row)?;
        Ok(row)
    }

    /// Fetch a row by its row id, consulting the cache first.
    pub fn get(&self, row_id: i64) -> Result<Option<Translation>> {
        let key = self.cache_key(row_id);
        if let Some(payload) = self.cache.get(&key) {
            match serde_json::from_str::<Translation>(&payload) {
                Ok(row) => {
                    self.metrics.record_cache_hit();
                    debug!("Cache hit for {}", key);
                    return Ok(Some(row));
                }
                Err(e) => {
                    warn!("Discarding undecodable cache entry {}: {}", key, e);
                    self.cache.invalidate(&key);
                }
            }
        }

        self.metrics.record_cache_miss();
        debug!("Cache miss for {}", key);

        let row = {
            let conn = self.db.connection()?;
            conn.query_row(
                &format!("{} WHERE autoid = ?1", SELECT_ROWS),
                params![row_id],
                |r| Translation::from_row(r, 0),
            )
            .optional()?
            .flatten()
        };

        if let Some(row) = &row {
            self.cache_put(row)?;
        }
        Ok(row)
    }

    /// Replace the text of an existing row and invalidate its cache entry.
    ///
    /// Callers only pass the row attached for the active locale.
    pub fn update(&self, row: &mut Translation, text: &str) -> Result<()> {
        let now = Utc::now().trunc_subsecs(6);
        let changed = {
            let conn = self.db.connection()?;
            conn.execute(
                "UPDATE translations SET localized_string = ?1, modified = ?2 WHERE autoid = ?3",
                params![text, now, row.row_id],
            )?
        };
        self.cache.invalidate(&self.cache_key(row.row_id));

        if changed == 0 {
            return Err(TranslationError::Database(
                rusqlite::Error::QueryReturnedNoRows,
            ));
        }

        row.text = text.to_string();
        row.modified = now;
        self.metrics.record_row_updated();
        debug!("Updated translation row {} ({})", row.row_id, row.locale);
        Ok(())
    }

    /// Fetch the row for one `(logical_id, locale)` pair.
    pub fn find(&self, logical_id: i64, locale: &str) -> Result<Option<Translation>> {
        let conn = self.db.connection()?;
        let row = conn
            .query_row(
                &format!("{} WHERE id = ?1 AND locale = ?2", SELECT_ROWS),
                params![logical_id, locale],
                |r| Translation::from_row(r, 0),
            )
            .optional()?
            .flatten();
        Ok(row)
    }

    /// Like [`find`](Self::find), but matches stored locales after
    /// normalization, so `en_us` finds an `en-US` row. An exact match wins
    /// when several spellings are stored.
    pub fn find_variant(&self, logical_id: i64, locale: &str) -> Result<Option<Translation>> {
        let conn = self.db.connection()?;
        let row = conn
            .query_row(
                &format!(
                    "{} WHERE id = ?1 AND lower(replace(trim(locale), '_', '-')) = ?2 \
                     ORDER BY locale = ?3 DESC, autoid LIMIT 1",
                    SELECT_ROWS
                ),
                params![logical_id, to_language(locale), locale],
                |r| Translation::from_row(r, 0),
            )
            .optional()?
            .flatten();
        Ok(row)
    }

    /// Fetch every row of the given logical ids in one locale.
    ///
    /// With `require_text`, rows whose text is NULL or empty are skipped.
    /// Fetched rows are written to the cache.
    pub fn find_many(&self, ids: &[i64], locale: &str, require_text: bool) -> Result<Vec<Translation>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let mut sql = format!(
            "{} WHERE id IN ({}) AND locale = ?",
            SELECT_ROWS, placeholders
        );
        if require_text {
            sql.push_str(" AND localized_string IS NOT NULL AND localized_string <> ''");
        }

        let mut values: Vec<rusqlite::types::Value> = ids.iter().map(|&id| id.into()).collect();
        values.push(locale.to_string().into());

        let rows = {
            let conn = self.db.connection()?;
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(values.iter()), |r| Translation::from_row(r, 0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter().flatten().collect::<Vec<_>>()
        };

        for row in &rows {
            self.cache_put(row)?;
        }
        Ok(rows)
    }

    /// Every row of one logical translation, ordered by locale.
    pub fn rows_for(&self, logical_id: i64) -> Result<Vec<Translation>> {
        let conn = self.db.connection()?;
        let mut stmt = conn.prepare(&format!("{} WHERE id = ?1 ORDER BY locale", SELECT_ROWS))?;
        let rows = stmt
            .query_map(params![logical_id], |r| Translation::from_row(r, 0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows.into_iter().flatten().collect())
    }

    /// Number of rows stored for `(logical_id, locale)`; 0 or 1.
    pub fn count_rows(&self, logical_id: i64, locale: &str) -> Result<usize> {
        let conn = self.db.connection()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM translations WHERE id = ?1 AND locale = ?2",
            params![logical_id, locale],
            |r| r.get(0),
        )?;
        Ok(count as usize)
    }
}
