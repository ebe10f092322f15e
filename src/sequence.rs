//! Allocation of logical translation ids.

use crate::db::Database;
use crate::error::{Result, TranslationError};
use tracing::info;

/// Issues logical ids from the `translations_seq` counter record.
///
/// Each allocation is one increment-and-read statement. The engine's write
/// lock on the counter row serializes concurrent callers, so no application
/// lock is taken.
#[derive(Clone)]
pub struct SequenceAllocator {
    db: Database,
}

impl SequenceAllocator {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Return a logical id that has never been returned before.
    ///
    /// Failures are not retried: a lost connection must surface to the caller.
    pub fn allocate(&self) -> Result<i64> {
        let conn = self.db.connection()?;
        let id: i64 = conn
            .query_row(
                "UPDATE translations_seq SET id = id + 1 RETURNING id",
                [],
                |row| row.get(0),
            )
            .map_err(TranslationError::Sequence)?;
        info!("Allocated logical translation id {}", id);
        Ok(id)
    }
}
