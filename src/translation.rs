//! The translation row and its content kinds.

use crate::content;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Columns of the `translations` table, in the order [`Translation::from_row`]
/// reads them.
pub const TRANSLATION_COLUMNS: [&str; 6] = [
    "autoid",
    "id",
    "locale",
    "localized_string",
    "created",
    "modified",
];

/// How a row's text is treated when rendered.
///
/// The kind lives only in memory: every kind is stored identically, and the
/// field a row is attached to decides which kind it becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationKind {
    #[default]
    Plain,
    Sanitized,
    Linked,
}

/// One stored `(logical_id, locale, text)` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    /// Storage-assigned primary key of this row
    pub row_id: i64,
    /// Identifier shared by every locale variant of one logical value
    pub logical_id: i64,
    pub locale: String,
    pub text: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    #[serde(default)]
    pub kind: TranslationKind,
}

impl Translation {
    /// A row is falsy when its text is empty or only whitespace.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// The text rendered for display according to the row's kind.
    pub fn rendered(&self) -> String {
        content::render(self.kind, &self.text)
    }

    /// Build a plain row from `TRANSLATION_COLUMNS` starting at column `offset`.
    ///
    /// Returns `Ok(None)` when the id or the text column is NULL, which is what
    /// an unmatched outer join produces.
    pub(crate) fn from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Option<Self>> {
        let row_id: Option<i64> = row.get(offset)?;
        let logical_id: Option<i64> = row.get(offset + 1)?;
        let text: Option<String> = row.get(offset + 3)?;

        let (Some(row_id), Some(logical_id), Some(text)) = (row_id, logical_id, text) else {
            return Ok(None);
        };

        Ok(Some(Translation {
            row_id,
            logical_id,
            locale: row.get(offset + 2)?,
            text,
            created: row.get(offset + 4)?,
            modified: row.get(offset + 5)?,
            kind: TranslationKind::Plain,
        }))
    }
}

impl fmt::Display for Translation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Convert a row into `target` kind, keeping every stored value identical.
pub fn promote(row: Translation, target: TranslationKind) -> Translation {
    if row.kind == target {
        return row;
    }
    Translation {
        kind: target,
        ..row
    }
}
