//! Shared fixtures for unit tests: a small entity type with two translated
//! fields and helpers for an in-memory store.

use crate::cache::MemoryCache;
use crate::db::Database;
use crate::fields::{FallbackSource, ModelMeta, Translatable, TranslatedField, TranslationSlots};
use crate::store::TranslationStore;
use std::sync::Arc;

static COLLECTION_FIELDS: [TranslatedField; 2] = [
    TranslatedField::new("name", "name").with_fallback(FallbackSource::Attribute("defaultlocale")),
    TranslatedField::new("description", "description")
        .linked()
        .with_fallback(FallbackSource::Attribute("defaultlocale")),
];

pub static COLLECTION: ModelMeta =
    ModelMeta::new("Collection", "collections", "id", &COLLECTION_FIELDS);

#[derive(Debug, Clone)]
pub struct Collection {
    pub id: i64,
    pub default_locale: String,
    pub translations: TranslationSlots,
}

impl Collection {
    pub fn new(id: i64, default_locale: &str) -> Self {
        Self {
            id,
            default_locale: default_locale.to_string(),
            translations: TranslationSlots::new(),
        }
    }

    pub fn with_name_id(mut self, logical_id: i64) -> Self {
        self.translations.set_logical_id("name", Some(logical_id));
        self
    }

    pub fn with_description_id(mut self, logical_id: i64) -> Self {
        self.translations.set_logical_id("description", Some(logical_id));
        self
    }
}

impl Translatable for Collection {
    fn meta() -> &'static ModelMeta {
        &COLLECTION
    }

    fn pk(&self) -> i64 {
        self.id
    }

    fn slots(&self) -> &TranslationSlots {
        &self.translations
    }

    fn slots_mut(&mut self) -> &mut TranslationSlots {
        &mut self.translations
    }

    fn attribute(&self, column: &str) -> Option<String> {
        match column {
            "defaultlocale" => Some(self.default_locale.clone()),
            _ => None,
        }
    }
}

/// In-memory store with a memory cache.
pub fn test_store() -> TranslationStore {
    let db = Database::open_in_memory().expect("in-memory database");
    TranslationStore::new(db, Arc::new(MemoryCache::default()))
}

/// Create the `collections` table next to `translations`.
pub fn create_collections_table(db: &Database) {
    db.connection()
        .expect("connection")
        .execute_batch(
            "CREATE TABLE IF NOT EXISTS collections (
                id INTEGER PRIMARY KEY,
                name INTEGER,
                description INTEGER,
                defaultlocale TEXT
            );",
        )
        .expect("create collections table");
}

/// Persist a collection's foreign keys and default locale.
pub fn save_collection(db: &Database, collection: &Collection) {
    db.connection()
        .expect("connection")
        .execute(
            "INSERT OR REPLACE INTO collections (id, name, description, defaultlocale)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                collection.id,
                collection.translations.logical_id("name"),
                collection.translations.logical_id("description"),
                collection.default_locale,
            ],
        )
        .expect("save collection");
}
