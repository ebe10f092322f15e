//! Locale-keyed translation storage.
//!
//! Translated attributes of domain entities point at a *logical id*; each
//! locale's text for that id is one row in the `translations` table. This
//! crate allocates logical ids, stores and caches rows, resolves the best row
//! for a locale with fallback, loads many entities in one statement, and
//! binds entity attributes to rows on read and write.

pub mod batch;
pub mod binding;
pub mod cache;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod fallback;
pub mod fields;
pub mod locale;
pub mod metrics;
pub mod query;
pub mod sequence;
pub mod store;
pub mod translation;

#[cfg(test)]
pub(crate) mod test_support;

pub use batch::{load_batch, BatchReport};
pub use binding::{read_field, write_field, FieldValue};
pub use cache::{Cache, MemoryCache, NoCache};
pub use db::Database;
pub use error::{Result, TranslationError};
pub use fallback::{attach_translations, load_translations, resolve_fallback};
pub use fields::{
    ContentPolicy, FallbackSource, ModelMeta, Translatable, TranslatedField, TranslationSlots,
};
pub use sequence::SequenceAllocator;
pub use store::TranslationStore;
pub use translation::{Translation, TranslationKind};
