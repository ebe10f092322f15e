//! Translated-field metadata and the entity contract.
//!
//! Each entity type declares its translated attributes once, as a `static`
//! [`ModelMeta`]. Nothing is discovered at runtime: the table is the single
//! source of truth for which attributes are translated, which column holds
//! their logical id, how their text is treated, and where their fallback
//! locale comes from.
//!
//! # Example
//!
//! ```rust
//! use translation_store::fields::{FallbackSource, ModelMeta, TranslatedField};
//!
//! static COLLECTION_FIELDS: [TranslatedField; 2] = [
//!     TranslatedField::new("name", "name")
//!         .with_fallback(FallbackSource::Attribute("defaultlocale")),
//!     TranslatedField::new("description", "description")
//!         .linked()
//!         .with_fallback(FallbackSource::Attribute("defaultlocale")),
//! ];
//!
//! static COLLECTION: ModelMeta = ModelMeta::new("Collection", "collections", "id", &COLLECTION_FIELDS);
//!
//! assert_eq!(COLLECTION.field("description").unwrap().column, "description");
//! ```

use crate::error::{Result, TranslationError};
use crate::translation::{Translation, TranslationKind};
use std::collections::HashMap;

/// How a field's text is treated; decides the kind of attached rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentPolicy {
    Plain,
    Sanitized,
    Linked,
}

impl ContentPolicy {
    pub fn kind(self) -> TranslationKind {
        match self {
            ContentPolicy::Plain => TranslationKind::Plain,
            ContentPolicy::Sanitized => TranslationKind::Sanitized,
            ContentPolicy::Linked => TranslationKind::Linked,
        }
    }
}

/// Where a field's fallback locale comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackSource {
    /// The configured site locale
    SiteDefault,
    /// A fixed locale code
    Locale(&'static str),
    /// A sibling column on the entity (e.g. `defaultlocale`); the site locale
    /// is used when the entity has no value for it
    Attribute(&'static str),
}

/// One translated attribute of an entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslatedField {
    /// Attribute name used by callers
    pub name: &'static str,
    /// Entity column holding the logical id
    pub column: &'static str,
    pub policy: ContentPolicy,
    pub fallback: FallbackSource,
}

impl TranslatedField {
    pub const fn new(name: &'static str, column: &'static str) -> Self {
        Self {
            name,
            column,
            policy: ContentPolicy::Plain,
            fallback: FallbackSource::SiteDefault,
        }
    }

    pub const fn sanitized(self) -> Self {
        Self {
            policy: ContentPolicy::Sanitized,
            ..self
        }
    }

    pub const fn linked(self) -> Self {
        Self {
            policy: ContentPolicy::Linked,
            ..self
        }
    }

    pub const fn with_fallback(self, fallback: FallbackSource) -> Self {
        Self { fallback, ..self }
    }
}

/// Static description of one entity type's translated fields.
#[derive(Debug)]
pub struct ModelMeta {
    pub name: &'static str,
    pub table: &'static str,
    pub pk_column: &'static str,
    /// Translated fields, in projection order
    pub fields: &'static [TranslatedField],
}

impl ModelMeta {
    pub const fn new(
        name: &'static str,
        table: &'static str,
        pk_column: &'static str,
        fields: &'static [TranslatedField],
    ) -> Self {
        Self {
            name,
            table,
            pk_column,
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&'static TranslatedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Like [`ModelMeta::field`], but an unknown name is an error.
    pub fn require_field(&self, name: &str) -> Result<&'static TranslatedField> {
        self.field(name).ok_or_else(|| TranslationError::UnknownField {
            model: self.name,
            field: name.to_string(),
        })
    }
}

/// Per-field state on one entity instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Slot {
    /// Foreign key into the translations table
    pub logical_id: Option<i64>,
    /// Row attached by a load step or a write; reads never query
    pub attached: Option<Translation>,
}

/// The translation slots an entity carries, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationSlots {
    slots: HashMap<&'static str, Slot>,
}

impl TranslationSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder for entities loaded with known foreign keys.
    pub fn with_id(mut self, field: &'static str, logical_id: Option<i64>) -> Self {
        self.set_logical_id(field, logical_id);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Slot> {
        self.slots.get(field)
    }

    pub fn logical_id(&self, field: &str) -> Option<i64> {
        self.slots.get(field).and_then(|s| s.logical_id)
    }

    pub fn set_logical_id(&mut self, field: &'static str, logical_id: Option<i64>) {
        self.slots.entry(field).or_default().logical_id = logical_id;
    }

    pub fn attached(&self, field: &str) -> Option<&Translation> {
        self.slots.get(field).and_then(|s| s.attached.as_ref())
    }

    pub fn attach(&mut self, field: &'static str, row: Translation) {
        self.slots.entry(field).or_default().attached = Some(row);
    }

    /// Drop the attached row, keeping the foreign key.
    pub fn detach(&mut self, field: &str) -> Option<Translation> {
        self.slots.get_mut(field).and_then(|s| s.attached.take())
    }
}

/// An entity with translated attributes.
pub trait Translatable {
    /// The entity type's static field table.
    fn meta() -> &'static ModelMeta;

    /// Primary key value.
    fn pk(&self) -> i64;

    fn slots(&self) -> &TranslationSlots;

    fn slots_mut(&mut self) -> &mut TranslationSlots;

    /// Value of a non-translated sibling column, used by
    /// [`FallbackSource::Attribute`].
    fn attribute(&self, _column: &str) -> Option<String> {
        None
    }

    /// The fallback locale for `field` on this instance.
    fn fallback_locale(&self, field: &TranslatedField, site_locale: &str) -> String {
        match field.fallback {
            FallbackSource::SiteDefault => site_locale.to_string(),
            FallbackSource::Locale(code) => code.to_string(),
            FallbackSource::Attribute(column) => self
                .attribute(column)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| site_locale.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Collection, COLLECTION};

    #[test]
    fn test_field_lookup() {
        let field = COLLECTION.field("description").unwrap();
        assert_eq!(field.column, "description");
        assert_eq!(field.policy, ContentPolicy::Linked);
        assert!(COLLECTION.field("nickname").is_none());
    }

    #[test]
    fn test_require_field_unknown() {
        let err = COLLECTION.require_field("nickname").unwrap_err();
        assert_eq!(err.kind(), "unknown_field");
    }

    #[test]
    fn test_field_builders() {
        let field = TranslatedField::new("summary", "summary_id")
            .sanitized()
            .with_fallback(FallbackSource::Locale("de"));
        assert_eq!(field.name, "summary");
        assert_eq!(field.column, "summary_id");
        assert_eq!(field.policy.kind(), TranslationKind::Sanitized);
        assert_eq!(field.fallback, FallbackSource::Locale("de"));
    }

    #[test]
    fn test_slots_keep_id_when_detached() {
        let mut slots = TranslationSlots::new().with_id("name", Some(4));
        assert_eq!(slots.logical_id("name"), Some(4));
        assert!(slots.attached("name").is_none());
        assert!(slots.detach("name").is_none());
        assert_eq!(slots.logical_id("name"), Some(4));
    }

    #[test]
    fn test_fallback_locale_sources() {
        let collection = Collection::new(1, "de");
        let site = "en-US";

        let static_field = TranslatedField::new("x", "x").with_fallback(FallbackSource::Locale("fr"));
        assert_eq!(collection.fallback_locale(&static_field, site), "fr");

        let site_field = TranslatedField::new("x", "x");
        assert_eq!(collection.fallback_locale(&site_field, site), "en-US");

        let attr_field = COLLECTION.field("name").unwrap();
        assert_eq!(collection.fallback_locale(attr_field, site), "de");
    }

    #[test]
    fn test_attribute_fallback_without_value_uses_site_locale() {
        let collection = Collection::new(1, "");
        let field = COLLECTION.field("name").unwrap();
        assert_eq!(collection.fallback_locale(field, "en-US"), "en-US");
    }
}
