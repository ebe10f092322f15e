//! Reading and writing translated attributes on an entity.
//!
//! Reads only look at the row attached to the entity's slot; they never hit
//! the store. Queries happen at load time (see [`crate::fallback`] and
//! [`crate::batch`]) so a request resolves each field's locale exactly once.
//!
//! Writes turn a string (or a locale → string mapping) into store operations
//! under the request's active locale:
//!
//! | slot state                              | action                        |
//! |-----------------------------------------|-------------------------------|
//! | no logical id, nothing attached         | create a new logical value    |
//! | logical id, nothing attached            | add a row for the locale      |
//! | attached row in the active locale       | update that row in place      |
//! | attached row in another locale          | add a row for the locale      |
//!
//! "Add" reuses a stored row for the locale when one exists but was not the
//! attached one; otherwise it creates a row under the existing logical id.
//!
//! Absent or empty values are ignored. They never clear the foreign key,
//! because that would drop every other locale of the value as well.

use crate::error::{Result, TranslationError};
use crate::fields::{Translatable, TranslatedField};
use crate::locale::same_locale;
use crate::store::TranslationStore;
use crate::translation::{promote, Translation};
use serde_json::Value;
use tracing::debug;

/// A value assigned to a translated field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Absent,
    Text(String),
    /// Locale → text pairs, applied in order
    Localized(Vec<(String, String)>),
}

impl FieldValue {
    /// Interpret a JSON value (e.g. submitted form data) as a field value.
    ///
    /// Strings and objects of strings are accepted and `null` is absent;
    /// anything else is a type error.
    pub fn from_json(field: &str, value: Value) -> Result<Self> {
        let invalid = |found: &'static str| TranslationError::InvalidValue {
            field: field.to_string(),
            found,
        };

        match value {
            Value::Null => Ok(FieldValue::Absent),
            Value::String(text) => Ok(FieldValue::Text(text)),
            Value::Object(map) => map
                .into_iter()
                .map(|(locale, text)| match text {
                    Value::String(text) => Ok((locale, text)),
                    _ => Err(invalid("a mapping with non-string values")),
                })
                .collect::<Result<Vec<_>>>()
                .map(FieldValue::Localized),
            Value::Bool(_) => Err(invalid("a boolean")),
            Value::Number(_) => Err(invalid("a number")),
            Value::Array(_) => Err(invalid("an array")),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            FieldValue::Absent => true,
            FieldValue::Text(text) => text.is_empty(),
            FieldValue::Localized(pairs) => pairs.is_empty(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> Self {
        FieldValue::Text(text.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(text: String) -> Self {
        FieldValue::Text(text)
    }
}

impl From<Option<String>> for FieldValue {
    fn from(text: Option<String>) -> Self {
        text.map_or(FieldValue::Absent, FieldValue::Text)
    }
}

impl<L: Into<String>, T: Into<String>> From<Vec<(L, T)>> for FieldValue {
    fn from(pairs: Vec<(L, T)>) -> Self {
        FieldValue::Localized(
            pairs
                .into_iter()
                .map(|(locale, text)| (locale.into(), text.into()))
                .collect(),
        )
    }
}

/// The row currently attached to `field`, if any. Never queries.
pub fn read_field<'a, E: Translatable>(entity: &'a E, field: &str) -> Result<Option<&'a Translation>> {
    let field = E::meta().require_field(field)?;
    Ok(entity.slots().attached(field.name))
}

/// Assign `value` to `field` under the request's active `locale`.
///
/// For a locale mapping, the row written for `locale` is the one left
/// attached. When the mapping has no usable entry for `locale` (missing, or
/// empty text) every other entry is still stored and a row already attached
/// in `locale` stays attached; otherwise the field is left unattached and
/// reads as empty until the next load.
pub fn write_field<E: Translatable>(
    store: &TranslationStore,
    entity: &mut E,
    field: &str,
    value: impl Into<FieldValue>,
    locale: &str,
) -> Result<()> {
    let field = E::meta().require_field(field)?;
    let value = value.into();
    if value.is_empty() {
        debug!("Ignoring empty assignment to {}.{}", E::meta().name, field.name);
        return Ok(());
    }

    match value {
        FieldValue::Absent => {}
        FieldValue::Text(text) => {
            write_text(store, entity, field, &text, locale)?;
        }
        FieldValue::Localized(pairs) => {
            let previous = entity.slots().attached(field.name).cloned();
            let mut active = None;
            for (pair_locale, text) in pairs {
                if text.is_empty() {
                    continue;
                }
                let row = write_text(store, entity, field, &text, &pair_locale)?;
                if same_locale(&pair_locale, locale) {
                    active = Some(row);
                }
            }

            let active = active.or_else(|| previous.filter(|row| same_locale(&row.locale, locale)));
            let slots = entity.slots_mut();
            match active {
                Some(row) => slots.attach(field.name, row),
                None => {
                    slots.detach(field.name);
                }
            }
        }
    }
    Ok(())
}

/// Apply one string under one locale and attach the resulting row.
fn write_text<E: Translatable>(
    store: &TranslationStore,
    entity: &mut E,
    field: &'static TranslatedField,
    text: &str,
    locale: &str,
) -> Result<Translation> {
    let slot = entity.slots().get(field.name).cloned().unwrap_or_default();

    let row = match (slot.attached, slot.logical_id) {
        (Some(mut row), _) if same_locale(&row.locale, locale) => {
            store.update(&mut row, text)?;
            row
        }
        (Some(row), id) => add_locale(store, id.unwrap_or(row.logical_id), text, locale)?,
        (None, Some(id)) => add_locale(store, id, text, locale)?,
        (None, None) => store.create(text, locale, None)?,
    };
    let row = promote(row, field.policy.kind());

    let slots = entity.slots_mut();
    slots.set_logical_id(field.name, Some(row.logical_id));
    slots.attach(field.name, row.clone());
    Ok(row)
}

/// Store `text` as the `locale` variant of an existing logical value.
///
/// A row that already exists for the locale but is not the attached one (an
/// empty row the loader passed over for the fallback, or a locale written
/// earlier in the same mapping) is updated instead of duplicated. The lookup
/// normalizes locale codes the same way the in-place update branch does.
fn add_locale(
    store: &TranslationStore,
    logical_id: i64,
    text: &str,
    locale: &str,
) -> Result<Translation> {
    match store.find_variant(logical_id, locale)? {
        Some(mut row) => {
            store.update(&mut row, text)?;
            Ok(row)
        }
        None => store.create(text, locale, Some(logical_id)),
    }
}
