//! Locale fallback for a handful of known logical ids.
//!
//! Used when loading a single entity. For many entities of one type at once,
//! [`crate::batch::load_batch`] does the same resolution in one statement.

use crate::error::Result;
use crate::fields::{Translatable, TranslatedField};
use crate::store::TranslationStore;
use crate::translation::{promote, Translation};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Fetch rows for `ids` in `locale`, falling back to `default_locale`.
///
/// Rows in `locale` count only when their text is non-empty. Ids still
/// missing are looked up in `default_locale` (when it differs from
/// `locale`), where an empty text is accepted as the authoritative value.
/// Ids found in neither locale are simply absent from the result.
pub fn resolve_fallback(
    store: &TranslationStore,
    ids: &[i64],
    locale: &str,
    default_locale: &str,
) -> Result<Vec<Translation>> {
    let ids: Vec<i64> = ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut rows = store.find_many(&ids, locale, true)?;

    let found: BTreeSet<i64> = rows.iter().map(|r| r.logical_id).collect();
    let missing: Vec<i64> = ids.into_iter().filter(|id| !found.contains(id)).collect();

    if !missing.is_empty() && default_locale != locale {
        debug!(
            "{} translation(s) missing in {}, falling back to {}",
            missing.len(),
            locale,
            default_locale
        );
        rows.extend(store.find_many(&missing, default_locale, false)?);
    }

    Ok(rows)
}

/// Attach loaded rows to the fields they belong to.
///
/// Each row is matched to a field through the entity's foreign keys and
/// promoted to that field's content kind. Returns the number of rows attached;
/// rows for ids the entity does not reference are ignored.
pub fn attach_translations<E: Translatable>(entity: &mut E, rows: Vec<Translation>) -> usize {
    let mut owners: HashMap<i64, &'static TranslatedField> = E::meta()
        .fields
        .iter()
        .filter_map(|field| entity.slots().logical_id(field.name).map(|id| (id, field)))
        .collect();

    let mut attached = 0;
    for row in rows {
        match owners.remove(&row.logical_id) {
            Some(field) => {
                let row = promote(row, field.policy.kind());
                entity.slots_mut().attach(field.name, row);
                attached += 1;
            }
            None => debug!(
                "Ignoring translation {} not referenced by {} {}",
                row.logical_id,
                E::meta().name,
                entity.pk()
            ),
        }
    }
    attached
}

/// Resolve and attach every translated field of one entity.
///
/// Fields sharing a fallback locale are resolved together. Returns the number
/// of fields that ended up with an attached row.
pub fn load_translations<E: Translatable>(
    store: &TranslationStore,
    entity: &mut E,
    locale: &str,
    site_locale: &str,
) -> Result<usize> {
    let mut by_fallback: BTreeMap<String, Vec<i64>> = BTreeMap::new();
    for field in E::meta().fields {
        if let Some(id) = entity.slots().logical_id(field.name) {
            by_fallback
                .entry(entity.fallback_locale(field, site_locale))
                .or_default()
                .push(id);
        }
    }

    let mut attached = 0;
    for (fallback, ids) in by_fallback {
        let rows = resolve_fallback(store, &ids, locale, &fallback)?;
        attached += attach_translations(entity, rows);
    }
    Ok(attached)
}
