//! Integration tests for the translation store
//!
//! These tests drive the public API end to end: an entity type declared the
//! way a consumer would declare it, stored next to the translations table,
//! loaded one at a time and in batches.

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;

use translation_store::{
    load_batch, load_translations, read_field, resolve_fallback, write_field, Database,
    FallbackSource, FieldValue, MemoryCache, ModelMeta, NoCache, Translatable, TranslatedField,
    TranslationKind, TranslationSlots, TranslationStore,
};

// ==================== Test Entity ====================

static ADDON_FIELDS: [TranslatedField; 2] = [
    TranslatedField::new("name", "name_id"),
    TranslatedField::new("summary", "summary_id")
        .sanitized()
        .with_fallback(FallbackSource::Attribute("default_locale")),
];

static ADDON: ModelMeta = ModelMeta::new("Addon", "addons", "id", &ADDON_FIELDS);

#[derive(Debug, Clone)]
struct Addon {
    id: i64,
    default_locale: Option<String>,
    translations: TranslationSlots,
}

impl Addon {
    fn new(id: i64, default_locale: Option<&str>) -> Self {
        Self {
            id,
            default_locale: default_locale.map(str::to_string),
            translations: TranslationSlots::new(),
        }
    }
}

impl Translatable for Addon {
    fn meta() -> &'static ModelMeta {
        &ADDON
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
            "default_locale" => self.default_locale.clone(),
            _ => None,
        }
    }
}

// ==================== Test Helpers ====================

fn create_store() -> TranslationStore {
    let db = Database::open_in_memory().expect("Failed to open database");
    create_addons_table(&db);
    TranslationStore::new(db, Arc::new(MemoryCache::default()))
}

fn create_addons_table(db: &Database) {
    db.connection()
        .unwrap()
        .execute_batch(
            "CREATE TABLE IF NOT EXISTS addons (
                id INTEGER PRIMARY KEY,
                name_id INTEGER,
                summary_id INTEGER,
                default_locale TEXT
            );",
        )
        .unwrap();
}

fn save_addon(db: &Database, addon: &Addon) {
    db.connection()
        .unwrap()
        .execute(
            "INSERT OR REPLACE INTO addons (id, name_id, summary_id, default_locale)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                addon.id,
                addon.translations.logical_id("name"),
                addon.translations.logical_id("summary"),
                addon.default_locale,
            ],
        )
        .unwrap();
}

fn text_of(addon: &Addon, field: &str) -> Option<String> {
    read_field(addon, field).unwrap().map(|t| t.text.clone())
}

// ==================== Store Tests ====================

#[test]
fn test_round_trip_through_file_database() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("translations.db");
    let path = path.to_str().unwrap();

    let row = {
        let store = TranslationStore::new(Database::open(path).unwrap(), Arc::new(NoCache));
        store.create("hello", "en-US", None).unwrap()
    };

    let reopened = TranslationStore::new(Database::open(path).unwrap(), Arc::new(NoCache));
    let found = reopened.find(row.logical_id, "en-US").unwrap().unwrap();
    assert_eq!(found.text, "hello");
    assert_eq!(reopened.get(row.row_id).unwrap().unwrap(), row);

    // The counter survives reopening
    let next = reopened.create("again", "en-US", None).unwrap();
    assert!(next.logical_id > row.logical_id);
}

#[test]
fn test_duplicate_locale_row_is_rejected() {
    let store = create_store();
    let row = store.create("hello", "en-US", None).unwrap();

    let err = store.create("again", "en-US", Some(row.logical_id)).unwrap_err();
    assert_eq!(err.kind(), "duplicate_translation");
    assert_eq!(store.count_rows(row.logical_id, "en-US").unwrap(), 1);
}

#[test]
fn test_fallback_scenario() {
    let store = create_store();
    let de = store.create("Hallo", "de", None).unwrap();

    let rows = resolve_fallback(&store, &[de.logical_id], "fr", "de").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].text, "Hallo");

    assert!(resolve_fallback(&store, &[de.logical_id], "fr", "fr").unwrap().is_empty());
}

// ==================== Field Binding Tests ====================

#[test]
fn test_edit_flow_across_locales() {
    let store = create_store();
    let mut addon = Addon::new(1, Some("en-US"));

    write_field(&store, &mut addon, "name", "Ad Blocker", "en-US").unwrap();
    write_field(&store, &mut addon, "name", "Ad Blocker", "en-US").unwrap();
    let id = addon.slots().logical_id("name").unwrap();
    assert_eq!(store.count_rows(id, "en-US").unwrap(), 1);

    write_field(&store, &mut addon, "name", "Bloqueur", "fr").unwrap();
    assert_eq!(addon.slots().logical_id("name"), Some(id));
    assert_eq!(text_of(&addon, "name").as_deref(), Some("Bloqueur"));
    assert_eq!(store.find(id, "en-US").unwrap().unwrap().text, "Ad Blocker");

    write_field(&store, &mut addon, "name", FieldValue::Absent, "fr").unwrap();
    assert_eq!(addon.slots().logical_id("name"), Some(id));
    assert_eq!(text_of(&addon, "name").as_deref(), Some("Bloqueur"));
}

#[test]
fn test_locale_map_from_json() {
    let store = create_store();
    let mut addon = Addon::new(1, Some("en-US"));

    let value = FieldValue::from_json(
        "summary",
        serde_json::json!({"en-US": "<b>Fast</b> <script>x</script>", "de": "Schnell"}),
    )
    .unwrap();
    write_field(&store, &mut addon, "summary", value, "en-US").unwrap();

    let row = read_field(&addon, "summary").unwrap().unwrap();
    assert_eq!(row.kind, TranslationKind::Sanitized);
    assert_eq!(row.rendered(), "<b>Fast</b> &lt;script&gt;x&lt;/script&gt;");

    let id = addon.slots().logical_id("summary").unwrap();
    assert_eq!(store.rows_for(id).unwrap().len(), 2);
}

// ==================== Batch Tests ====================

#[test]
fn test_batch_loads_three_addons_in_one_pass() {
    let store = create_store();
    let mut saved = Vec::new();
    for pk in 1..=3 {
        let mut addon = Addon::new(pk, Some("en-US"));
        write_field(&store, &mut addon, "name", format!("addon {}", pk), "en-US").unwrap();
        write_field(&store, &mut addon, "summary", format!("summary {}", pk), "en-US").unwrap();
        save_addon(store.database(), &addon);
        saved.push(addon);
    }

    let mut fresh: Vec<Addon> = (1..=3).map(|pk| Addon::new(pk, None)).collect();
    let report = load_batch(store.database(), &mut fresh, "en-US", "en-US").unwrap();

    assert_eq!(report.rows, 3);
    assert_eq!(report.attached, 6);
    for (loaded, original) in fresh.iter().zip(&saved) {
        assert_eq!(text_of(loaded, "name"), text_of(original, "name"));
        assert_eq!(text_of(loaded, "summary"), text_of(original, "summary"));
        assert_eq!(
            read_field(loaded, "summary").unwrap().unwrap().kind,
            TranslationKind::Sanitized
        );
    }
}

// ==================== Property Tests ====================

/// Locales the generated data draws from.
const LOCALES: [&str; 3] = ["en-US", "de", "fr"];

/// For one field: which locales get a row, and whether that row's text is empty.
fn field_rows() -> impl Strategy<Value = Vec<(usize, bool)>> {
    prop::collection::vec((0..LOCALES.len(), any::<bool>()), 0..=3)
}

fn addon_shape() -> impl Strategy<Value = (Option<usize>, Vec<(usize, bool)>, Vec<(usize, bool)>)> {
    (prop::option::of(0..LOCALES.len()), field_rows(), field_rows())
}

fn build_addon(
    store: &TranslationStore,
    pk: i64,
    shape: &(Option<usize>, Vec<(usize, bool)>, Vec<(usize, bool)>),
) -> Addon {
    let (default_locale, names, summaries) = shape;
    let mut addon = Addon::new(pk, default_locale.map(|i| LOCALES[i]));

    for (field, rows) in [("name", names), ("summary", summaries)] {
        let mut id = None;
        let mut seen = HashSet::new();
        for &(locale, empty) in rows {
            if !seen.insert(locale) {
                continue;
            }
            let text = if empty { String::new() } else { format!("{}-{}-{}", field, pk, LOCALES[locale]) };
            let row = store.create(&text, LOCALES[locale], id).unwrap();
            id = Some(row.logical_id);
        }
        addon.translations.set_logical_id(field, id);
    }

    save_addon(store.database(), &addon);
    addon
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_batch_matches_single_entity_load(
        shapes in prop::collection::vec(addon_shape(), 1..5),
        active in 0..LOCALES.len(),
        site in 0..LOCALES.len(),
    ) {
        let store = create_store();
        let locale = LOCALES[active];
        let site_locale = LOCALES[site];

        let mut singles: Vec<Addon> = shapes
            .iter()
            .enumerate()
            .map(|(i, shape)| build_addon(&store, i as i64 + 1, shape))
            .collect();
        let mut batched = singles.clone();

        let report = load_batch(store.database(), &mut batched, locale, site_locale).unwrap();
        prop_assert_eq!(report.rows, singles.len());

        for (single, batch) in singles.iter_mut().zip(&batched) {
            load_translations(&store, single, locale, site_locale).unwrap();
            for field in ["name", "summary"] {
                prop_assert_eq!(read_field(single, field).unwrap(), read_field(batch, field).unwrap());
            }
        }
    }

    #[test]
    fn prop_allocated_ids_are_unique_and_increasing(count in 1usize..40) {
        let store = create_store();
        let mut last = 0;
        for i in 0..count {
            let row = store.create(&format!("text {}", i), "en-US", None).unwrap();
            prop_assert!(row.logical_id > last);
            last = row.logical_id;
        }
        prop_assert_eq!(store.database().last_logical_id().unwrap(), last);
    }
}
