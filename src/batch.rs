//! Batch loading of translated fields for many entities at once.
//!
//! One SELECT over the entity table joins every translated field twice:
//!
//! * `t1_<column>` holds the row in the requested locale.
//! * `t2_<column>` holds the row in the field's fallback locale, but only
//!   when that locale differs from the requested one.
//!
//! Each translation column is projected as
//! `CASE WHEN t1 text is non-empty THEN t1.<col> ELSE t2.<col> END`, so every
//! field resolves exactly as [`crate::fallback::resolve_fallback`] would. For
//! N entities with F translated fields the statement returns N rows whatever F
//! is. The primary keys travel as one `rarray()` parameter, so any number of
//! entities is loaded by a single statement.

use crate::db::Database;
use crate::error::Result;
use crate::fields::{FallbackSource, ModelMeta, Translatable};
use crate::query::{Condition, Expr, Join, Params, Select};
use crate::translation::{promote, Translation, TRANSLATION_COLUMNS};
use rusqlite::params_from_iter;
use rusqlite::types::{ToSqlOutput, Value};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// A rendered statement and its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<ToSqlOutput<'static>>,
}

/// Outcome of a batch load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Result rows returned by the database, one per matched entity
    pub rows: usize,
    /// Fields that received an attached translation
    pub attached: usize,
}

fn requested_alias(column: &str) -> String {
    format!("t1_{}", column)
}

fn fallback_alias(column: &str) -> String {
    format!("t2_{}", column)
}

fn projected_alias(translation_column: &str, field_column: &str) -> String {
    format!("{}_{}", translation_column, field_column)
}

/// Build the batch statement for `pks` of one entity type.
///
/// The primary key is the first projected column, followed by the six
/// translation columns of every field in declaration order. Identifiers in
/// `meta` that are not plain `[A-Za-z0-9_]` names are rejected.
pub fn compile(meta: &ModelMeta, pks: &[i64], locale: &str, site_locale: &str) -> Result<CompiledQuery> {
    let table = meta.table;
    let mut params = Params::new();
    let requested = params.bind(locale.to_string());
    let mut site: Option<Expr> = None;

    let mut select = Select::from(table).column(Expr::column(table, meta.pk_column), None);

    for field in meta.fields {
        let t1 = requested_alias(field.column);
        let t2 = fallback_alias(field.column);

        let fallback = match field.fallback {
            FallbackSource::SiteDefault => site
                .get_or_insert_with(|| params.bind(site_locale.to_string()))
                .clone(),
            FallbackSource::Locale(code) => params.bind(code.to_string()),
            FallbackSource::Attribute(column) => {
                let site = site
                    .get_or_insert_with(|| params.bind(site_locale.to_string()))
                    .clone();
                Expr::Coalesce(vec![
                    Expr::null_if(Expr::column(table, column), Expr::Literal("")),
                    site,
                ])
            }
        };

        select = select
            .join(Join::left(
                "translations",
                t1.clone(),
                Condition::and(vec![
                    Condition::eq(Expr::column(&t1, "id"), Expr::column(table, field.column)),
                    Condition::eq(Expr::column(&t1, "locale"), requested.clone()),
                ]),
            ))
            .join(Join::left(
                "translations",
                t2.clone(),
                Condition::and(vec![
                    Condition::eq(Expr::column(&t2, "id"), Expr::column(table, field.column)),
                    Condition::eq(Expr::column(&t2, "locale"), fallback),
                    Condition::not_eq(Expr::column(&t2, "locale"), requested.clone()),
                ]),
            ));

        let requested_has_text = Condition::and(vec![
            Condition::IsNotNull(Expr::column(&t1, "localized_string")),
            Condition::not_eq(Expr::column(&t1, "localized_string"), Expr::Literal("")),
        ]);

        for col in TRANSLATION_COLUMNS {
            select = select.column(
                Expr::case(
                    requested_has_text.clone(),
                    Expr::column(&t1, col),
                    Expr::column(&t2, col),
                ),
                Some(projected_alias(col, field.column)),
            );
        }
    }

    let keys = params.bind_array(pks.iter().map(|&pk| Value::Integer(pk)).collect());
    select = select.filter(Condition::InArray(Expr::column(table, meta.pk_column), keys));

    Ok(CompiledQuery {
        sql: select.to_sql()?,
        params: params.into_values(),
    })
}

/// Load and attach the translated fields of `entities` in the active locale.
///
/// Entities whose primary key has no row in the entity table are left as
/// they are. A field is attached only when its projected id and text are
/// both non-NULL; the attached row is promoted to the field's content kind.
pub fn load_batch<E: Translatable>(
    db: &Database,
    entities: &mut [E],
    locale: &str,
    site_locale: &str,
) -> Result<BatchReport> {
    let meta = E::meta();
    let mut positions: HashMap<i64, Vec<usize>> = HashMap::new();
    for (index, entity) in entities.iter().enumerate() {
        positions.entry(entity.pk()).or_default().push(index);
    }

    let pks: Vec<i64> = positions.keys().copied().collect::<BTreeSet<_>>().into_iter().collect();
    let mut report = BatchReport::default();
    if pks.is_empty() {
        return Ok(report);
    }

    let query = compile(meta, &pks, locale, site_locale)?;
    let results = fetch(db, meta, &query)?;
    report.rows = results.len();

    for (pk, fields) in results {
        let Some(indexes) = positions.get(&pk) else {
            continue;
        };
        for (field, row) in meta.fields.iter().zip(fields) {
            let Some(row) = row else {
                continue;
            };
            let row = promote(row, field.policy.kind());
            for &index in indexes {
                let slots = entities[index].slots_mut();
                slots.set_logical_id(field.name, Some(row.logical_id));
                slots.attach(field.name, row.clone());
                report.attached += 1;
            }
        }
    }

    if report.rows < pks.len() {
        warn!(
            "{} {} row(s) not found in {}, left unloaded",
            pks.len() - report.rows,
            meta.name,
            meta.table
        );
    }

    debug!(
        "Batch loaded {} {} row(s) in {}, attached {} translation(s)",
        report.rows,
        meta.name,
        locale,
        report.attached
    );
    Ok(report)
}

type BatchRow = (i64, Vec<Option<Translation>>);

fn fetch(db: &Database, meta: &ModelMeta, query: &CompiledQuery) -> Result<Vec<BatchRow>> {
    let conn = db.connection()?;
    let mut stmt = conn.prepare(&query.sql)?;
    let rows = stmt
        .query_map(params_from_iter(query.params.iter()), |r| {
            let pk: i64 = r.get(0)?;
            let mut fields = Vec::with_capacity(meta.fields.len());
            for index in 0..meta.fields.len() {
                fields.push(Translation::from_row(r, 1 + index * TRANSLATION_COLUMNS.len())?);
            }
            Ok((pk, fields))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
