//! Command-line access to a translation database.
//!
//! Usage:
//!   translations create <locale> <text> [logical_id]
//!   translations get <row_id>
//!   translations resolve <locale> <default_locale> <logical_id>...
//!   translations stats
//!
//! Every command prints JSON on stdout.
//!
//! Environment (also read from `.env`):
//! - DATABASE_PATH (defaults to translations.db)
//! - SITE_LOCALE (defaults to en-US)
//! - CACHE_ENABLED, CACHE_TTL_SECS, CACHE_PREFIX, DB_BUSY_TIMEOUT_MS

use anyhow::{bail, Context, Result};
use serde_json::{json, Value};
use tracing::info;
use translation_store::{config::Config, resolve_fallback, TranslationStore};

const USAGE: &str = "usage: translations <create <locale> <text> [logical_id] | get <row_id> | \
                     resolve <locale> <default_locale> <logical_id>... | stats>";

fn main() -> Result<()> {
    // Load .env file (ignored when absent)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("translation_store=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    let store = TranslationStore::from_config(&config)
        .with_context(|| format!("Failed to open {}", config.database_path))?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let output = run(&store, &config, &args)?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    info!("{}", store.metrics().report().format());
    Ok(())
}

fn run(store: &TranslationStore, config: &Config, args: &[String]) -> Result<Value> {
    let Some((command, rest)) = args.split_first() else {
        bail!(USAGE);
    };

    match (command.as_str(), rest) {
        ("create", [locale, text]) => Ok(json!(store.create(text, locale, None)?)),
        ("create", [locale, text, id]) => {
            let id = parse_id(id)?;
            Ok(json!(store.create(text, locale, Some(id))?))
        }
        ("get", [row_id]) => {
            let row_id = parse_id(row_id)?;
            match store.get(row_id)? {
                Some(row) => Ok(json!(row)),
                None => bail!("No translation row {}", row_id),
            }
        }
        ("resolve", [locale, default_locale, ids @ ..]) if !ids.is_empty() => {
            let ids = ids.iter().map(|id| parse_id(id)).collect::<Result<Vec<_>>>()?;
            let rows = resolve_fallback(store, &ids, locale, default_locale)?;
            Ok(json!(rows))
        }
        ("stats", []) => {
            let db = store.database();
            Ok(json!({
                "database": config.database_path,
                "site_locale": config.site_locale,
                "rows": db.translation_count()?,
                "last_logical_id": db.last_logical_id()?,
            }))
        }
        _ => bail!(USAGE),
    }
}

fn parse_id(value: &str) -> Result<i64> {
    value
        .parse()
        .with_context(|| format!("Expected an integer id, got {:?}", value))
}
