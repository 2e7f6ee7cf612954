//! High-level load API.
//!
//! Runs every stage for each discovered file, strictly one file at a time:
//!
//! 1. Resolve seed folders from the model sources
//! 2. Select the seed files of each folder
//! 3. Resolve each file to a writable entity
//! 4. Parse the file and insert its rows, skipping conflicts
//!
//! Unresolved files, persistence-skip entities and header-only files are
//! recorded in the [`LoadReport`]; the first read, parse or database error
//! aborts the run.
//!
//! # Example
//!
//! ```rust,ignore
//! use seedload::{load, JsonModel};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let model = JsonModel::from_file("gen/csn.json")?;
//!     let pool = sqlx::PgPool::connect(&std::env::var("DATABASE_URL")?).await?;
//!
//!     let report = load(&model, true, &pool).await?;
//!     println!("{} tables loaded", report.loaded.len());
//!     Ok(())
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Instant;

use crate::db::SqlClient;
use crate::discovery::{resolve_folders, seed_files_in, SeedFile, SEED_LOCATIONS};
use crate::error::{ConfigError, ConfigResult, LoadError, LoadResult, RecordError};
use crate::logs::{log_info, log_info_indent, log_success, log_success_indent, log_warning};
use crate::model::Model;
use crate::parser::read_table;
use crate::records::{load_records, RecordOutcome, SkipReason};
use crate::resolve::resolve_entity;

pub const ENV_DELTA: &str = "SEEDLOAD_DELTA";
pub const ENV_LOCATIONS: &str = "SEEDLOAD_LOCATIONS";
pub const ENV_STRICT_VIEWS: &str = "SEEDLOAD_STRICT_VIEWS";

/// Options for a load run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// The target may already hold seed rows.
    pub delta_update: bool,

    /// Folder names probed next to every model source.
    pub locations: Vec<String>,

    /// Skip pass-through views whose source entity is not in the model.
    pub strict_views: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delta_update: false,
            locations: SEED_LOCATIONS.iter().map(|s| s.to_string()).collect(),
            strict_views: false,
        }
    }
}

impl LoadOptions {
    /// Defaults overridden by `SEEDLOAD_*` environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        let mut options = Self::default();

        if let Some(delta) = env_bool(ENV_DELTA)? {
            options.delta_update = delta;
        }
        if let Some(strict) = env_bool(ENV_STRICT_VIEWS)? {
            options.strict_views = strict;
        }
        if let Ok(raw) = env::var(ENV_LOCATIONS) {
            let locations: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if locations.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: ENV_LOCATIONS.to_string(),
                    value: raw,
                });
            }
            options.locations = locations;
        }

        Ok(options)
    }
}

fn env_bool(key: &str) -> ConfigResult<Option<bool>> {
    match env::var(key) {
        Ok(value) => parse_bool(&value)
            .map(Some)
            .ok_or(ConfigError::InvalidValue { key: key.to_string(), value }),
        Err(_) => Ok(None),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// A file whose rows were sent to the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedFile {
    pub file: PathBuf,
    pub entity: String,
    pub table: String,
    /// Rows in the file
    pub rows: usize,
    /// Rows actually inserted; lower than `rows` when some already existed
    pub rows_affected: u64,
}

/// A file that was not loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedFile {
    pub file: PathBuf,
    pub logical_name: String,
    pub reason: SkipReason,
}

/// Result of a load run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub delta_update: bool,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub folders: Vec<PathBuf>,
    pub loaded: Vec<LoadedFile>,
    pub skipped: Vec<SkippedFile>,
}

impl LoadReport {
    fn new(delta_update: bool) -> Self {
        Self {
            delta_update,
            started_at: Utc::now(),
            elapsed_ms: 0,
            folders: Vec::new(),
            loaded: Vec::new(),
            skipped: Vec::new(),
        }
    }

    fn skip(&mut self, file: &SeedFile, logical_name: &str, reason: SkipReason) {
        log_info_indent(format!("– {} ({:?})", file.name, reason), 1);
        self.skipped.push(SkippedFile {
            file: file.path.clone(),
            logical_name: logical_name.to_string(),
            reason,
        });
    }

    /// Number of files skipped for `reason`.
    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skipped.iter().filter(|s| s.reason == reason).count()
    }

    /// Rows inserted over all files.
    pub fn rows_affected(&self) -> u64 {
        self.loaded.iter().map(|f| f.rows_affected).sum()
    }
}

/// Load every seed file of the model's source folders.
///
/// Conflicting rows are skipped in both modes; `delta_update` is carried
/// into the report and the log.
pub async fn load<M, C>(model: &M, delta_update: bool, client: &C) -> LoadResult<LoadReport>
where
    M: Model + ?Sized,
    C: SqlClient + ?Sized,
{
    let options = LoadOptions {
        delta_update,
        ..LoadOptions::default()
    };
    load_with_options(model, &options, client).await
}

/// Same as [`load`] with explicit options.
pub async fn load_with_options<M, C>(
    model: &M,
    options: &LoadOptions,
    client: &C,
) -> LoadResult<LoadReport>
where
    M: Model + ?Sized,
    C: SqlClient + ?Sized,
{
    let timer = Instant::now();
    let mut report = LoadReport::new(options.delta_update);

    log_info(format!(
        "🌱 Seeding database ({} load)...",
        if options.delta_update { "delta" } else { "initial" }
    ));

    report.folders = resolve_folders(model.sources(), &options.locations).await?;
    if report.folders.is_empty() {
        log_info("No seed folders found");
    }

    for folder in report.folders.clone() {
        log_info(format!("📂 {}", folder.display()));
        for file in seed_files_in(&folder).await? {
            load_file(model, options, client, &file, &mut report).await?;
        }
    }

    report.elapsed_ms = timer.elapsed().as_millis() as u64;
    log_success(format!(
        "{} files loaded, {} rows inserted, {} skipped",
        report.loaded.len(),
        report.rows_affected(),
        report.skipped.len()
    ));

    Ok(report)
}

async fn load_file<M, C>(
    model: &M,
    options: &LoadOptions,
    client: &C,
    file: &SeedFile,
    report: &mut LoadReport,
) -> LoadResult<()>
where
    M: Model + ?Sized,
    C: SqlClient + ?Sized,
{
    let logical_name = file.logical_name();

    let Some(entity) = resolve_entity(model, &logical_name) else {
        report.skip(file, &logical_name, SkipReason::Unresolved);
        return Ok(());
    };
    if entity.persistence_skip() {
        report.skip(file, &logical_name, SkipReason::PersistenceSkip);
        return Ok(());
    }
    if entity.has_unknown_view_source() {
        if options.strict_views {
            report.skip(file, &logical_name, SkipReason::UnknownViewSource);
            return Ok(());
        }
        log_warning(format!("{} is a view over an entity missing from the model", entity.name));
    }

    let table = read_table(&file.path).await.map_err(|source| LoadError::Csv {
        file: file.path.clone(),
        source,
    })?;

    match load_records(&entity, &table, client).await {
        Ok(RecordOutcome::Loaded { table, rows, rows_affected }) => {
            log_success_indent(
                format!("{} → {} ({}/{} rows)", file.name, table, rows_affected, rows),
                1,
            );
            report.loaded.push(LoadedFile {
                file: file.path.clone(),
                entity: entity.name.clone(),
                table,
                rows,
                rows_affected,
            });
            Ok(())
        }
        Ok(RecordOutcome::Skipped(reason)) => {
            report.skip(file, &logical_name, reason);
            Ok(())
        }
        Err(RecordError::Statement(source)) => Err(LoadError::Statement {
            file: file.path.clone(),
            source,
        }),
        Err(RecordError::Database { table, source }) => Err(LoadError::Database {
            file: file.path.clone(),
            table,
            source,
        }),
    }
}
