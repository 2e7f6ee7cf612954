//! # Seedload - CSV seed data for modeled databases
//!
//! Seedload fills database tables from CSV seed files kept next to a CDS-style
//! data model, and can be re-run against an already seeded database.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Folders   │────▶│    Files    │────▶│   Entity    │────▶│   Records   │
//! │ (data, csv) │     │ (locale-aw.)│     │ (texts, vw) │     │ (INSERT ..) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use seedload::{load, JsonModel};
//!
//! #[tokio::main]
//! async fn main() {
//!     let model = JsonModel::from_file("gen/csn.json").unwrap();
//!     let pool = sqlx::PgPool::connect("postgres://localhost/bookshop").await.unwrap();
//!     let report = load(&model, true, &pool).await.unwrap();
//!     println!("Loaded {} tables", report.loaded.len());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types
//! - [`model`] - Model capability and CSN-shaped definitions
//! - [`validation`] - Model document schema validation
//! - [`discovery`] - Seed folders and seed file selection
//! - [`resolve`] - File name to entity resolution
//! - [`parser`] - CSV parsing
//! - [`records`] - Insert statements
//! - [`db`] - Database client seam
//! - [`pipeline`] - The `load` entry point
//! - [`logs`] - Progress logging

// Core modules
pub mod error;
pub mod model;
pub mod validation;

// Pipeline stages
pub mod discovery;
pub mod resolve;
pub mod parser;
pub mod records;

// Database
pub mod db;

// Orchestration
pub mod pipeline;
pub mod logs;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError,
    ModelError,
    CsvError,
    StatementError,
    RecordError,
    LoadError,
    LoadResult,
};

// =============================================================================
// Re-exports - Model
// =============================================================================

pub use model::{Model, EntityDef, Element, JsonModel};
pub use validation::validate_model_document;

// =============================================================================
// Re-exports - Stages
// =============================================================================

pub use discovery::{
    resolve_folders,
    list_entries,
    seed_files_in,
    select_seed_files,
    logical_name,
    SeedFile,
    SEED_LOCATIONS,
    SEED_EXTENSION,
};

pub use resolve::{resolve_entity, resolve_step, Resolution, ResolvedEntity, ViewShape};

pub use parser::{parse_table, read_table, Table};

pub use records::{
    build_insert,
    load_records,
    quote_literal,
    InsertStatement,
    RecordOutcome,
    SkipReason,
};

// =============================================================================
// Re-exports - Database
// =============================================================================

pub use db::{ClientError, DryRunClient, SqlClient};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use pipeline::{
    load,
    load_with_options,
    LoadOptions,
    LoadReport,
    LoadedFile,
    SkippedFile,
};
