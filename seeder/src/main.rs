//! Seedload CLI - Load CSV seed files into a database
//!
//! # Main Commands
//!
//! ```bash
//! seedload load --model gen/csn.json           # Initial load (DATABASE_URL)
//! seedload load --model gen/csn.json --delta   # Re-run over seeded tables
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! seedload plan --model gen/csn.json --sql     # Show what would be inserted
//! seedload resolve --model gen/csn.json Books_texts_de.csv
//! seedload validate --model gen/csn.json       # Check the model document
//! ```

use clap::{Parser, Subcommand};
use seedload::logs::log_error;
use seedload::{
    load_with_options, logical_name, resolve_entity, validate_model_document, DryRunClient,
    JsonModel, LoadOptions, LoadReport, ViewShape, SEED_EXTENSION,
};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "seedload")]
#[command(about = "Load CSV seed files into the tables of a data model", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load all seed files into the database
    Load {
        /// Compiled model (CSN JSON)
        #[arg(short, long)]
        model: PathBuf,

        /// The database may already contain seed rows
        #[arg(long)]
        delta: bool,

        /// Skip views over entities missing from the model
        #[arg(long)]
        strict_views: bool,

        /// Database URL (default: DATABASE_URL)
        #[arg(long)]
        database_url: Option<String>,

        /// Print the load report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show what a load would do, without a database
    Plan {
        /// Compiled model (CSN JSON)
        #[arg(short, long)]
        model: PathBuf,

        /// Skip views over entities missing from the model
        #[arg(long)]
        strict_views: bool,

        /// Also print the generated statements
        #[arg(long)]
        sql: bool,
    },

    /// Resolve seed file names to tables
    Resolve {
        /// Compiled model (CSN JSON)
        #[arg(short, long)]
        model: PathBuf,

        /// File or logical names (e.g. Books-authors.csv, Books_texts_de)
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Validate a model document
    Validate {
        /// Compiled model (CSN JSON)
        #[arg(short, long)]
        model: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Load {
            model,
            delta,
            strict_views,
            database_url,
            json,
        } => cmd_load(&model, delta, strict_views, database_url, json).await,

        Commands::Plan {
            model,
            strict_views,
            sql,
        } => cmd_plan(&model, strict_views, sql).await,

        Commands::Resolve { model, names } => cmd_resolve(&model, &names),

        Commands::Validate { model } => cmd_validate(&model),
    };

    if let Err(e) = result {
        log_error(format!("Error: {}", e));
        std::process::exit(1);
    }
}

fn options(delta: bool, strict_views: bool) -> Result<LoadOptions, Box<dyn std::error::Error>> {
    let mut options = LoadOptions::from_env()?;
    options.delta_update |= delta;
    options.strict_views |= strict_views;
    Ok(options)
}

async fn cmd_load(
    model_path: &Path,
    delta: bool,
    strict_views: bool,
    database_url: Option<String>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = options(delta, strict_views)?;
    let model = JsonModel::from_file(model_path)?;

    let url = match database_url {
        Some(url) => url,
        None => std::env::var("DATABASE_URL")
            .map_err(|_| seedload::ConfigError::Missing("DATABASE_URL".into()))?,
    };
    let pool = PgPoolOptions::new().max_connections(1).connect(&url).await?;

    let report = load_with_options(&model, &options, &pool).await;
    pool.close().await;
    let report = report?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

async fn cmd_plan(
    model_path: &Path,
    strict_views: bool,
    sql: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = options(false, strict_views)?;
    let model = JsonModel::from_file(model_path)?;
    let client = DryRunClient::new();

    let report = load_with_options(&model, &options, &client).await?;
    print_report(&report);

    if sql {
        println!();
        for statement in client.statements() {
            println!("{};", statement);
        }
    }
    Ok(())
}

fn cmd_resolve(model_path: &Path, names: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let model = JsonModel::from_file(model_path)?;

    for name in names {
        let derived = if name.ends_with(SEED_EXTENSION) {
            logical_name(name)
        } else {
            name.clone()
        };

        match resolve_entity(&model, &derived) {
            Some(entity) => {
                let mut notes = Vec::new();
                if entity.redirected {
                    notes.push("via texts".to_string());
                }
                match &entity.view {
                    ViewShape::Table => {}
                    ViewShape::PassThrough { source, source_known } => notes.push(format!(
                        "view of {}{}",
                        source,
                        if *source_known { "" } else { " (unknown)" }
                    )),
                    ViewShape::Projection => notes.push("projection view".to_string()),
                }
                if entity.persistence_skip() {
                    notes.push("persistence skip".to_string());
                }
                println!(
                    "{} → {} [{}]{}",
                    name,
                    entity.name,
                    entity.table_name(),
                    if notes.is_empty() { String::new() } else { format!(" ({})", notes.join(", ")) }
                );
            }
            None => println!("{} → (no entity)", name),
        }
    }
    Ok(())
}

fn cmd_validate(model_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("✔️  Validating: {}", model_path.display());

    let content = fs::read_to_string(model_path)?;
    let document: Value = serde_json::from_str(&content)?;

    match validate_model_document(&document) {
        Ok(()) => {
            let count = document["definitions"].as_object().map(|d| d.len()).unwrap_or(0);
            eprintln!("✅ Valid model with {} definitions", count);
            Ok(())
        }
        Err(errors) => {
            for err in errors.iter().take(10) {
                eprintln!("   - {}", err);
            }
            Err(format!("{} validation errors", errors.len()).into())
        }
    }
}

fn print_report(report: &LoadReport) {
    println!("Folders:");
    for folder in &report.folders {
        println!("  📂 {}", folder.display());
    }

    println!("Loaded ({}):", report.loaded.len());
    for file in &report.loaded {
        println!(
            "  {} → {} ({} rows, {} inserted)",
            file.file.display(),
            file.table,
            file.rows,
            file.rows_affected
        );
    }

    if !report.skipped.is_empty() {
        println!("Skipped ({}):", report.skipped.len());
        for file in &report.skipped {
            println!("  {} ({:?})", file.file.display(), file.reason);
        }
    }
}
