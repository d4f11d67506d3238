//! pmt-import - Batch catalog and equipment importer
//!
//! Reads one CSV file, runs it inside a single database transaction and
//! reports per-row progress plus a final count summary. Fatal errors
//! (missing file, malformed CSV, lost database connection) abort the run
//! with a nonzero exit and nothing committed.

use anyhow::Result;
use clap::{Parser, Subcommand};
use pmt_common::config;
use pmt_import::records::CatalogKind;
use pmt_import::{batch, reader};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "pmt-import", version, about = "Plant maintenance CSV importer")]
struct Cli {
    /// Root folder containing pmt.db (overrides PMT_ROOT_FOLDER and config file)
    #[arg(long)]
    root_folder: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import the equipment hierarchy export (full reload, all-or-nothing)
    Equipment {
        /// CSV file to import
        file: PathBuf,
    },
    /// Import a catalog export with per-row fault isolation
    Catalog {
        /// Record type the file contains
        #[arg(long, value_enum)]
        kind: CatalogKind,
        /// CSV file to import
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    info!("Starting pmt-import v{}", env!("CARGO_PKG_VERSION"));

    let root_folder = config::resolve_root_folder(cli.root_folder.as_deref());
    config::ensure_root_folder(&root_folder)?;
    let db_path = config::database_path(&root_folder);
    info!("Database: {}", db_path.display());

    let pool = pmt_common::db::init_database(&db_path).await?;

    let summary = match cli.command {
        Command::Equipment { file } => {
            let rows = reader::read_rows(&file)?;
            info!("Read {} rows from {}", rows.len(), file.display());
            batch::run_equipment_import(&pool, &rows).await?
        }
        Command::Catalog { kind, file } => {
            let rows = reader::read_rows(&file)?;
            info!("Read {} rows from {}", rows.len(), file.display());
            batch::run_catalog_import(&pool, kind, &rows).await?
        }
    };

    for row_error in &summary.errors {
        error!("Row {}: {}", row_error.line, row_error.message);
    }

    println!(
        "Imported {} rows ({} skipped, {} failed)",
        summary.imported,
        summary.skipped,
        summary.errors.len()
    );

    Ok(())
}
