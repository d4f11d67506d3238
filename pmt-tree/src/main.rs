//! pmt-tree - Read-only equipment hierarchy listing
//!
//! Prints every persisted equipment node with its depth and full
//! area-to-node path, sorted by path. Never writes to the database.

use anyhow::Result;
use clap::Parser;
use pmt_common::config;
use tracing::info;

mod db;
mod tree;

#[derive(Parser)]
#[command(name = "pmt-tree", version, about = "Equipment hierarchy listing")]
struct Cli {
    /// Root folder containing pmt.db (overrides PMT_ROOT_FOLDER and config file)
    #[arg(long)]
    root_folder: Option<String>,
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

    let root_folder = config::resolve_root_folder(cli.root_folder.as_deref());
    let db_path = config::database_path(&root_folder);
    info!("Database: {}", db_path.display());

    let pool = db::connect_readonly(&db_path).await?;

    let entries = tree::list_hierarchy(&pool).await?;
    for entry in &entries {
        println!("{:>2}  {}", entry.level, entry.path);
    }
    println!("{} equipment nodes", entries.len());

    Ok(())
}
