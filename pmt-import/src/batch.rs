//! Batch import transactions
//!
//! Every import run wraps one CSV file in a single database transaction.
//! The two pipelines differ in row fault isolation:
//!
//! - `run_equipment_import` reloads the equipment tree with no per-row
//!   isolation: the first row failure rolls back the whole file, including
//!   the pre-import truncate.
//! - `run_catalog_import` opens a savepoint per row: a failing row is
//!   rolled back alone, recorded, and the run continues; the outer
//!   transaction commits whatever succeeded.

use crate::reader::RowMap;
use crate::records::CatalogKind;
use crate::reconcile::TargetAttrs;
use crate::{catalog, hierarchy, reconcile};
use pmt_common::{Error, Result};
use sqlx::{Acquire, SqlitePool};
use tracing::{info, warn};

/// Progress marker interval, in rows.
const PROGRESS_EVERY: usize = 50;

/// One isolated row failure from a catalog import.
#[derive(Debug)]
pub struct RowError {
    pub line: u64,
    pub message: String,
}

/// Outcome of one import run.
#[derive(Debug, Default)]
pub struct ImportSummary {
    /// Rows committed to the database.
    pub imported: usize,
    /// Rows ignored because no hierarchy column was populated.
    pub skipped: usize,
    /// Rows rolled back individually (catalog imports only).
    pub errors: Vec<RowError>,
}

/// Import an equipment hierarchy CSV: full reload, all-or-nothing.
///
/// The equipment table is emptied and its id sequence restarted inside the
/// transaction, then every row is merged incrementally into the rebuilt
/// tree. Any row-level SQL error propagates and rolls the whole file back.
pub async fn run_equipment_import(pool: &SqlitePool, rows: &[RowMap]) -> Result<ImportSummary> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM equipment").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM sqlite_sequence WHERE name = 'equipment'")
        .execute(&mut *tx)
        .await?;

    let mut summary = ImportSummary::default();

    for (processed, row) in rows.iter().enumerate() {
        // Rows with no hierarchy columns are a silent no-op; they surface
        // only as a count discrepancy.
        let Some(path) = hierarchy::resolve_path(row) else {
            summary.skipped += 1;
            continue;
        };

        let area_name = row.get_opt("area").ok_or_else(|| {
            Error::InvalidInput(format!("row {}: missing area name", row.line))
        })?;
        let area_id = catalog::resolve_area(&mut *tx, area_name).await?;

        let category_id = match row.get_opt("category") {
            Some(name) => Some(catalog::resolve_category(&mut *tx, name).await?),
            None => None,
        };

        let attrs = TargetAttrs {
            model: row.get_opt("model").map(str::to_string),
            serial_number: row.get_opt("serial_number").map(str::to_string),
            category_id,
            status: match row.get_opt("status") {
                Some(value) => value.parse()?,
                None => Default::default(),
            },
        };

        reconcile::reconcile_path(&mut *tx, area_id, &path, &attrs).await?;
        summary.imported += 1;

        if (processed + 1) % PROGRESS_EVERY == 0 {
            info!("Processed {} of {} rows", processed + 1, rows.len());
        }
    }

    tx.commit().await?;
    Ok(summary)
}

/// Import a catalog CSV: per-row savepoint isolation.
///
/// The kind's destructive reset and all row inserts share one outer
/// transaction; each row additionally runs inside its own savepoint so a
/// failure undoes that row's partial writes only. The outer transaction
/// commits after every row has been attempted, however many failed.
pub async fn run_catalog_import(
    pool: &SqlitePool,
    kind: CatalogKind,
    rows: &[RowMap],
) -> Result<ImportSummary> {
    let mut tx = pool.begin().await?;

    kind.reset(&mut *tx).await?;

    let mut summary = ImportSummary::default();

    for (processed, row) in rows.iter().enumerate() {
        let mut savepoint = tx.begin().await?;

        match kind.insert_row(&mut *savepoint, row).await {
            Ok(()) => {
                savepoint.commit().await?;
                summary.imported += 1;
            }
            Err(e) => {
                savepoint.rollback().await?;
                warn!("Row {} failed: {}", row.line, e);
                summary.errors.push(RowError {
                    line: row.line,
                    message: e.to_string(),
                });
            }
        }

        if (processed + 1) % PROGRESS_EVERY == 0 {
            info!("Processed {} of {} rows", processed + 1, rows.len());
        }
    }

    tx.commit().await?;
    Ok(summary)
}
