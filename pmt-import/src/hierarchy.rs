//! Hierarchy path resolution
//!
//! Derives the root-to-target chain of names from one sparse CSV row. The
//! hierarchy columns form a fixed, ordered set; a row addresses the deepest
//! level it populates and every level above it.

use crate::reader::RowMap;

/// Hierarchy columns in root-to-leaf order.
pub const LEVEL_COLUMNS: [&str; 6] = [
    "equipment",
    "system",
    "assembly",
    "sub_assembly",
    "component",
    "part",
];

/// Ordered `(level, name)` pairs from level 0 down to the target level.
pub type LevelPath = Vec<(usize, String)>;

/// Scan the hierarchy columns from the last one backward and return the
/// ordered path up to the deepest non-empty level.
///
/// Returns `None` when every hierarchy column is empty; such rows are
/// skipped by the importer and show up only in the processed-row counts.
pub fn resolve_path(row: &RowMap) -> Option<LevelPath> {
    let deepest = LEVEL_COLUMNS
        .iter()
        .rposition(|column| !row.get(column).is_empty())?;

    Some(
        LEVEL_COLUMNS[..=deepest]
            .iter()
            .enumerate()
            .map(|(level, column)| (level, row.get(column).to_string()))
            .collect(),
    )
}
