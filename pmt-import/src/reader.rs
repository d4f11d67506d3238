//! CSV row source
//!
//! Turns a CSV file into an ordered sequence of string-keyed row maps with
//! header-derived keys. Header names are lowercased and trimmed so column
//! lookups are stable across hand-edited exports.

use pmt_common::{Error, Result};
use std::collections::HashMap;
use std::path::Path;

/// One CSV data row, keyed by normalized header name.
#[derive(Debug, Clone, Default)]
pub struct RowMap {
    fields: HashMap<String, String>,
    /// 1-based line number in the source file (header = 1, first data row = 2).
    pub line: u64,
}

impl RowMap {
    /// Cell value for a column, or the empty string when the column is
    /// missing or blank.
    pub fn get(&self, key: &str) -> &str {
        self.fields.get(key).map(String::as_str).unwrap_or("")
    }

    /// Non-empty cell value for a column.
    pub fn get_opt(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            "" => None,
            value => Some(value),
        }
    }

    #[cfg(test)]
    pub fn from_pairs(line: u64, pairs: &[(&str, &str)]) -> Self {
        RowMap {
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            line,
        }
    }
}

/// Read every data row of a CSV file.
///
/// Unreadable files and malformed CSV are fatal import errors; they surface
/// before any database transaction is opened.
pub fn read_rows(path: &Path) -> Result<Vec<RowMap>> {
    if !path.exists() {
        return Err(Error::NotFound(format!(
            "input file {}",
            path.display()
        )));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        let mut fields = HashMap::with_capacity(headers.len());
        for (i, header) in headers.iter().enumerate() {
            let value = record.get(i).unwrap_or("").trim();
            fields.insert(header.clone(), value.to_string());
        }
        rows.push(RowMap {
            fields,
            line: idx as u64 + 2,
        });
    }

    Ok(rows)
}
