use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Loads a header-less CSV file whose first column names the file each row
/// describes. Relative names resolve against the CSV file's directory.
///
/// Rows are keyed by [`row_key`] of that path and keep every column, so
/// `{csv.1}` is the path column itself.
pub fn load_csv_rows(csv_path: &Path) -> Result<HashMap<PathBuf, Vec<String>>> {
    let base = csv_path.parent().unwrap_or_else(|| Path::new(""));
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(csv_path)
        .with_context(|| format!("failed to open csv file: {}", csv_path.display()))?;

    let mut rows = HashMap::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| {
            format!("failed to read csv row {} of {}", line + 1, csv_path.display())
        })?;
        let columns: Vec<String> = record.iter().map(str::to_string).collect();
        let Some(name) = columns.first().map(|c| c.trim()).filter(|c| !c.is_empty()) else {
            continue;
        };
        rows.insert(row_key(&base.join(name)), columns);
    }

    Ok(rows)
}

/// Canonical form used to match a file path against CSV rows. Paths that do
/// not exist are kept as given.
pub fn row_key(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
