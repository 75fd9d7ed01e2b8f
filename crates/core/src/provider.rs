use crate::csv_rows::{load_csv_rows, row_key};
use crate::exif_reader::read_exif_data;
use crate::exiftool_reader::ExifToolSession;
use crate::hashing::{hash_file, HashAlgorithm};
use crate::id3_reader::read_id3_data;
use crate::metadata::{ExifData, FileTimes, Id3Data};
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Source of per-file metadata consumed by the variable substituter.
///
/// Implementations report a missing attribute through empty/`None` values and
/// reserve `Err` for lookups that could not be performed at all; errors abort
/// the whole batch.
pub trait MetadataProvider {
    fn file_times(&self, path: &Path) -> Result<FileTimes>;
    fn hash(&self, path: &Path, algorithm: HashAlgorithm) -> Result<String>;
    fn exif(&self, path: &Path) -> Result<ExifData>;
    fn exiftool(&self, path: &Path) -> Result<HashMap<String, String>>;
    fn id3(&self, path: &Path) -> Result<Id3Data>;
    /// Value of a 1-based CSV column for the row keyed by `path`.
    fn csv(&self, path: &Path, column: usize) -> Option<String>;
}

/// Reads metadata from the local filesystem and external tools.
#[derive(Default)]
pub struct SystemProvider {
    csv_rows: HashMap<PathBuf, Vec<String>>,
    exiftool: ExifToolSession,
}

impl SystemProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers CSV rows keyed by the file path they describe.
    pub fn with_csv_rows(mut self, rows: HashMap<PathBuf, Vec<String>>) -> Self {
        self.csv_rows = rows;
        self
    }

    /// Loads the rows of a CSV file whose first column names the file.
    pub fn with_csv_file(self, csv_path: &Path) -> Result<Self> {
        let rows = load_csv_rows(csv_path)?;
        Ok(self.with_csv_rows(rows))
    }
}

impl MetadataProvider for SystemProvider {
    fn file_times(&self, path: &Path) -> Result<FileTimes> {
        read_file_times(path)
    }

    fn hash(&self, path: &Path, algorithm: HashAlgorithm) -> Result<String> {
        if path.is_dir() {
            return Ok(String::new());
        }
        hash_file(path, algorithm)
    }

    fn exif(&self, path: &Path) -> Result<ExifData> {
        if path.is_dir() {
            return Ok(ExifData::default());
        }
        read_exif_data(path)
    }

    fn exiftool(&self, path: &Path) -> Result<HashMap<String, String>> {
        self.exiftool.read_tags(path)
    }

    fn id3(&self, path: &Path) -> Result<Id3Data> {
        if path.is_dir() {
            return Ok(Id3Data::default());
        }
        read_id3_data(path)
    }

    fn csv(&self, path: &Path, column: usize) -> Option<String> {
        let row = self
            .csv_rows
            .get(path)
            .or_else(|| self.csv_rows.get(&row_key(path)))?;
        row.get(column.checked_sub(1)?).cloned()
    }
}

pub fn read_file_times(path: &Path) -> Result<FileTimes> {
    let meta = fs::metadata(path)
        .with_context(|| format!("could not read file metadata: {}", path.display()))?;
    let modified = meta
        .modified()
        .with_context(|| format!("modification time unavailable: {}", path.display()))?;
    let accessed = meta.accessed().unwrap_or(modified);
    let created = meta.created().ok().map(DateTime::<Local>::from);

    Ok(FileTimes {
        modified: DateTime::from(modified),
        accessed: DateTime::from(accessed),
        created,
        changed: status_change_time(&meta),
    })
}

#[cfg(unix)]
fn status_change_time(meta: &fs::Metadata) -> Option<DateTime<Local>> {
    use chrono::TimeZone;
    use std::os::unix::fs::MetadataExt;

    let nanos = u32::try_from(meta.ctime_nsec()).ok()?;
    Local.timestamp_opt(meta.ctime(), nanos).single()
}

#[cfg(not(unix))]
fn status_change_time(_meta: &fs::Metadata) -> Option<DateTime<Local>> {
    None
}
