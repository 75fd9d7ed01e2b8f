use crate::change::FileChange;
use anyhow::{Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub root: PathBuf,
    pub recursive: bool,
    pub include_hidden: bool,
    /// Offer directories for renaming alongside files.
    pub include_dirs: bool,
}

/// Collects the entries below `options.root` whose name matches `search`.
///
/// Each entry is keyed by its parent directory and its file name, in
/// file-name order per directory. Hidden directories are not descended into
/// unless hidden entries are included.
pub fn collect_changes(options: &ScanOptions, search: &Regex) -> Result<Vec<FileChange>> {
    let root = options.root.as_path();
    if !root.is_dir() {
        anyhow::bail!("not a directory: {}", root.display());
    }

    let max_depth = if options.recursive { usize::MAX } else { 1 };
    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| options.include_hidden || !is_hidden(entry));

    let mut out = Vec::new();
    for entry in walker {
        let entry = entry.with_context(|| format!("failed to walk directory: {}", root.display()))?;
        let is_dir = entry.file_type().is_dir();
        if is_dir && !options.include_dirs {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if !search.is_match(&name) {
            continue;
        }

        let base_dir = entry.path().parent().unwrap_or(root);
        out.push(FileChange::new(base_dir, name.into_owned(), is_dir));
    }

    Ok(out)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && is_hidden_path(entry.path())
}

fn is_hidden_path(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}
