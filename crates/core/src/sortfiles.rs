use crate::change::FileChange;
use crate::provider::read_file_times;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortCriterion {
    /// Lexical order of the full source path.
    Default,
    /// Like `Default`, but digit runs compare by numeric value.
    Natural,
    Size,
    Mtime,
    Btime,
    Atime,
    Ctime,
}

impl SortCriterion {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::Default),
            "natural" => Some(Self::Natural),
            "size" => Some(Self::Size),
            "mtime" => Some(Self::Mtime),
            "btime" => Some(Self::Btime),
            "atime" => Some(Self::Atime),
            "ctime" => Some(Self::Ctime),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    Path(String),
    Size(u64),
    Time(DateTime<Local>),
}

/// Orders the batch by `criterion`, ascending unless `reverse` is set.
/// Entries with equal keys keep their relative order.
pub fn sort_changes(
    changes: Vec<FileChange>,
    criterion: SortCriterion,
    reverse: bool,
) -> Result<Vec<FileChange>> {
    let keys = changes
        .par_iter()
        .map(|change| sort_key(change, criterion))
        .collect::<Result<Vec<_>>>()?;

    let mut keyed: Vec<(SortKey, FileChange)> = keys.into_iter().zip(changes).collect();
    keyed.sort_by(|(a, _), (b, _)| {
        let ord = match (criterion, a, b) {
            (SortCriterion::Natural, SortKey::Path(a), SortKey::Path(b)) => natural_cmp(a, b),
            _ => a.cmp(b),
        };
        if reverse {
            ord.reverse()
        } else {
            ord
        }
    });

    Ok(keyed.into_iter().map(|(_, change)| change).collect())
}

/// Moves every entry ahead of the entries nested below it by ordering on
/// directory depth. Order within one depth is preserved.
pub fn enforce_hierarchical_order(changes: &mut [FileChange]) {
    changes.sort_by_key(FileChange::depth);
}

fn sort_key(change: &FileChange, criterion: SortCriterion) -> Result<SortKey> {
    let path = change.source_path();
    let key = match criterion {
        SortCriterion::Default | SortCriterion::Natural => {
            SortKey::Path(path.to_string_lossy().into_owned())
        }
        SortCriterion::Size => SortKey::Size(entry_size(&path, change.is_dir)?),
        SortCriterion::Mtime => SortKey::Time(read_file_times(&path)?.modified),
        SortCriterion::Atime => SortKey::Time(read_file_times(&path)?.accessed),
        SortCriterion::Btime => {
            let times = read_file_times(&path)?;
            SortKey::Time(times.created.unwrap_or(times.modified))
        }
        SortCriterion::Ctime => {
            let times = read_file_times(&path)?;
            SortKey::Time(times.changed.unwrap_or(times.modified))
        }
    };
    Ok(key)
}

fn entry_size(path: &Path, is_dir: bool) -> Result<u64> {
    if !is_dir {
        let meta = fs::metadata(path)
            .with_context(|| format!("could not read file size: {}", path.display()))?;
        return Ok(meta.len());
    }

    let mut total = 0u64;
    for entry in WalkDir::new(path) {
        let entry =
            entry.with_context(|| format!("could not walk directory: {}", path.display()))?;
        if entry.file_type().is_file() {
            let meta = entry
                .metadata()
                .with_context(|| format!("could not read file size: {}", entry.path().display()))?;
            total += meta.len();
        }
    }
    Ok(total)
}

/// Compares strings so that `file2` sorts before `file10`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a_chars = a.chars().peekable();
    let mut b_chars = b.chars().peekable();

    loop {
        match (a_chars.peek().copied(), b_chars.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let x_run = take_digits(&mut a_chars);
                let y_run = take_digits(&mut b_chars);
                let x_trim = x_run.trim_start_matches('0');
                let y_trim = y_run.trim_start_matches('0');
                let ord = x_trim
                    .len()
                    .cmp(&y_trim.len())
                    .then_with(|| x_trim.cmp(y_trim))
                    .then_with(|| x_run.len().cmp(&y_run.len()));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(&y);
                }
                a_chars.next();
                b_chars.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(ch) = chars.peek().copied() {
        if !ch.is_ascii_digit() {
            break;
        }
        run.push(ch);
        chars.next();
    }
    run
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn names(changes: &[FileChange]) -> Vec<&str> {
        changes.iter().map(|c| c.source.as_str()).collect()
    }

    #[test]
    fn natural_cmp_orders_digit_runs_numerically() {
        assert_eq!(natural_cmp("file2", "file10"), Ordering::Less);
        assert_eq!(natural_cmp("file10", "file9"), Ordering::Greater);
        assert_eq!(natural_cmp("a01", "a1"), Ordering::Greater);
        assert_eq!(natural_cmp("abc", "abc"), Ordering::Equal);
        assert_eq!(natural_cmp("ab", "abc"), Ordering::Less);
    }

    #[test]
    fn default_and_natural_sorting_differ_on_numbers() {
        let batch = vec![
            FileChange::new("", "img10.jpg", false),
            FileChange::new("", "img2.jpg", false),
            FileChange::new("", "img1.jpg", false),
        ];

        let lexical = sort_changes(batch.clone(), SortCriterion::Default, false).expect("sort");
        assert_eq!(names(&lexical), vec!["img1.jpg", "img10.jpg", "img2.jpg"]);

        let natural = sort_changes(batch, SortCriterion::Natural, true).expect("sort");
        assert_eq!(names(&natural), vec!["img10.jpg", "img2.jpg", "img1.jpg"]);
    }

    #[test]
    fn size_sorting_reads_disk_and_sums_directories() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        fs::write(root.join("big.bin"), vec![0u8; 300]).expect("write big");
        fs::write(root.join("small.bin"), vec![0u8; 10]).expect("write small");
        fs::create_dir_all(root.join("dir")).expect("create dir");
        fs::write(root.join("dir").join("inner.bin"), vec![0u8; 100]).expect("write inner");

        let batch = vec![
            FileChange::new(root, "big.bin", false),
            FileChange::new(root, "dir", true),
            FileChange::new(root, "small.bin", false),
        ];
        let sorted = sort_changes(batch, SortCriterion::Size, false).expect("sort");
        assert_eq!(names(&sorted), vec!["small.bin", "dir", "big.bin"]);
    }

    #[test]
    fn missing_file_fails_size_sort() {
        let temp = tempdir().expect("tempdir");
        let batch = vec![FileChange::new(temp.path(), "absent", false)];
        assert!(sort_changes(batch, SortCriterion::Size, false).is_err());
    }

    #[test]
    fn hierarchical_order_puts_parents_first_and_is_stable() {
        let mut batch = vec![
            FileChange::new(PathBuf::from("root").join("b"), "z.txt", false),
            FileChange::new("root", "b", true),
            FileChange::new(PathBuf::from("root").join("b").join("c"), "y.txt", false),
            FileChange::new("root", "a.txt", false),
        ];
        enforce_hierarchical_order(&mut batch);
        assert_eq!(names(&batch), vec!["b", "a.txt", "z.txt", "y.txt"]);
    }

    #[test]
    fn criterion_names_round_trip() {
        assert_eq!(SortCriterion::from_name("mtime"), Some(SortCriterion::Mtime));
        assert_eq!(SortCriterion::from_name("natural"), Some(SortCriterion::Natural));
        assert_eq!(SortCriterion::from_name("bogus"), None);
    }
}
