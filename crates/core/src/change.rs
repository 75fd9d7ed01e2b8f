use crate::sortfiles::SortCriterion;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Pending,
    Ok,
    Error,
    Conflict,
}

/// One file or directory of a rename batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileChange {
    /// Name of the entry inside `base_dir`.
    pub source: String,
    pub target: String,
    pub base_dir: PathBuf,
    pub rel_target_path: PathBuf,
    pub is_dir: bool,
    /// Position of the entry in the processed batch.
    pub index: usize,
    pub status: Status,
}

impl FileChange {
    pub fn new(base_dir: impl Into<PathBuf>, source: impl Into<String>, is_dir: bool) -> Self {
        let source = source.into();
        Self {
            target: source.clone(),
            source,
            base_dir: base_dir.into(),
            rel_target_path: PathBuf::new(),
            is_dir,
            index: 0,
            status: Status::Pending,
        }
    }

    /// Location of the entry on disk.
    pub fn source_path(&self) -> PathBuf {
        self.base_dir.join(&self.source)
    }

    pub fn changed(&self) -> bool {
        self.source != self.target
    }

    pub(crate) fn depth(&self) -> usize {
        depth(&self.base_dir)
    }
}

fn depth(path: &Path) -> usize {
    path.components().count()
}

/// One find/replace step of a chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainLink {
    pub find: String,
    pub replace: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ReplacementChain {
    pub links: Vec<ChainLink>,
}

impl ReplacementChain {
    pub fn single(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            links: vec![ChainLink {
                find: find.into(),
                replace: replace.into(),
            }],
        }
    }

    /// Pairs find and replace arguments positionally. A link without its own
    /// find argument reuses the previous one; a find without a replacement
    /// replaces with nothing.
    pub fn from_pairs(finds: &[String], replaces: &[String]) -> Self {
        let len = finds.len().max(replaces.len());
        let mut links = Vec::with_capacity(len);
        let mut find = String::new();

        for i in 0..len {
            if let Some(f) = finds.get(i) {
                find = f.clone();
            }
            links.push(ChainLink {
                find: find.clone(),
                replace: replaces.get(i).cloned().unwrap_or_default(),
            });
        }

        Self { links }
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }
}

/// How a find argument is compiled into a search pattern.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct FindOptions {
    pub ignore_case: bool,
    /// Treat the find argument as plain text rather than a regex.
    pub literal: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ReplaceOptions {
    pub chain: ReplacementChain,
    pub find: FindOptions,
    /// 0 replaces every match; positive counts from the start, negative from
    /// the end.
    pub replace_limit: i64,
    pub ignore_extension: bool,
    pub sort: Option<SortCriterion>,
    pub reverse_sort: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn from_pairs_reuses_previous_find() {
        let chain = ReplacementChain::from_pairs(&strings(&["a"]), &strings(&["b", "c"]));
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.links[1].find, "a");
        assert_eq!(chain.links[1].replace, "c");
    }

    #[test]
    fn from_pairs_defaults_missing_replacement_to_empty() {
        let chain = ReplacementChain::from_pairs(&strings(&["a", "b"]), &strings(&["x"]));
        assert_eq!(chain.links[1].find, "b");
        assert_eq!(chain.links[1].replace, "");
    }

    #[test]
    fn new_change_starts_pending_with_source_as_target() {
        let change = FileChange::new("photos", "a.jpg", false);
        assert_eq!(change.target, "a.jpg");
        assert_eq!(change.status, Status::Pending);
        assert!(!change.changed());
        assert_eq!(change.source_path(), PathBuf::from("photos").join("a.jpg"));
    }
}
