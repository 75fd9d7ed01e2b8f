//! Applies a chain of find/replace links to a batch of files.
//!
//! Each link extracts the variables of its own replacement template, runs the
//! limited regex replacement over every file name and then resolves the
//! variables. The names produced by one link are the input of the next; the
//! caller only ever sees the names produced by the last link.

use crate::change::{FileChange, FindOptions, ReplaceOptions, ReplacementChain, Status};
use crate::error::{ReplaceError, Result};
use crate::index::IndexState;
use crate::pathutil::{clean_path, split_extension};
use crate::provider::MetadataProvider;
use crate::regex_replace::regex_replace;
use crate::sortfiles::{enforce_hierarchical_order, sort_changes};
use crate::substitute::{substitute, FileContext};
use crate::variables::{extract_variables, protect_tokens, Variables};
use chrono::Local;
use regex::{Regex, RegexBuilder};
use std::path::PathBuf;
use tracing::debug;

const MATCH_WHOLE_NAME: &str = r"(?s)^.*$";

/// Computes the target name of every entry in `changes`.
///
/// The batch is sorted once when a sort criterion is configured, and put in
/// parent-before-child order when any link numbers files. Any error aborts
/// the whole batch.
pub fn replace(
    options: &ReplaceOptions,
    changes: Vec<FileChange>,
    provider: &dyn MetadataProvider,
) -> Result<Vec<FileChange>> {
    let changes = match options.sort {
        Some(criterion) => {
            debug!(
                sort = ?criterion,
                reverse_sort = options.reverse_sort,
                "sorting matches before replacement"
            );
            sort_changes(changes, criterion, options.reverse_sort).map_err(ReplaceError::sort)?
        }
        None => changes,
    };

    run_chain(options, changes, provider)
}

/// Compiles a find argument. An empty argument matches the whole name.
pub fn compile_search(find: &str, options: FindOptions) -> Result<Regex> {
    let pattern = if find.is_empty() {
        MATCH_WHOLE_NAME.to_string()
    } else if options.literal {
        regex::escape(find)
    } else {
        find.to_string()
    };

    Ok(RegexBuilder::new(&pattern)
        .case_insensitive(options.ignore_case)
        .build()?)
}

fn run_chain(
    options: &ReplaceOptions,
    mut changes: Vec<FileChange>,
    provider: &dyn MetadataProvider,
) -> Result<Vec<FileChange>> {
    let chain: &ReplacementChain = &options.chain;
    if chain.is_empty() {
        return Ok(changes);
    }

    let link_vars = chain
        .links
        .iter()
        .map(|link| extract_variables(&link.replace))
        .collect::<Result<Vec<Variables>>>()?;
    debug!(vars = ?link_vars, "extracted variables");

    if link_vars.iter().any(Variables::has_index) {
        enforce_hierarchical_order(&mut changes);
        debug!("sorted matches based on directory level");
    }

    let originals: Vec<String> = changes.iter().map(|c| c.source.clone()).collect();
    let disk_paths: Vec<PathBuf> = changes.iter().map(FileChange::source_path).collect();
    let now = Local::now();
    let last = chain.len() - 1;

    for (i, (link, vars)) in chain.links.iter().zip(&link_vars).enumerate() {
        debug!(
            replacement_index = i,
            find_arg = %link.find,
            replace_arg = %link.replace,
            "executing find and replace"
        );

        let search = compile_search(&link.find, options.find)?;
        let template = protect_tokens(&link.replace, vars);
        let mut index_state = IndexState::new(vars.index.len());

        for (pos, change) in changes.iter_mut().enumerate() {
            change.index = pos;
            let input = change.source.clone();
            let (stem, ext) = if options.ignore_extension && !change.is_dir {
                split_extension(&input)
            } else {
                (input.as_str(), "")
            };

            let replaced = regex_replace(&search, stem, &template, options.replace_limit);
            debug!(source = %input, replaced = %replaced, "regex replacement result");

            let ctx = FileContext {
                input_name: &input,
                match_name: stem,
                disk_path: &disk_paths[pos],
                is_dir: change.is_dir,
                search: &search,
                now,
            };
            let mut target = substitute(replaced, vars, &ctx, &mut index_state, provider)?;
            target.push_str(ext);
            debug!(source = %input, target = %target, "variable replacement result");

            change.target = clean_path(&target).trim().to_string();
            change.status = Status::Ok;
            change.rel_target_path = change.base_dir.join(&change.target);
        }

        if i == last {
            break;
        }

        for change in changes.iter_mut() {
            change.source = change.target.clone();
        }
        debug!(replacement_index = i, "updated sources for next find/replace");
    }

    for (change, original) in changes.iter_mut().zip(originals) {
        change.source = original;
    }

    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChainLink;
    use crate::provider::SystemProvider;
    use crate::sortfiles::SortCriterion;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn batch(names: &[&str]) -> Vec<FileChange> {
        names
            .iter()
            .map(|name| FileChange::new("dir", *name, false))
            .collect()
    }

    fn options(find: &str, replace: &str) -> ReplaceOptions {
        ReplaceOptions {
            chain: ReplacementChain::single(find, replace),
            ..ReplaceOptions::default()
        }
    }

    fn targets(changes: &[FileChange]) -> Vec<&str> {
        changes.iter().map(|c| c.target.as_str()).collect()
    }

    fn run(options: &ReplaceOptions, changes: Vec<FileChange>) -> Result<Vec<FileChange>> {
        replace(options, changes, &SystemProvider::new())
    }

    #[test]
    fn plain_replacement_matches_limited_replacer() {
        let mut opts = options("X", "-");
        opts.replace_limit = -1;
        let out = run(&opts, batch(&["aXaXaXa"])).expect("replace");
        assert_eq!(targets(&out), vec!["aXaXa-a"]);
        assert_eq!(out[0].status, Status::Ok);
        assert_eq!(out[0].rel_target_path, Path::new("dir").join("aXaXa-a"));
    }

    #[test]
    fn identity_replacement_keeps_names() {
        let out = run(&options("(.*)", "$1"), batch(&["a.txt", "b c.md"])).expect("replace");
        for change in &out {
            assert_eq!(change.target, change.source);
        }
    }

    #[test]
    fn index_numbers_follow_batch_order() {
        let out = run(&options("img", "photo_{%03d}"), batch(&["img.a", "img.b", "img.c"]))
            .expect("replace");
        assert_eq!(
            targets(&out),
            vec!["photo_001.a", "photo_002.b", "photo_003.c"]
        );
        let positions: Vec<usize> = out.iter().map(|c| c.index).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn index_skips_and_steps() {
        let out = run(&options(".*", "{%d<3>}"), batch(&["a", "b", "c", "d"])).expect("replace");
        assert_eq!(targets(&out), vec!["1", "2", "4", "5"]);

        let out = run(&options(".*", "{10%d5}"), batch(&["a", "b", "c"])).expect("replace");
        assert_eq!(targets(&out), vec!["10", "15", "20"]);
    }

    #[test]
    fn capture_scoped_index_counts_per_value() {
        let opts = options(r"^(\w+)-.*", "${1}_{$1%02d}");
        let out = run(&opts, batch(&["cat-x", "dog-y", "cat-z", "dog-w", "cat-v"]))
            .expect("replace");
        assert_eq!(
            targets(&out),
            vec!["cat_01", "dog_01", "cat_02", "dog_02", "cat_03"]
        );
    }

    #[test]
    fn capture_scoped_index_applies_step_and_skip_per_value() {
        let opts = options(r"^(\w+)-.*", "${1}_{$1%d2<3>}");
        let out = run(&opts, batch(&["cat-a", "dog-b", "cat-c", "cat-d", "dog-e"]))
            .expect("replace");
        assert_eq!(
            targets(&out),
            vec!["cat_1", "dog_1", "cat_5", "cat_7", "dog_5"]
        );
    }

    #[test]
    fn absent_capture_group_shares_one_counter() {
        let opts = options(r"^(\w+)-.*", "{$3%02d}");
        let out = run(&opts, batch(&["cat-a", "dog-b", "cat-c"])).expect("replace");
        assert_eq!(targets(&out), vec!["01", "02", "03"]);
    }

    #[test]
    fn huge_skip_range_is_crossed_at_once() {
        let out = run(&options(".*", "{%d<1-300000000>}"), batch(&["a", "b"])).expect("replace");
        assert_eq!(targets(&out), vec!["300000001", "300000002"]);
    }

    #[test]
    fn oversized_index_width_is_rejected() {
        let err = run(&options(".*", "{%200000000d}"), batch(&["a"])).expect_err("must fail");
        assert!(matches!(
            err,
            ReplaceError::InvalidNumber {
                field: "index width",
                ..
            }
        ));
    }

    #[test]
    fn captured_dates_are_reformatted() {
        let opts = options(r"^(\d{8})_(.*)", "{$1.dt.YYYY}-{$1.dt.MMM}-{$1.dt.DD}_$2");
        let out = run(&opts, batch(&["20240307_beach", "99999999_junk"])).expect("replace");
        assert_eq!(targets(&out), vec!["2024-Mar-07_beach", "--_junk"]);
    }

    #[test]
    fn chain_threads_output_into_next_link() {
        let opts = ReplaceOptions {
            chain: ReplacementChain {
                links: vec![
                    ChainLink {
                        find: "A".to_string(),
                        replace: "B".to_string(),
                    },
                    ChainLink {
                        find: "B".to_string(),
                        replace: "C".to_string(),
                    },
                ],
            },
            ..ReplaceOptions::default()
        };
        let out = run(&opts, batch(&["A.txt", "xyz"])).expect("replace");
        assert_eq!(targets(&out), vec!["C.txt", "xyz"]);
        assert_eq!(out[0].source, "A.txt", "intermediate name must not leak");
        assert_eq!(out[0].rel_target_path, Path::new("dir").join("C.txt"));
    }

    #[test]
    fn each_link_counts_from_scratch() {
        let opts = ReplaceOptions {
            chain: ReplacementChain::from_pairs(
                &[".*".to_string()],
                &["{%d}".to_string(), "n{f}-{%d}".to_string()],
            ),
            ..ReplaceOptions::default()
        };
        let out = run(&opts, batch(&["a", "b"])).expect("replace");
        assert_eq!(targets(&out), vec!["n1-1", "n2-2"]);
    }

    #[test]
    fn ignore_extension_reattaches_extension_once() {
        let mut opts = options(".*", "renamed");
        opts.ignore_extension = true;
        let mut changes = batch(&["photo.JPG", "archive.tar.gz", "noext"]);
        changes.push(FileChange::new("dir", "folder.v2", true));

        let out = run(&opts, changes).expect("replace");
        assert_eq!(
            targets(&out),
            vec!["renamed.JPG", "renamed.gz", "renamed", "renamed"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn targets_are_trimmed_and_cleaned() {
        let out = run(&options("x", " sub//./x "), batch(&["x"])).expect("replace");
        assert_eq!(out[0].target, "sub/x");
    }

    #[test]
    fn string_mode_and_ignore_case() {
        let mut opts = options("a.b", "-");
        opts.find.literal = true;
        let out = run(&opts, batch(&["a.b_axb"])).expect("replace");
        assert_eq!(targets(&out), vec!["-_axb"]);

        let mut opts = options("abc", "x");
        opts.find.ignore_case = true;
        let out = run(&opts, batch(&["ABC.txt"])).expect("replace");
        assert_eq!(targets(&out), vec!["x.txt"]);
    }

    #[test]
    fn empty_find_matches_whole_name() {
        let out = run(&options("", "new"), batch(&["old.txt"])).expect("replace");
        assert_eq!(targets(&out), vec!["new"]);
    }

    #[test]
    fn invalid_template_fails_whole_batch() {
        let err = run(&options(".*", "{%d0}"), batch(&["a", "b"])).expect_err("must fail");
        assert!(matches!(err, ReplaceError::InvalidStep(_)));
    }

    #[test]
    fn invalid_find_pattern_is_reported() {
        let err = run(&options("(", "x"), batch(&["a"])).expect_err("must fail");
        assert!(matches!(err, ReplaceError::InvalidPattern(_)));
    }

    #[test]
    fn index_numbering_puts_parents_before_children() {
        let changes = vec![
            FileChange::new(Path::new("root").join("sub"), "child", false),
            FileChange::new("root", "sub", true),
        ];
        let out = run(&options(".*", "{%d}"), changes).expect("replace");
        assert_eq!(out[0].source, "sub");
        assert_eq!(out[0].target, "1");
        assert_eq!(out[1].source, "child");
        assert_eq!(out[1].target, "2");
    }

    #[test]
    fn sort_runs_before_numbering() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        fs::write(root.join("a.bin"), vec![0u8; 50]).expect("write a");
        fs::write(root.join("b.bin"), vec![0u8; 5]).expect("write b");

        let mut opts = options(".*", "{%d}");
        opts.ignore_extension = true;
        opts.sort = Some(SortCriterion::Size);
        let changes = vec![
            FileChange::new(root, "a.bin", false),
            FileChange::new(root, "b.bin", false),
        ];

        let out = run(&opts, changes).expect("replace");
        assert_eq!(out[0].source, "b.bin");
        assert_eq!(out[0].target, "1.bin");
        assert_eq!(out[1].target, "2.bin");
    }

    #[test]
    fn sort_failure_aborts() {
        let temp = tempdir().expect("tempdir");
        let mut opts = options(".*", "x");
        opts.sort = Some(SortCriterion::Mtime);
        let err = run(&opts, vec![FileChange::new(temp.path(), "absent", false)])
            .expect_err("must fail");
        assert!(matches!(err, ReplaceError::Sort(_)));
    }

    #[test]
    fn metadata_variables_read_from_disk() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        fs::write(root.join("notes.txt"), b"abc").expect("write");

        let mut opts = options(".*", "{hash.sha256}");
        opts.ignore_extension = true;
        let out = run(&opts, vec![FileChange::new(root, "notes.txt", false)]).expect("replace");
        assert_eq!(
            out[0].target,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad.txt"
        );
    }
}
