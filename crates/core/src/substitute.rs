use crate::error::{ReplaceError, Result};
use crate::hashing::HashAlgorithm;
use crate::index::IndexState;
use crate::metadata::{parse_name_date, ExifData, FileTimes, Id3Data, TimeAttr};
use crate::pathutil::split_extension;
use crate::provider::MetadataProvider;
use crate::transform::apply_optional;
use crate::variables::{CaptureFormat, Token, Variables};
use chrono::{DateTime, Local};
use regex::{NoExpand, Regex};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Everything the substituter knows about the file being renamed.
#[derive(Debug, Clone, Copy)]
pub struct FileContext<'a> {
    /// Name fed into the current chain link.
    pub input_name: &'a str,
    /// The part of `input_name` the find pattern was applied to.
    pub match_name: &'a str,
    /// Location of the file on disk, used for metadata lookups.
    pub disk_path: &'a Path,
    pub is_dir: bool,
    pub search: &'a Regex,
    pub now: DateTime<Local>,
}

/// Metadata of one file, fetched on first use.
struct FileLookups<'a> {
    provider: &'a dyn MetadataProvider,
    path: &'a Path,
    times: Option<FileTimes>,
    exif: Option<ExifData>,
    exiftool: Option<HashMap<String, String>>,
    id3: Option<Id3Data>,
    hashes: HashMap<HashAlgorithm, String>,
}

impl<'a> FileLookups<'a> {
    fn new(provider: &'a dyn MetadataProvider, path: &'a Path) -> Self {
        Self {
            provider,
            path,
            times: None,
            exif: None,
            exiftool: None,
            id3: None,
            hashes: HashMap::new(),
        }
    }

    fn fail(&self, err: anyhow::Error) -> ReplaceError {
        ReplaceError::provider(self.path, err)
    }

    fn times(&mut self) -> Result<&FileTimes> {
        let times = match self.times.take() {
            Some(t) => t,
            None => self.provider.file_times(self.path).map_err(|e| self.fail(e))?,
        };
        Ok(self.times.insert(times))
    }

    fn exif(&mut self) -> Result<&ExifData> {
        let exif = match self.exif.take() {
            Some(e) => e,
            None => self.provider.exif(self.path).map_err(|e| self.fail(e))?,
        };
        Ok(self.exif.insert(exif))
    }

    fn exiftool(&mut self) -> Result<&HashMap<String, String>> {
        let tags = match self.exiftool.take() {
            Some(t) => t,
            None => self.provider.exiftool(self.path).map_err(|e| self.fail(e))?,
        };
        Ok(self.exiftool.insert(tags))
    }

    fn id3(&mut self) -> Result<&Id3Data> {
        let id3 = match self.id3.take() {
            Some(d) => d,
            None => self.provider.id3(self.path).map_err(|e| self.fail(e))?,
        };
        Ok(self.id3.insert(id3))
    }

    fn hash(&mut self, algorithm: HashAlgorithm) -> Result<String> {
        if let Some(digest) = self.hashes.get(&algorithm) {
            return Ok(digest.clone());
        }
        let digest = self
            .provider
            .hash(self.path, algorithm)
            .map_err(|e| self.fail(e))?;
        self.hashes.insert(algorithm, digest.clone());
        Ok(digest)
    }
}

/// Resolves every variable of `vars` for one file and replaces each
/// occurrence of its text in `working`.
pub fn substitute(
    working: String,
    vars: &Variables,
    ctx: &FileContext<'_>,
    index: &mut IndexState,
    provider: &dyn MetadataProvider,
) -> Result<String> {
    if vars.is_empty() {
        return Ok(working);
    }

    let mut out = working;
    let mut lookups = FileLookups::new(provider, ctx.disk_path);
    let file_name = last_component(ctx.input_name);

    for var in &vars.filename {
        let stem = if ctx.is_dir {
            file_name
        } else {
            split_extension(file_name).0
        };
        out = put(&out, &var.token, apply_optional(var.transform, stem.to_string()));
    }

    for var in &vars.extension {
        let ext = if ctx.is_dir {
            ""
        } else {
            split_extension(file_name).1
        };
        out = put(&out, &var.token, apply_optional(var.transform, ext.to_string()));
    }

    for var in &vars.parent_dir {
        let parent = parent_dir_name(ctx.disk_path, var.levels);
        out = put(&out, &var.token, apply_optional(var.transform, parent));
    }

    for (slot, var) in vars.index.iter().enumerate() {
        let scope = var.capture.map(|group| capture_text(ctx, group));
        let value = index.next_value(slot, var, scope.as_deref());
        out = put(&out, &var.token, var.render(value));
    }

    for var in &vars.transform {
        let text = capture_text(ctx, var.capture.unwrap_or(0));
        let value = match var.format {
            CaptureFormat::Text(transform) => transform.apply(&text),
            CaptureFormat::Date(token) => parse_name_date(&text)
                .map(|date| token.format(&date))
                .unwrap_or_default(),
        };
        out = put(&out, &var.token, value);
    }

    for var in &vars.date {
        let date = match var.attr {
            TimeAttr::Now => ctx.now,
            attr => lookups.times()?.get(attr, ctx.now),
        };
        out = put(&out, &var.token, apply_optional(var.transform, var.date_token.format(&date)));
    }

    for var in &vars.hash {
        let digest = lookups.hash(var.algorithm)?;
        out = put(&out, &var.token, apply_optional(var.transform, digest));
    }

    for var in &vars.exif {
        let value = lookups
            .exif()?
            .value(var.attr, var.date_token)
            .unwrap_or_default();
        out = put(&out, &var.token, apply_optional(var.transform, value));
    }

    for var in &vars.exiftool {
        let value = lookups.exiftool()?.get(&var.tag).cloned().unwrap_or_default();
        out = put(&out, &var.token, apply_optional(var.transform, value));
    }

    for var in &vars.id3 {
        let value = lookups.id3()?.value(var.tag).unwrap_or_default().to_string();
        out = put(&out, &var.token, apply_optional(var.transform, value));
    }

    for var in &vars.csv {
        let value = provider.csv(ctx.disk_path, var.column).unwrap_or_default();
        out = put(&out, &var.token, apply_optional(var.transform, value));
    }

    Ok(out)
}

fn put(working: &str, token: &Token, value: String) -> String {
    token
        .locator
        .replace_all(working, NoExpand(&value))
        .into_owned()
}

/// Text of a capture group in the first match of the find pattern, or empty.
fn capture_text(ctx: &FileContext<'_>, group: usize) -> String {
    ctx.search
        .captures(ctx.match_name)
        .and_then(|caps| caps.get(group))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

fn last_component(name: &str) -> &str {
    name.rsplit(std::path::is_separator).next().unwrap_or(name)
}

fn parent_dir_name(path: &Path, levels: usize) -> String {
    let lookup = |p: &Path| {
        p.ancestors()
            .nth(levels)
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
    };
    lookup(path)
        .or_else(|| fs::canonicalize(path).ok().and_then(|abs| lookup(abs.as_path())))
        .unwrap_or_default()
}
