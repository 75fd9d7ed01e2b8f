//! Recognizers for the variables embedded in a replacement template.
//!
//! Every variable kind has one fixed pattern with a known number of capture
//! groups. The surface syntaxes never overlap, so the kinds can be extracted
//! independently and resolved in any order.

use crate::error::{ReplaceError, Result};
use crate::hashing::HashAlgorithm;
use crate::index::{IndexVariable, NumberSystem, SkipRange, MAX_INDEX_WIDTH};
use crate::metadata::{DateToken, ExifAttr, Id3Tag, TimeAttr};
use crate::transform::Transform;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

const TRANSFORM: &str = r"(?:\.(up|lw|ti|win|mac))?";
const DATE_TOKEN: &str = r"(YYYY|YY|MMMM|MMM|MM|M|DDDD|DDD|DD|D|hh|h|H|mm|m|ss|s|A|a|unix)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    Filename,
    Extension,
    ParentDir,
    Exif,
    Index,
    Id3,
    Hash,
    Date,
    ExifTool,
    Transform,
    Csv,
}

impl VariableKind {
    pub const ALL: [VariableKind; 11] = [
        Self::Filename,
        Self::Extension,
        Self::ParentDir,
        Self::Exif,
        Self::Index,
        Self::Id3,
        Self::Hash,
        Self::Date,
        Self::ExifTool,
        Self::Transform,
        Self::Csv,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::Filename => "filename",
            Self::Extension => "extension",
            Self::ParentDir => "parent directory",
            Self::Exif => "exif",
            Self::Index => "index",
            Self::Id3 => "id3",
            Self::Hash => "hash",
            Self::Date => "date",
            Self::ExifTool => "exiftool",
            Self::Transform => "transform",
            Self::Csv => "csv",
        }
    }

    fn grammar(self) -> &'static Grammar {
        match self {
            Self::Filename => &FILENAME,
            Self::Extension => &EXTENSION,
            Self::ParentDir => &PARENT_DIR,
            Self::Exif => &EXIF,
            Self::Index => &INDEX,
            Self::Id3 => &ID3,
            Self::Hash => &HASH,
            Self::Date => &DATE,
            Self::ExifTool => &EXIFTOOL,
            Self::Transform => &TRANSFORM_VAR,
            Self::Csv => &CSV,
        }
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

struct Grammar {
    regex: Regex,
    groups: usize,
}

impl Grammar {
    fn new(pattern: &str, groups: usize) -> Self {
        Self {
            regex: Regex::new(pattern).expect("variable grammar must be a valid regex"),
            groups,
        }
    }
}

static FILENAME: Lazy<Grammar> =
    Lazy::new(|| Grammar::new(&format!(r"\{{f{TRANSFORM}\}}"), 2));
static EXTENSION: Lazy<Grammar> =
    Lazy::new(|| Grammar::new(&format!(r"\{{ext{TRANSFORM}\}}"), 2));
static PARENT_DIR: Lazy<Grammar> =
    Lazy::new(|| Grammar::new(&format!(r"\{{(\d+)?p{TRANSFORM}\}}"), 3));
static EXIF: Lazy<Grammar> = Lazy::new(|| {
    Grammar::new(
        &format!(
            r"\{{(?:exif|x)\.(?:(iso|et|fl35|fl|fnum|wh|w|h|make|model|lens|soft|lat|lon)|(cdt)\.{DATE_TOKEN}){TRANSFORM}\}}"
        ),
        5,
    )
});
static INDEX: Lazy<Grammar> = Lazy::new(|| {
    Grammar::new(
        r"\{(\$\d+)?(\d+)?(%(\d*)d)([borh])?(\d+)?(?:<(\d+(?:-\d+)?(?:;\s*\d+(?:-\d+)?)*)>)?\}",
        8,
    )
});
static ID3: Lazy<Grammar> = Lazy::new(|| {
    Grammar::new(
        &format!(
            r"\{{id3\.(title|artist|album_artist|album|genre|year|total_tracks|track|total_discs|disc){TRANSFORM}\}}"
        ),
        3,
    )
});
static HASH: Lazy<Grammar> = Lazy::new(|| {
    Grammar::new(
        &format!(r"\{{hash\.(sha224|sha256|sha384|sha512|blake3){TRANSFORM}\}}"),
        3,
    )
});
static DATE: Lazy<Grammar> = Lazy::new(|| {
    Grammar::new(
        &format!(r"\{{(mtime|btime|atime|ctime|now)\.{DATE_TOKEN}{TRANSFORM}\}}"),
        4,
    )
});
static EXIFTOOL: Lazy<Grammar> =
    Lazy::new(|| Grammar::new(&format!(r"\{{xt\.([0-9A-Za-z_]+){TRANSFORM}\}}"), 3));
static TRANSFORM_VAR: Lazy<Grammar> = Lazy::new(|| {
    Grammar::new(
        &format!(r"\{{(\$\d+)?\.(?:(up|lw|ti|win|mac)|dt\.{DATE_TOKEN})\}}"),
        4,
    )
});
static CSV: Lazy<Grammar> =
    Lazy::new(|| Grammar::new(&format!(r"\{{csv\.(\d+){TRANSFORM}\}}"), 3));

/// The verbatim text of one variable occurrence and a pattern that finds it
/// again in a working name.
#[derive(Debug, Clone)]
pub struct Token {
    pub text: String,
    pub locator: Regex,
}

impl Token {
    pub fn new(text: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            text: text.to_string(),
            locator: Regex::new(&regex::escape(text))?,
        })
    }
}

/// One raw match of a variable grammar. Unmatched optional groups are empty.
#[derive(Debug, Clone)]
pub struct TokenMatch {
    pub token: Token,
    pub groups: Vec<String>,
}

impl TokenMatch {
    fn group(&self, i: usize) -> &str {
        self.groups.get(i).map(String::as_str).unwrap_or_default()
    }

    fn transform(&self, i: usize) -> Option<Transform> {
        Transform::from_token(self.group(i))
    }
}

/// Finds every occurrence of `kind` in `template`, in order of appearance.
pub fn extract(kind: VariableKind, template: &str) -> Result<Vec<TokenMatch>> {
    let grammar = kind.grammar();
    let mut matches = Vec::new();

    for caps in grammar.regex.captures_iter(template) {
        if caps.len() < grammar.groups {
            return Err(ReplaceError::InvalidSubmatches(kind));
        }
        let groups: Vec<String> = caps
            .iter()
            .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
            .collect();
        matches.push(TokenMatch {
            token: Token::new(&groups[0])?,
            groups,
        });
    }

    Ok(matches)
}

#[derive(Debug, Clone)]
pub struct FilenameVariable {
    pub token: Token,
    pub transform: Option<Transform>,
}

#[derive(Debug, Clone)]
pub struct ExtensionVariable {
    pub token: Token,
    pub transform: Option<Transform>,
}

#[derive(Debug, Clone)]
pub struct ParentDirVariable {
    pub token: Token,
    pub levels: usize,
    pub transform: Option<Transform>,
}

#[derive(Debug, Clone)]
pub struct ExifVariable {
    pub token: Token,
    pub attr: ExifAttr,
    pub date_token: Option<DateToken>,
    pub transform: Option<Transform>,
}

#[derive(Debug, Clone)]
pub struct Id3Variable {
    pub token: Token,
    pub tag: Id3Tag,
    pub transform: Option<Transform>,
}

#[derive(Debug, Clone)]
pub struct HashVariable {
    pub token: Token,
    pub algorithm: HashAlgorithm,
    pub transform: Option<Transform>,
}

#[derive(Debug, Clone)]
pub struct DateVariable {
    pub token: Token,
    pub attr: TimeAttr,
    pub date_token: DateToken,
    pub transform: Option<Transform>,
}

#[derive(Debug, Clone)]
pub struct ExifToolVariable {
    pub token: Token,
    pub tag: String,
    pub transform: Option<Transform>,
}

/// How a transform variable rewrites the captured text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureFormat {
    Text(Transform),
    /// Reads the capture as a date and prints one part of it.
    Date(DateToken),
}

/// `{.up}` transforms the whole find match, `{$2.lw}` one capture group and
/// `{$1.dt.YYYY}` reformats a date captured from the name.
#[derive(Debug, Clone)]
pub struct TransformVariable {
    pub token: Token,
    pub capture: Option<usize>,
    pub format: CaptureFormat,
}

#[derive(Debug, Clone)]
pub struct CsvVariable {
    pub token: Token,
    /// 1-based column.
    pub column: usize,
    pub transform: Option<Transform>,
}

/// All variables of one replacement template, grouped by kind.
#[derive(Debug, Clone, Default)]
pub struct Variables {
    pub filename: Vec<FilenameVariable>,
    pub extension: Vec<ExtensionVariable>,
    pub parent_dir: Vec<ParentDirVariable>,
    pub exif: Vec<ExifVariable>,
    pub index: Vec<IndexVariable>,
    pub id3: Vec<Id3Variable>,
    pub hash: Vec<HashVariable>,
    pub date: Vec<DateVariable>,
    pub exiftool: Vec<ExifToolVariable>,
    pub transform: Vec<TransformVariable>,
    pub csv: Vec<CsvVariable>,
}

impl Variables {
    pub fn has_index(&self) -> bool {
        !self.index.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.filename.is_empty()
            && self.extension.is_empty()
            && self.parent_dir.is_empty()
            && self.exif.is_empty()
            && self.index.is_empty()
            && self.id3.is_empty()
            && self.hash.is_empty()
            && self.date.is_empty()
            && self.exiftool.is_empty()
            && self.transform.is_empty()
            && self.csv.is_empty()
    }

    pub fn tokens(&self) -> Vec<&Token> {
        let mut tokens = Vec::new();
        tokens.extend(self.filename.iter().map(|v| &v.token));
        tokens.extend(self.extension.iter().map(|v| &v.token));
        tokens.extend(self.parent_dir.iter().map(|v| &v.token));
        tokens.extend(self.exif.iter().map(|v| &v.token));
        tokens.extend(self.index.iter().map(|v| &v.token));
        tokens.extend(self.id3.iter().map(|v| &v.token));
        tokens.extend(self.hash.iter().map(|v| &v.token));
        tokens.extend(self.date.iter().map(|v| &v.token));
        tokens.extend(self.exiftool.iter().map(|v| &v.token));
        tokens.extend(self.transform.iter().map(|v| &v.token));
        tokens.extend(self.csv.iter().map(|v| &v.token));
        tokens
    }
}

/// Runs every recognizer over `template`. Kinds that do not occur produce
/// empty collections.
pub fn extract_variables(template: &str) -> Result<Variables> {
    let mut vars = Variables::default();

    for kind in VariableKind::ALL {
        let matches = extract(kind, template)?;
        for m in matches {
            match kind {
                VariableKind::Filename => vars.filename.push(FilenameVariable {
                    transform: m.transform(1),
                    token: m.token,
                }),
                VariableKind::Extension => vars.extension.push(ExtensionVariable {
                    transform: m.transform(1),
                    token: m.token,
                }),
                VariableKind::ParentDir => vars.parent_dir.push(ParentDirVariable {
                    levels: parse_or(m.group(1), "parent directory level", 1)?,
                    transform: m.transform(2),
                    token: m.token,
                }),
                VariableKind::Exif => vars.exif.push(parse_exif(m)?),
                VariableKind::Index => vars.index.push(parse_index(m)?),
                VariableKind::Id3 => vars.id3.push(Id3Variable {
                    tag: Id3Tag::from_token(m.group(1)).ok_or(ReplaceError::InvalidSubmatches(kind))?,
                    transform: m.transform(2),
                    token: m.token,
                }),
                VariableKind::Hash => vars.hash.push(HashVariable {
                    algorithm: HashAlgorithm::from_token(m.group(1))
                        .ok_or(ReplaceError::InvalidSubmatches(kind))?,
                    transform: m.transform(2),
                    token: m.token,
                }),
                VariableKind::Date => vars.date.push(DateVariable {
                    attr: TimeAttr::from_token(m.group(1))
                        .ok_or(ReplaceError::InvalidSubmatches(kind))?,
                    date_token: DateToken::from_token(m.group(2))
                        .ok_or(ReplaceError::InvalidSubmatches(kind))?,
                    transform: m.transform(3),
                    token: m.token,
                }),
                VariableKind::ExifTool => vars.exiftool.push(ExifToolVariable {
                    tag: m.group(1).to_string(),
                    transform: m.transform(2),
                    token: m.token,
                }),
                VariableKind::Transform => vars.transform.push(parse_capture_transform(m)?),
                VariableKind::Csv => vars.csv.push(CsvVariable {
                    column: parse_number(m.group(1), "csv column")?,
                    transform: m.transform(2),
                    token: m.token,
                }),
            }
        }
    }

    Ok(vars)
}

/// Doubles every `$` inside recognized variables so that capture expansion
/// during regex replacement leaves the variable text intact.
pub fn protect_tokens(template: &str, vars: &Variables) -> String {
    let mut seen = HashSet::new();
    let mut protected = template.to_string();
    for token in vars.tokens() {
        if token.text.contains('$') && seen.insert(token.text.as_str()) {
            protected = protected.replace(&token.text, &token.text.replace('$', "$$"));
        }
    }
    protected
}

fn parse_exif(m: TokenMatch) -> Result<ExifVariable> {
    let invalid = || ReplaceError::InvalidSubmatches(VariableKind::Exif);
    let (attr, date_token) = if m.group(2).is_empty() {
        (ExifAttr::from_token(m.group(1)).ok_or_else(invalid)?, None)
    } else {
        (
            ExifAttr::from_token(m.group(2)).ok_or_else(invalid)?,
            Some(DateToken::from_token(m.group(3)).ok_or_else(invalid)?),
        )
    };

    Ok(ExifVariable {
        attr,
        date_token,
        transform: m.transform(4),
        token: m.token,
    })
}

fn parse_capture_transform(m: TokenMatch) -> Result<TransformVariable> {
    let invalid = || ReplaceError::InvalidSubmatches(VariableKind::Transform);
    let format = match m.transform(2) {
        Some(transform) => CaptureFormat::Text(transform),
        None => CaptureFormat::Date(DateToken::from_token(m.group(3)).ok_or_else(invalid)?),
    };

    Ok(TransformVariable {
        capture: parse_capture(m.group(1))?,
        format,
        token: m.token,
    })
}

fn parse_index(m: TokenMatch) -> Result<IndexVariable> {
    let step: i64 = parse_or(m.group(6), "index step", 1)?;
    if step <= 0 {
        return Err(ReplaceError::InvalidStep(m.token.text));
    }

    let width: usize = parse_or(m.group(4), "index width", 0)?;
    if width > MAX_INDEX_WIDTH {
        return Err(ReplaceError::invalid_number("index width", m.group(4)));
    }

    Ok(IndexVariable {
        capture: parse_capture(m.group(1))?,
        start: parse_or(m.group(2), "index start", 1)?,
        step,
        width,
        system: NumberSystem::from_token(m.group(5))
            .ok_or(ReplaceError::InvalidSubmatches(VariableKind::Index))?,
        skip: parse_skip(m.group(7))?,
        token: m.token,
    })
}

fn parse_skip(raw: &str) -> Result<Vec<SkipRange>> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    raw.split(';')
        .map(|part| match part.split_once('-') {
            Some((a, b)) => Ok(SkipRange::new(
                parse_number(a, "skip range")?,
                parse_number(b, "skip range")?,
            )),
            None => {
                let n = parse_number(part, "skip number")?;
                Ok(SkipRange::new(n, n))
            }
        })
        .collect()
}

fn parse_capture(raw: &str) -> Result<Option<usize>> {
    match raw.strip_prefix('$') {
        Some(n) => parse_number(n, "capture group").map(Some),
        None => Ok(None),
    }
}

fn parse_number<T: FromStr>(raw: &str, field: &'static str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| ReplaceError::invalid_number(field, raw))
}

fn parse_or<T: FromStr>(raw: &str, field: &'static str, default: T) -> Result<T> {
    if raw.is_empty() {
        Ok(default)
    } else {
        parse_number(raw, field)
    }
}
