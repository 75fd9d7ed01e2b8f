mod change;
mod config;
mod csv_rows;
mod error;
mod exif_reader;
mod exiftool_reader;
mod hashing;
mod id3_reader;
mod index;
mod metadata;
mod pathutil;
mod provider;
mod regex_replace;
mod replace;
mod scan;
mod sortfiles;
mod substitute;
mod transform;
mod variables;

pub use change::{ChainLink, FileChange, FindOptions, ReplaceOptions, ReplacementChain, Status};
pub use config::{
    app_paths, load_config, load_config_from, save_config, save_config_to, AppConfig, AppPaths,
};
pub use csv_rows::load_csv_rows;
pub use error::{ReplaceError, Result};
pub use hashing::HashAlgorithm;
pub use index::{IndexState, IndexVariable, NumberSystem, SkipRange};
pub use metadata::{
    parse_name_date, DateToken, ExifAttr, ExifData, FileTimes, Id3Data, Id3Tag, TimeAttr,
};
pub use pathutil::{clean_path, split_extension};
pub use provider::{MetadataProvider, SystemProvider};
pub use regex_replace::regex_replace;
pub use replace::{compile_search, replace};
pub use scan::{collect_changes, ScanOptions};
pub use sortfiles::{enforce_hierarchical_order, natural_cmp, sort_changes, SortCriterion};
pub use substitute::{substitute, FileContext};
pub use transform::Transform;
pub use variables::{extract_variables, protect_tokens, CaptureFormat, VariableKind, Variables};
