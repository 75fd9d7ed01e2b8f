use anyhow::{anyhow, Context, Result};
use exiftool::ExifTool;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// A single `exiftool` process shared by every lookup of a batch.
///
/// The process is started on first use, so batches without `{xt.*}`
/// variables never need exiftool installed.
#[derive(Default)]
pub struct ExifToolSession {
    tool: Mutex<Option<ExifTool>>,
}

impl ExifToolSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every tag of `path` as tag → text pairs. Nested values are kept
    /// as compact JSON.
    pub fn read_tags(&self, path: &Path) -> Result<HashMap<String, String>> {
        let mut guard = self
            .tool
            .lock()
            .map_err(|_| anyhow!("exiftool session lock poisoned"))?;
        if guard.is_none() {
            *guard = Some(ExifTool::new().context("could not start exiftool")?);
        }
        let tool = guard
            .as_mut()
            .context("exiftool session is not running")?;

        let json = tool
            .json(path, &[])
            .with_context(|| format!("exiftool could not read {}", path.display()))?;
        Ok(flatten_tags(json))
    }
}

/// Accepts either the object for one file or exiftool's array of objects,
/// in which case the first entry is used.
fn flatten_tags(json: Value) -> HashMap<String, String> {
    let entry = match json {
        Value::Array(entries) => entries.into_iter().next(),
        other => Some(other),
    };

    match entry {
        Some(Value::Object(map)) => map
            .into_iter()
            .map(|(tag, value)| (tag, value_to_text(value)))
            .collect(),
        _ => HashMap::new(),
    }
}

fn value_to_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_single_object_into_text_values() {
        let tags = flatten_tags(json!({
            "SourceFile": "a.jpg",
            "ImageWidth": 6000,
            "Artist": "Jane Doe",
            "Flash": null,
            "Keywords": ["x", "y"]
        }));
        assert_eq!(tags.get("ImageWidth").map(String::as_str), Some("6000"));
        assert_eq!(tags.get("Artist").map(String::as_str), Some("Jane Doe"));
        assert_eq!(tags.get("Flash").map(String::as_str), Some(""));
        assert_eq!(tags.get("Keywords").map(String::as_str), Some(r#"["x","y"]"#));
    }

    #[test]
    fn takes_first_entry_of_an_array() {
        let tags = flatten_tags(json!([{ "Make": "FUJIFILM" }, { "Make": "other" }]));
        assert_eq!(tags.get("Make").map(String::as_str), Some("FUJIFILM"));
    }

    #[test]
    fn empty_or_scalar_output_yields_no_tags() {
        assert!(flatten_tags(json!([])).is_empty());
        assert!(flatten_tags(json!("unexpected")).is_empty());
    }

    #[test]
    fn session_starts_lazily() {
        let session = ExifToolSession::new();
        let guard = session.tool.lock().expect("lock");
        assert!(guard.is_none());
    }
}
