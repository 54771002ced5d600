// ============================================================
// Layer 4 — Caption Loader
// ============================================================
// Loads the captioning dataset from a single JSON document:
//
//   {
//     "img_001.jpg": ["<s> a dog runs on the beach  <e>", ...],
//     "img_002.jpg": [],
//     ...
//   }
//
// serde_json is built with `preserve_order`, so the object's
// keys come back in document order. That order becomes the row
// order of the flattened table.
//
// Any failure here is fatal: nothing is processed until the
// whole document has been parsed and shape-checked.
//
// Reference: serde_json documentation
//            Rust Book §9 (Error Handling)

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::{fs, path::PathBuf};

use crate::domain::caption::{Caption, CaptionMap};
use crate::domain::traits::CaptionSource;

/// Loads the image → captions mapping from a JSON file.
/// Implements the CaptionSource trait from Layer 3.
pub struct JsonCaptionLoader {
    /// Path to the JSON document
    path: PathBuf,
}

impl JsonCaptionLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CaptionSource for JsonCaptionLoader {
    fn load(&self) -> Result<CaptionMap> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read caption file '{}'", self.path.display()))?;

        let map = parse_caption_map(&text)
            .with_context(|| format!("Malformed caption file '{}'", self.path.display()))?;

        if map.is_empty() {
            tracing::warn!("Caption file '{}' contains no images", self.path.display());
        }

        tracing::info!(
            "Loaded {} images with {} captions from '{}'",
            map.len(),
            map.caption_count(),
            self.path.display()
        );
        Ok(map)
    }
}

/// Parse a JSON document into a CaptionMap.
///
/// The top level must be an object and every value must be an
/// array. Array elements are not type-checked here: non-string
/// entries become `Caption::Other` and are dealt with per row
/// when the corpus is written.
pub fn parse_caption_map(text: &str) -> Result<CaptionMap> {
    let root: Value = serde_json::from_str(text)?;

    let Value::Object(object) = root else {
        bail!("top-level JSON value must be an object of image id → caption list");
    };

    let mut map = CaptionMap::new();
    for (image_id, value) in object {
        let items = match value {
            Value::Array(items) => items,
            other => bail!("captions for image '{image_id}' must be a list, found {other}"),
        };
        map.insert(image_id, items.into_iter().map(Caption::from).collect());
    }
    Ok(map)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_keeps_document_key_order() {
        let map = parse_caption_map(r#"{"zebra": ["a"], "apple": ["b"], "mango": []}"#)
            .unwrap();
        let ids: Vec<&str> = map.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn test_non_string_entries_are_kept() {
        let map = parse_caption_map(r#"{"img": ["ok", 42, null]}"#).unwrap();
        let (_, caps) = map.iter().next().unwrap();
        assert_eq!(caps.len(), 3);
        assert_eq!(caps[0].as_text(), Some("ok"));
        assert!(caps[1].as_text().is_none());
        assert!(caps[2].as_text().is_none());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(parse_caption_map(r#"{"img": ["unterminated"#).is_err());
    }

    #[test]
    fn test_wrong_shape_is_an_error() {
        assert!(parse_caption_map(r#"["not", "an", "object"]"#).is_err());
        assert!(parse_caption_map(r#"{"img": "not a list"}"#).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, r#"{{"a.jpg": ["<s> a cat  <e>"]}}"#).unwrap();

        let map = JsonCaptionLoader::new(&path).load().unwrap();
        assert_eq!(map.caption_count(), 1);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let loader = JsonCaptionLoader::new(dir.path().join("absent.json"));
        assert!(loader.load().is_err());
    }
}
