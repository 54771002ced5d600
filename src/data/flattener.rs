// ============================================================
// Layer 4 — Dataset Flattener
// ============================================================
// Turns the nested image → [captions] mapping into a table
// with one row per caption.
//
//   { "a.jpg": ["<s> x  <e>", "<s> y  <e>"], "b.jpg": [] }
//        │
//        ▼
//   images   = ["a.jpg", "a.jpg"]
//   captions = ["x",     "y"    ]
//
// Row order: images in map order, captions in list order.
// Empty lists produce no rows. Duplicates are kept.
// Non-string captions are carried through unchanged.

use crate::data::preprocessor::CaptionCleaner;
use crate::domain::caption::{Caption, CaptionMap, CaptionRecord, CaptionTable};

pub struct Flattener {
    cleaner: CaptionCleaner,
}

impl Flattener {
    pub fn new(cleaner: CaptionCleaner) -> Self {
        Self { cleaner }
    }

    /// Flatten `map` into a CaptionTable. Pure; never fails.
    pub fn flatten(&self, map: &CaptionMap) -> CaptionTable {
        let table: CaptionTable = map
            .iter()
            .flat_map(|(image_id, captions)| {
                captions
                    .iter()
                    .map(move |caption| CaptionRecord::new(image_id, self.clean(caption)))
            })
            .collect();

        tracing::info!("Flattened {} images into {} caption rows", map.len(), table.len());
        table
    }

    fn clean(&self, caption: &Caption) -> Caption {
        match caption {
            Caption::Text(raw) => Caption::Text(self.cleaner.clean(raw)),
            other => other.clone(),
        }
    }
}

impl Default for Flattener {
    fn default() -> Self {
        Self::new(CaptionCleaner::new())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::parse_caption_map;

    fn flatten(json: &str) -> CaptionTable {
        Flattener::default().flatten(&parse_caption_map(json).unwrap())
    }

    #[test]
    fn test_columns_have_equal_length() {
        let table = flatten(r#"{"a": ["1", "2"], "b": ["3"], "c": []}"#);
        assert_eq!(table.images().len(), table.captions().len());
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_markers_removed() {
        let table = flatten(r#"{"a": ["<s> a cat  <e>"]}"#);
        assert_eq!(table.captions()[0].as_text(), Some("a cat"));
    }

    #[test]
    fn test_empty_list_contributes_no_rows() {
        let table = flatten(r#"{"empty": [], "full": ["x", "y", "z"]}"#);
        assert_eq!(table.len(), 3);
        assert!(table.images().iter().all(|id| id == "full"));
    }

    #[test]
    fn test_row_order_follows_keys_then_list() {
        let table = flatten(r#"{"z": ["z1", "z2"], "a": ["a1"]}"#);
        let rows: Vec<(&str, Option<&str>)> =
            table.images().iter().map(String::as_str)
                .zip(table.captions().iter().map(Caption::as_text))
                .collect();
        assert_eq!(
            rows,
            vec![("z", Some("z1")), ("z", Some("z2")), ("a", Some("a1"))]
        );
    }

    #[test]
    fn test_duplicates_across_images_kept() {
        let table = flatten(r#"{"a": ["same"], "b": ["same"]}"#);
        assert_eq!(table.len(), 2);
        assert_eq!(table.captions()[0], table.captions()[1]);
    }

    #[test]
    fn test_non_string_passes_through() {
        let table = flatten(r#"{"a": ["<s> ok  <e>", 5]}"#);
        assert_eq!(table.captions()[0].as_text(), Some("ok"));
        assert_eq!(table.captions()[1], Caption::Other(serde_json::json!(5)));
    }
}
