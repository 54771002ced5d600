// ============================================================
// Layer 3 — Caption Domain Types
// ============================================================
// A captioning dataset maps each image to several captions.
// Flattened, it becomes a table with one row per caption:
//
//   image_id        caption
//   ─────────────   ───────────────────────────
//   "img_001.jpg"   "a dog runs on the beach"
//   "img_001.jpg"   "a brown dog near the sea"
//   "img_002.jpg"   "two people riding bikes"
//
// The table keeps two parallel columns (images, captions) so
// the corpus writer and the trainer can borrow just the column
// they need.
//
// Reference: Rust Book §5 (Structs), §6 (Enums)

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::HashMap, fmt};

/// One caption value as it appeared in the source list.
///
/// Caption lists are expected to hold strings, but a JSON array
/// can hold anything. Non-string entries are kept as `Other` so
/// the corpus writer can decide what to do with the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Caption {
    /// A caption string (already cleaned once it is in a table)
    Text(String),

    /// Any non-string JSON value found in a caption list
    Other(Value),
}

impl Caption {
    /// Returns the caption text, or None for non-string values
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Caption::Text(s) => Some(s),
            Caption::Other(_) => None,
        }
    }
}

impl From<Value> for Caption {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Caption::Text(s),
            other => Caption::Other(other),
        }
    }
}

impl From<&str> for Caption {
    fn from(s: &str) -> Self {
        Caption::Text(s.to_string())
    }
}

impl fmt::Display for Caption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Caption::Text(s) => f.write_str(s),
            Caption::Other(v) => write!(f, "{v}"),
        }
    }
}

/// Image identifier → raw caption list, in source key order.
///
/// Entries are kept in the order they were inserted, which for a
/// loaded file is the key order of the JSON document. Inserting an
/// image that is already present replaces its captions in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptionMap {
    entries:  Vec<(String, Vec<Caption>)>,
    /// image_id → position in `entries`
    position: HashMap<String, usize>,
}

impl CaptionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, image_id: impl Into<String>, captions: Vec<Caption>) {
        let image_id = image_id.into();
        match self.position.get(&image_id) {
            Some(&at) => self.entries[at].1 = captions,
            None => {
                self.position.insert(image_id.clone(), self.entries.len());
                self.entries.push((image_id, captions));
            }
        }
    }

    /// Iterate (image_id, captions) in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Caption])> {
        self.entries
            .iter()
            .map(|(id, caps)| (id.as_str(), caps.as_slice()))
    }

    /// Number of images
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of captions across all images
    pub fn caption_count(&self) -> usize {
        self.entries.iter().map(|(_, caps)| caps.len()).sum()
    }
}

/// A single (image, caption) row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionRecord {
    /// Identifier of the image this caption describes
    pub image_id: String,

    /// The cleaned caption
    pub caption: Caption,
}

impl CaptionRecord {
    pub fn new(image_id: impl Into<String>, caption: impl Into<Caption>) -> Self {
        Self {
            image_id: image_id.into(),
            caption:  caption.into(),
        }
    }
}

/// Ordered table of caption rows.
///
/// Invariant: `images().len() == captions().len()` and
/// `images()[i]` is the image that produced `captions()[i]`.
/// Both columns are only ever extended together through `push`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptionTable {
    images:   Vec<String>,
    captions: Vec<Caption>,
}

impl CaptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one row to both columns
    pub fn push(&mut self, record: CaptionRecord) {
        self.images.push(record.image_id);
        self.captions.push(record.caption);
    }

    /// The image identifier column
    pub fn images(&self) -> &[String] {
        &self.images
    }

    /// The caption column
    pub fn captions(&self) -> &[Caption] {
        &self.captions
    }

    pub fn len(&self) -> usize {
        self.captions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captions.is_empty()
    }
}

impl FromIterator<CaptionRecord> for CaptionTable {
    fn from_iter<I: IntoIterator<Item = CaptionRecord>>(iter: I) -> Self {
        let mut table = CaptionTable::new();
        for record in iter {
            table.push(record);
        }
        table
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_stay_parallel() {
        let table: CaptionTable = vec![
            CaptionRecord::new("a.jpg", "first"),
            CaptionRecord::new("a.jpg", "second"),
            CaptionRecord::new("b.jpg", "third"),
        ]
        .into_iter()
        .collect();

        assert_eq!(table.images().len(), table.captions().len());
        assert_eq!(table.images()[2], "b.jpg");
        assert_eq!(table.captions()[2], Caption::from("third"));
    }

    #[test]
    fn test_caption_from_json_value() {
        assert_eq!(Caption::from(Value::from("hi")).as_text(), Some("hi"));
        assert_eq!(Caption::from(Value::from(7)).as_text(), None);
        assert_eq!(Caption::from(Value::from(7)).to_string(), "7");
    }

    #[test]
    fn test_map_keeps_insertion_order_and_replaces_in_place() {
        let mut map = CaptionMap::new();
        map.insert("z.jpg", vec![Caption::from("one")]);
        map.insert("a.jpg", vec![]);
        map.insert("z.jpg", vec![Caption::from("two"), Caption::from("three")]);

        let ids: Vec<&str> = map.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["z.jpg", "a.jpg"]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.caption_count(), 2);

        let (_, z) = map.iter().next().unwrap();
        assert_eq!(z, &[Caption::from("two"), Caption::from("three")][..]);
    }

    #[test]
    fn test_map_with_many_images_keeps_order() {
        let mut map = CaptionMap::new();
        for i in 0..50_000 {
            map.insert(format!("COCO_train2014_{i:012}.jpg"), vec![Caption::from("c")]);
        }
        map.insert("COCO_train2014_000000000007.jpg", vec![]);

        assert_eq!(map.len(), 50_000);
        assert_eq!(map.caption_count(), 49_999);
        let (eighth, caps) = map.iter().nth(7).unwrap();
        assert_eq!(eighth, "COCO_train2014_000000000007.jpg");
        assert!(caps.is_empty());
    }

    #[test]
    fn test_new_table_is_empty() {
        let table = CaptionTable::new();
        assert!(table.is_empty());
        assert!(CaptionMap::new().is_empty());
    }
}
