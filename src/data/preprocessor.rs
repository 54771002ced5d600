// ============================================================
// Layer 4 — Caption Cleaner
// ============================================================
// Raw captions carry literal boundary markers:
//
//   "<s> a dog runs on the beach  <e>"
//
// Cleaning steps (applied in order):
//   1. Remove every occurrence of the start marker "<s> "
//   2. Remove every occurrence of the end marker "  <e>"
//   3. Trim leading/trailing whitespace
//
// A caption without markers only goes through step 3.
//
// Reference: Rust Book §8 (Strings in Rust)

/// Start-of-caption marker, including its trailing space
pub const START_MARKER: &str = "<s> ";

/// End-of-caption marker, including its two leading spaces
pub const END_MARKER: &str = "  <e>";

#[derive(Debug, Clone)]
pub struct CaptionCleaner {
    start_marker: String,
    end_marker:   String,
}

impl CaptionCleaner {
    /// Create a cleaner for the dataset's standard markers
    pub fn new() -> Self {
        Self::with_markers(START_MARKER, END_MARKER)
    }

    pub fn with_markers(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start_marker: start.into(),
            end_marker:   end.into(),
        }
    }

    /// Strip markers and surrounding whitespace from one caption.
    pub fn clean(&self, raw: &str) -> String {
        raw.replace(&self.start_marker, "")
            .replace(&self.end_marker, "")
            .trim()
            .to_string()
    }
}

impl Default for CaptionCleaner {
    fn default() -> Self {
        Self::new()
    }
}
