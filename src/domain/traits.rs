// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer talks to these traits rather than to
// the JSON loader or the file-backed corpus writer directly.
//
//   - JsonCaptionLoader implements CaptionSource
//   - CorpusWriter      implements CorpusSink
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::caption::{Caption, CaptionMap};

// ─── CaptionSource ────────────────────────────────────────────────────────────
/// Any component that can produce the raw image → captions mapping.
pub trait CaptionSource {
    /// Load the whole mapping. Malformed input is an error.
    fn load(&self) -> Result<CaptionMap>;
}

// ─── CorpusSink ───────────────────────────────────────────────────────────────
/// Any component that persists captions as numbered corpus entries.
pub trait CorpusSink {
    /// Write `captions` starting at index `prefix`.
    /// Returns the next free index (`prefix + captions.len()`).
    fn write_all(&self, captions: &[Caption], prefix: usize) -> Result<usize>;
}
