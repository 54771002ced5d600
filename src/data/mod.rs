// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from the raw JSON file to masked tensor batches.
//
//   data.json
//       │
//       ▼
//   JsonCaptionLoader → ordered image → [captions] map
//       │
//       ▼
//   Flattener         → one row per caption, markers stripped
//       │               (CaptionCleaner does the stripping)
//       ▼
//   CorpusWriter      → text_split/0.txt, 1.txt, ...
//       │
//       ▼
//   split_at_row      → train rows / evaluation rows
//       │
//       ▼
//   CaptionDataset    → tokenised samples (Burn Dataset)
//       │
//       ▼
//   MlmBatcher        → padded batches with dynamic masking
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Loads the image → captions JSON document
pub mod loader;

/// Strips caption boundary markers
pub mod preprocessor;

/// Flattens the mapping into a CaptionTable
pub mod flattener;

/// Writes one corpus file per caption
pub mod corpus;

/// Splits rows into train/evaluation sets by index
pub mod splitter;

/// Implements Burn's Dataset trait for tokenised captions
pub mod dataset;

/// MLM token selection and replacement
pub mod collator;

/// Implements Burn's Batcher trait for masked batches
pub mod batcher;
