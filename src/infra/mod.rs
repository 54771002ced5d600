// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Persistence used by the training workflow:
//
//   checkpoint.rs      — Model directory management.
//                        Saves the run config as JSON, step
//                        checkpoints (pruned to a limit) and
//                        the final model via Burn's
//                        CompactRecorder.
//
//   tokenizer_store.rs — Byte-level BPE tokenizer training
//                        over the caption corpus, plus
//                        loading and copying the saved file.
//
//   metrics.rs         — Epoch metrics appended to a CSV.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model directory: config, checkpoints, final weights
pub mod checkpoint;

/// Tokenizer training, saving, and loading
pub mod tokenizer_store;

/// Training metrics CSV logger
pub mod metrics;
