// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Each use case runs one workflow end to end by calling the
// data, ml and infra layers in order. No clap types and no
// model code here.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Flatten the dataset and write the caption corpus
pub mod prepare_use_case;

// Train the byte-level BPE tokenizer on the corpus
pub mod tokenizer_use_case;

// The full MLM training workflow
pub mod train_use_case;
