// ============================================================
// Layer 2 — PrepareUseCase
// ============================================================
// Step 1: Load the image → captions JSON   (Layer 4 - data)
// Step 2: Flatten into a caption table     (Layer 4 - data)
// Step 3: Write one corpus file per row    (Layer 4 - data)

use anyhow::Result;
use std::path::PathBuf;

use crate::data::{
    corpus::{CorpusWriter, WritePolicy},
    flattener::Flattener,
    loader::JsonCaptionLoader,
};
use crate::domain::caption::CaptionTable;
use crate::domain::traits::{CaptionSource, CorpusSink};

#[derive(Debug, Clone)]
pub struct PrepareConfig {
    pub data_path:    PathBuf,
    pub corpus_dir:   PathBuf,
    pub prefix:       usize,
    pub write_policy: WritePolicy,
}

/// What a prepare run produced.
pub struct PreparedCorpus {
    pub table:      CaptionTable,
    /// First unused corpus index after this run
    pub next_index: usize,
}

pub struct PrepareUseCase {
    config: PrepareConfig,
}

impl PrepareUseCase {
    pub fn new(config: PrepareConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<PreparedCorpus> {
        let cfg = &self.config;

        let map   = JsonCaptionLoader::new(&cfg.data_path).load()?;
        let table = Flattener::default().flatten(&map);
        if table.is_empty() {
            tracing::warn!("No captions found in '{}'", cfg.data_path.display());
        }

        let writer = CorpusWriter::new(&cfg.corpus_dir).with_policy(cfg.write_policy);
        let next_index = writer.write_all(table.captions(), cfg.prefix)?;

        Ok(PreparedCorpus { table, next_index })
    }
}
