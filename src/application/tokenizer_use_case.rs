// ============================================================
// Layer 2 — TokenizerUseCase
// ============================================================
// Trains the byte-level BPE tokenizer over a prepared corpus
// directory and saves it for the train command.

use anyhow::Result;
use std::path::PathBuf;

use crate::infra::tokenizer_store::TokenizerStore;

#[derive(Debug, Clone)]
pub struct TokenizerConfig {
    pub corpus_dir:    PathBuf,
    pub tokenizer_dir: PathBuf,
    pub vocab_size:    usize,
    pub min_frequency: u64,
}

pub struct TokenizerUseCase {
    config: TokenizerConfig,
}

impl TokenizerUseCase {
    pub fn new(config: TokenizerConfig) -> Self {
        Self { config }
    }

    /// Returns the trained vocabulary size.
    pub fn execute(&self) -> Result<usize> {
        let cfg   = &self.config;
        let store = TokenizerStore::new(&cfg.tokenizer_dir);
        let tok   = store.train_from_corpus(&cfg.corpus_dir, cfg.vocab_size, cfg.min_frequency)?;
        Ok(tok.get_vocab_size(true))
    }
}
