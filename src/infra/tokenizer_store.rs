// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Trains, saves and loads the byte-level BPE tokenizer.
//
// Training reads the per-caption corpus files written by the
// CorpusWriter. The tokenizer follows the RoBERTa layout:
//
//   special tokens  <s>=0  <pad>=1  </s>=2  <unk>=3  <mask>=4
//   pre-tokenizer   ByteLevel (every byte is in the alphabet)
//   post-processor  "<s> … </s>" around each sequence
//   decoder         ByteLevel
//
// Output: <tokenizer_dir>/tokenizer.json
//
// Reference: Sennrich et al. (2016) BPE paper
//            tokenizers crate documentation

use anyhow::{anyhow, bail, Context, Result};
use std::{fs, path::{Path, PathBuf}};
use tokenizers::{
    models::bpe::{BpeTrainerBuilder, BPE},
    normalizers::NFC,
    pre_tokenizers::byte_level::ByteLevel,
    processors::roberta::RobertaProcessing,
    AddedToken, Tokenizer, TokenizerBuilder,
};

use crate::data::corpus::list_corpus_files;

const TOKENIZER_FILE: &str = "tokenizer.json";

/// Special tokens in id order; training assigns ids 0.. in this order.
pub const SPECIAL_TOKENS: [&str; 5] = ["<s>", "<pad>", "</s>", "<unk>", "<mask>"];

/// Ids of the special tokens in a loaded tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialTokens {
    pub bos:  u32,
    pub pad:  u32,
    pub eos:  u32,
    pub unk:  u32,
    pub mask: u32,
}

impl SpecialTokens {
    pub fn resolve(tokenizer: &Tokenizer) -> Result<Self> {
        let id = |token: &str| {
            tokenizer
                .token_to_id(token)
                .ok_or_else(|| anyhow!("Tokenizer has no '{token}' token"))
        };
        Ok(Self {
            bos:  id("<s>")?,
            pad:  id("<pad>")?,
            eos:  id("</s>")?,
            unk:  id("<unk>")?,
            mask: id("<mask>")?,
        })
    }

    pub fn all(&self) -> Vec<u32> {
        vec![self.bos, self.pad, self.eos, self.unk, self.mask]
    }
}

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn tokenizer_path(&self) -> PathBuf {
        self.dir.join(TOKENIZER_FILE)
    }

    /// Train a byte-level BPE tokenizer on every `*.txt` file in
    /// `corpus_dir` and save it.
    pub fn train_from_corpus(
        &self,
        corpus_dir:    &Path,
        vocab_size:    usize,
        min_frequency: u64,
    ) -> Result<Tokenizer> {
        let files: Vec<String> = list_corpus_files(corpus_dir)?
            .into_iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        if files.is_empty() {
            bail!("No corpus files found in '{}'", corpus_dir.display());
        }
        tracing::info!(
            "Training BPE tokenizer on {} files (vocab_size={}, min_frequency={})",
            files.len(),
            vocab_size,
            min_frequency
        );

        let mut tokenizer = TokenizerBuilder::new()
            .with_model(BPE::default())
            .with_normalizer(Some(NFC))
            .with_pre_tokenizer(Some(ByteLevel::default()))
            .with_post_processor(Some(RobertaProcessing::new(
                ("</s>".to_string(), 2),
                ("<s>".to_string(), 0),
            )))
            .with_decoder(Some(ByteLevel::default()))
            .build()
            .map_err(|e| anyhow!("Cannot build tokenizer: {e}"))?;

        let mut trainer = BpeTrainerBuilder::new()
            .show_progress(false)
            .vocab_size(vocab_size)
            .min_frequency(min_frequency)
            .initial_alphabet(ByteLevel::alphabet().into_iter().collect())
            .special_tokens(
                SPECIAL_TOKENS
                    .iter()
                    .map(|t| AddedToken::from(*t, true))
                    .collect(),
            )
            .build();

        tokenizer
            .train_from_files(&mut trainer, files)
            .map_err(|e| anyhow!("Tokenizer training failed: {e}"))?;

        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create tokenizer directory '{}'", self.dir.display()))?;
        let path = self.tokenizer_path();
        tokenizer
            .save(&path, false)
            .map_err(|e| anyhow!("Cannot save tokenizer to '{}': {e}", path.display()))?;

        tracing::info!(
            "Tokenizer trained with {} tokens, saved to '{}'",
            tokenizer.get_vocab_size(true),
            path.display()
        );

        // Load back as a plain Tokenizer instance
        self.load()
    }

    /// Load a previously saved tokenizer.
    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.tokenizer_path();
        if !path.exists() {
            bail!(
                "No tokenizer at '{}'. Run the 'tokenizer' command first.",
                path.display()
            );
        }
        Tokenizer::from_file(&path)
            .map_err(|e| anyhow!("Cannot load tokenizer from '{}': {e}", path.display()))
    }

    /// Copy the saved tokenizer file into `dest_dir`.
    pub fn save_copy(&self, dest_dir: &Path) -> Result<PathBuf> {
        let dest = dest_dir.join(TOKENIZER_FILE);
        fs::copy(self.tokenizer_path(), &dest)
            .with_context(|| format!("Cannot copy tokenizer to '{}'", dest.display()))?;
        tracing::debug!("Copied tokenizer to '{}'", dest.display());
        Ok(dest)
    }
}
