// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Flatten captions + write corpus (Layer 4 - data)
//   Step 2: Load tokenizer                  (Layer 6 - infra)
//   Step 3: Split train/evaluation by row   (Layer 4 - data)
//   Step 4: Tokenise into datasets          (Layer 4 - data)
//   Step 5: Save config                     (Layer 6 - infra)
//   Step 6: Run training loop               (Layer 5 - ml)
//   Step 7: Copy tokenizer next to model    (Layer 6 - infra)
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::application::prepare_use_case::{PrepareConfig, PrepareUseCase};
use crate::data::{
    collator::MaskingConfig,
    corpus::WritePolicy,
    dataset::CaptionDataset,
    splitter::split_at_row,
};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::MetricsLogger,
    tokenizer_store::{SpecialTokens, TokenizerStore},
};
use crate::ml::model::MaskedLmConfig;
use crate::ml::trainer::{run_training, TrainingRun, TrainingSummary};

// ─── Training Configuration ──────────────────────────────────────────────────
// All settings for one training run. Serialisable so it can be
// written next to the trained model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    // ── Paths ──
    pub data_path:     String,
    pub corpus_dir:    String,
    pub tokenizer_dir: String,
    pub model_dir:     String,

    // ── Training arguments ──
    pub train_batch_size:     usize,
    pub valid_batch_size:     usize,
    pub epochs:               usize,
    pub lr:                   f64,
    pub weight_decay:         f64,
    pub seed:                 u64,
    pub max_len:              usize,
    pub train_rows:           usize,
    pub mlm_probability:      f64,
    pub save_steps:           usize,
    pub save_total_limit:     usize,
    pub overwrite_output_dir: bool,
    pub write_policy:         WritePolicy,

    // ── Model ──
    pub vocab_size:              usize,
    pub max_position_embeddings: usize,
    pub num_attention_heads:     usize,
    pub num_hidden_layers:       usize,
    pub type_vocab_size:         usize,
    pub hidden_size:             usize,
    pub intermediate_size:       usize,
    pub dropout:                 f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_path:     "data.json".to_string(),
            corpus_dir:    "./text_split".to_string(),
            tokenizer_dir: "Byte_tokenizer".to_string(),
            model_dir:     "RobertaMLM".to_string(),

            train_batch_size:     20,
            valid_batch_size:     5,
            epochs:               2,
            lr:                   1e-4,
            weight_decay:         0.01,
            seed:                 42,
            max_len:              128,
            train_rows:           38_000,
            mlm_probability:      0.15,
            save_steps:           8192,
            save_total_limit:     1,
            overwrite_output_dir: true,
            write_policy:         WritePolicy::BestEffort,

            vocab_size:              10_000,
            max_position_embeddings: 514,
            num_attention_heads:     12,
            num_hidden_layers:       6,
            type_vocab_size:         1,
            hidden_size:             768,
            intermediate_size:       3072,
            dropout:                 0.1,
        }
    }
}

impl TrainConfig {
    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.mlm_probability) {
            bail!("mlm_probability must be within [0, 1], got {}", self.mlm_probability);
        }
        if self.train_batch_size == 0 || self.valid_batch_size == 0 {
            bail!("batch sizes must be at least 1");
        }
        if self.max_len < 2 {
            bail!("max_len must leave room for <s> and </s>, got {}", self.max_len);
        }
        if self.max_len > self.max_position_embeddings {
            bail!(
                "max_len ({}) exceeds max_position_embeddings ({})",
                self.max_len,
                self.max_position_embeddings
            );
        }
        if self.num_attention_heads == 0 || self.hidden_size % self.num_attention_heads != 0 {
            bail!(
                "hidden_size ({}) must be divisible by num_attention_heads ({})",
                self.hidden_size,
                self.num_attention_heads
            );
        }
        Ok(())
    }

    pub fn model_config(&self) -> MaskedLmConfig {
        MaskedLmConfig::new(
            self.vocab_size,
            self.max_position_embeddings,
            self.hidden_size,
            self.num_attention_heads,
            self.num_hidden_layers,
            self.intermediate_size,
            self.type_vocab_size,
        )
        .with_dropout(self.dropout)
    }

    /// Random replacements are drawn from the tokenizer's vocabulary.
    pub fn masking_config(&self, special: &SpecialTokens, tokenizer_vocab: usize) -> MaskingConfig {
        MaskingConfig {
            mlm_probability: self.mlm_probability,
            mask_token_id:   special.mask,
            vocab_size:      tokenizer_vocab,
            special_ids:     special.all(),
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainingSummary> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Step 1: Flatten captions and write the corpus ─────────────────────
        let prepared = PrepareUseCase::new(PrepareConfig {
            data_path:    cfg.data_path.clone().into(),
            corpus_dir:   cfg.corpus_dir.clone().into(),
            prefix:       0,
            write_policy: cfg.write_policy,
        })
        .execute()?;
        tracing::info!("Corpus ready: next free index {}", prepared.next_index);

        // ── Step 2: Load the previously trained tokenizer ─────────────────────
        let tok_store = TokenizerStore::new(&cfg.tokenizer_dir);
        let tokenizer = tok_store.load()?;
        let special   = SpecialTokens::resolve(&tokenizer)?;

        let tok_vocab = tokenizer.get_vocab_size(true);
        if tok_vocab > cfg.vocab_size {
            bail!(
                "Tokenizer has {} tokens but the model vocab_size is {}",
                tok_vocab,
                cfg.vocab_size
            );
        }

        // ── Step 3: Train / evaluation split by row index ─────────────────────
        let (train_rows, eval_rows) =
            split_at_row(prepared.table.captions().to_vec(), cfg.train_rows);
        tracing::info!("Split: {} train, {} evaluation", train_rows.len(), eval_rows.len());

        // ── Step 4: Tokenise ──────────────────────────────────────────────────
        let train_dataset = CaptionDataset::from_captions(&train_rows, &tokenizer, &special, cfg.max_len)?;
        let eval_dataset  = CaptionDataset::from_captions(&eval_rows,  &tokenizer, &special, cfg.max_len)?;

        // ── Step 5: Model directory, config, metrics ──────────────────────────
        let checkpoints = CheckpointManager::prepare(&cfg.model_dir, cfg.overwrite_output_dir)?;
        checkpoints.save_config(cfg)?;
        let metrics = MetricsLogger::new(checkpoints.dir())?;

        // ── Step 6: Train and evaluate (Layer 5) ──────────────────────────────
        let summary = run_training(
            TrainingRun {
                config:       cfg,
                model_config: cfg.model_config(),
                masking:      cfg.masking_config(&special, tok_vocab),
                pad_token_id: special.pad,
                checkpoints:  &checkpoints,
                metrics:      &metrics,
            },
            train_dataset,
            eval_dataset,
        )?;

        // ── Step 7: Keep the tokenizer with the model ─────────────────────────
        tok_store.save_copy(Path::new(&cfg.model_dir))?;

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_run() {
        let cfg = TrainConfig::default();
        assert_eq!(cfg.train_batch_size, 20);
        assert_eq!(cfg.valid_batch_size, 5);
        assert_eq!(cfg.epochs, 2);
        assert_eq!(cfg.train_rows, 38_000);
        assert_eq!(cfg.max_len, 128);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_probability() {
        let cfg = TrainConfig { mlm_probability: 1.5, ..TrainConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_long_sequences() {
        let cfg = TrainConfig { max_len: 1024, ..TrainConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_uneven_heads() {
        let cfg = TrainConfig { hidden_size: 100, ..TrainConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_masking_config_uses_special_ids() {
        let special = SpecialTokens { bos: 0, pad: 1, eos: 2, unk: 3, mask: 4 };
        let m = TrainConfig::default().masking_config(&special, 8_000);
        assert_eq!(m.mask_token_id, 4);
        assert_eq!(m.special_ids, vec![0, 1, 2, 3, 4]);
        assert_eq!(m.vocab_size, 8_000);
    }

    #[test]
    fn test_write_policy_serialises_kebab_case() {
        let json = serde_json::to_string(&TrainConfig::default()).unwrap();
        assert!(json.contains("\"write_policy\":\"best-effort\""));
    }
}
