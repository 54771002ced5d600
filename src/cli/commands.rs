// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands and their flags. Defaults
// reproduce the reference training run.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{ArgAction, Args, Subcommand};
use std::path::PathBuf;

use crate::application::{
    prepare_use_case::PrepareConfig,
    tokenizer_use_case::TokenizerConfig,
    train_use_case::TrainConfig,
};
use crate::data::corpus::WritePolicy;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Flatten the caption JSON and write one text file per caption
    Prepare(PrepareArgs),

    /// Train a byte-level BPE tokenizer on the caption corpus
    Tokenizer(TokenizerArgs),

    /// Write the corpus, then train and evaluate the masked language model
    Train(TrainArgs),
}

fn write_policy(fail_fast: bool) -> WritePolicy {
    if fail_fast { WritePolicy::FailFast } else { WritePolicy::BestEffort }
}

#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// JSON file mapping image id → list of captions
    #[arg(long, default_value = "data.json")]
    pub data: PathBuf,

    /// Existing directory that receives <index>.txt files
    #[arg(long, default_value = "./text_split")]
    pub corpus_dir: PathBuf,

    /// Index of the first file written
    #[arg(long, default_value_t = 0)]
    pub prefix: usize,

    /// Abort on the first caption that cannot be written
    #[arg(long)]
    pub fail_fast: bool,
}

impl From<PrepareArgs> for PrepareConfig {
    fn from(a: PrepareArgs) -> Self {
        PrepareConfig {
            data_path:    a.data,
            corpus_dir:   a.corpus_dir,
            prefix:       a.prefix,
            write_policy: write_policy(a.fail_fast),
        }
    }
}

#[derive(Args, Debug)]
pub struct TokenizerArgs {
    /// Directory of corpus .txt files
    #[arg(long, default_value = "./text_split")]
    pub corpus_dir: PathBuf,

    /// Where tokenizer.json is written
    #[arg(long, default_value = "Byte_tokenizer")]
    pub tokenizer_dir: PathBuf,

    /// Target vocabulary size, special tokens included
    #[arg(long, default_value_t = 10_000)]
    pub vocab_size: usize,

    /// Minimum pair frequency for a merge
    #[arg(long, default_value_t = 2)]
    pub min_frequency: u64,
}

impl From<TokenizerArgs> for TokenizerConfig {
    fn from(a: TokenizerArgs) -> Self {
        TokenizerConfig {
            corpus_dir:    a.corpus_dir,
            tokenizer_dir: a.tokenizer_dir,
            vocab_size:    a.vocab_size,
            min_frequency: a.min_frequency,
        }
    }
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// JSON file mapping image id → list of captions
    #[arg(long, default_value = "data.json")]
    pub data: String,

    /// Existing directory that receives the corpus files
    #[arg(long, default_value = "./text_split")]
    pub corpus_dir: String,

    /// Directory holding the trained tokenizer.json
    #[arg(long, default_value = "Byte_tokenizer")]
    pub tokenizer_dir: String,

    /// Output directory for weights, config and metrics
    #[arg(long, default_value = "RobertaMLM")]
    pub model_dir: String,

    #[arg(long, default_value_t = 20)]
    pub train_batch_size: usize,

    #[arg(long, default_value_t = 5)]
    pub valid_batch_size: usize,

    #[arg(long, default_value_t = 2)]
    pub epochs: usize,

    #[arg(long, default_value_t = 1e-4)]
    pub lr: f64,

    #[arg(long, default_value_t = 0.01)]
    pub weight_decay: f64,

    /// Seed for the training data shuffle
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Maximum tokens per caption, <s> and </s> included
    #[arg(long, default_value_t = 128)]
    pub max_len: usize,

    /// Rows before this index train; the rest evaluate
    #[arg(long, default_value_t = 38_000)]
    pub train_rows: usize,

    /// Fraction of tokens selected for masking
    #[arg(long, default_value_t = 0.15)]
    pub mlm_probability: f64,

    /// Save a checkpoint every N optimizer steps (0 disables)
    #[arg(long, default_value_t = 8192)]
    pub save_steps: usize,

    /// Number of step checkpoints kept (0 keeps all)
    #[arg(long, default_value_t = 1)]
    pub save_total_limit: usize,

    /// Allow writing into a non-empty model directory
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub overwrite_output_dir: bool,

    /// Abort on the first caption that cannot be written
    #[arg(long)]
    pub fail_fast: bool,

    #[arg(long, default_value_t = 10_000)]
    pub vocab_size: usize,

    #[arg(long, default_value_t = 514)]
    pub max_position_embeddings: usize,

    #[arg(long, default_value_t = 12)]
    pub num_attention_heads: usize,

    #[arg(long, default_value_t = 6)]
    pub num_hidden_layers: usize,

    #[arg(long, default_value_t = 1)]
    pub type_vocab_size: usize,

    #[arg(long, default_value_t = 768)]
    pub hidden_size: usize,

    #[arg(long, default_value_t = 3072)]
    pub intermediate_size: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_path:     a.data,
            corpus_dir:    a.corpus_dir,
            tokenizer_dir: a.tokenizer_dir,
            model_dir:     a.model_dir,

            train_batch_size:     a.train_batch_size,
            valid_batch_size:     a.valid_batch_size,
            epochs:               a.epochs,
            lr:                   a.lr,
            weight_decay:         a.weight_decay,
            seed:                 a.seed,
            max_len:              a.max_len,
            train_rows:           a.train_rows,
            mlm_probability:      a.mlm_probability,
            save_steps:           a.save_steps,
            save_total_limit:     a.save_total_limit,
            overwrite_output_dir: a.overwrite_output_dir,
            write_policy:         write_policy(a.fail_fast),

            vocab_size:              a.vocab_size,
            max_position_embeddings: a.max_position_embeddings,
            num_attention_heads:     a.num_attention_heads,
            num_hidden_layers:       a.num_hidden_layers,
            type_vocab_size:         a.type_vocab_size,
            hidden_size:             a.hidden_size,
            intermediate_size:       a.intermediate_size,
            dropout:                 a.dropout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_defaults_match_config_defaults() {
        let cli = Cli::try_parse_from(["caption-mlm", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let from_cli: TrainConfig = args.into();
        let defaults = TrainConfig::default();

        assert_eq!(
            serde_json::to_value(&from_cli).unwrap(),
            serde_json::to_value(&defaults).unwrap()
        );
    }

    #[test]
    fn test_prepare_fail_fast_flag() {
        let cli = Cli::try_parse_from(["caption-mlm", "prepare", "--prefix", "3", "--fail-fast"]).unwrap();
        let Commands::Prepare(args) = cli.command else { panic!("expected prepare") };
        let cfg: PrepareConfig = args.into();
        assert_eq!(cfg.prefix, 3);
        assert_eq!(cfg.write_policy, WritePolicy::FailFast);
    }

    #[test]
    fn test_overwrite_output_dir_can_be_disabled() {
        let cli = Cli::try_parse_from(["caption-mlm", "train", "--overwrite-output-dir", "false"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        assert!(!args.overwrite_output_dir);
    }
}
