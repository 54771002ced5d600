// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses command line arguments with clap and hands off to
// the use cases in Layer 2.
//
// Three commands, normally run in this order:
//   1. `prepare`   — flatten data.json and write the corpus
//   2. `tokenizer` — train the BPE tokenizer on the corpus
//   3. `train`     — (re)write the corpus, then train the MLM
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PrepareArgs, TokenizerArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "caption-mlm",
    version,
    about = "Build a caption corpus and pre-train a masked language model on it."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case. Only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Prepare(args)   => run_prepare(args),
            Commands::Tokenizer(args) => run_tokenizer(args),
            Commands::Train(args)     => run_train(args),
        }
    }
}

fn run_prepare(args: PrepareArgs) -> Result<()> {
    use crate::application::prepare_use_case::PrepareUseCase;

    tracing::info!("Preparing corpus from '{}'", args.data.display());
    let out = PrepareUseCase::new(args.into()).execute()?;

    println!("Processed {} captions. Next free index: {}", out.table.len(), out.next_index);
    Ok(())
}

fn run_tokenizer(args: TokenizerArgs) -> Result<()> {
    use crate::application::tokenizer_use_case::TokenizerUseCase;

    tracing::info!("Training tokenizer on '{}'", args.corpus_dir.display());
    let vocab = TokenizerUseCase::new(args.into()).execute()?;

    println!("Tokenizer trained ({vocab} tokens).");
    Ok(())
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on captions in: {}", args.data);
    let summary = TrainUseCase::new(args.into()).execute()?;
    tracing::info!("Finished after {} optimizer steps", summary.steps);

    println!("Perplexity: {:.2}", summary.perplexity());
    Ok(())
}
