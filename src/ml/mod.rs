// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model and optimiser code lives here.
//
//   model.rs   — Masked language model assembled from Burn's
//                building blocks:
//                • Token, position and type embeddings
//                • burn::nn::transformer::TransformerEncoder
//                • Dense + GELU + LayerNorm LM head
//                • Loss over masked positions only
//
//   trainer.rs — Train/evaluate loop with AdamW, step
//                checkpoints and per-epoch metrics
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Liu et al. (2019) RoBERTa

/// Masked language model architecture
pub mod model;

/// Training loop with evaluation and checkpointing
pub mod trainer;
