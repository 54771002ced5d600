// ============================================================
// Layer 4 — MLM Token Masking
// ============================================================
// Dynamic masking for masked-language-model training. Each time
// a batch is built, every eligible token is selected with
// probability `mlm_probability`. A selected token is then:
//
//   80% → replaced by <mask>
//   10% → replaced by a random vocabulary id
//   10% → left unchanged
//
// The model is scored only on selected positions; the label at
// every other position is ignored.
//
// Special tokens (<s>, </s>, <pad>, …) are never selected.
//
// Reference: Devlin et al. (2019) BERT, §3.1 Masked LM
//            rand crate documentation

use rand::Rng;

/// Fraction of selected tokens replaced by `<mask>`
const MASK_REPLACE_PROB: f64 = 0.8;

/// Fraction of selected tokens replaced by a random id
/// (the remainder are left unchanged)
const RANDOM_REPLACE_PROB: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct MaskingConfig {
    pub mlm_probability: f64,
    pub mask_token_id:   u32,
    pub vocab_size:      usize,
    /// Ids that are never selected for masking
    pub special_ids:     Vec<u32>,
}

/// Result of masking one sequence. All three vectors have the
/// length of the input.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedTokens {
    /// Model input after replacement
    pub input_ids: Vec<u32>,
    /// Original id at selected positions, 0 elsewhere
    pub labels:    Vec<u32>,
    /// true where the loss is computed
    pub selected:  Vec<bool>,
}

/// Apply MLM masking to a single token sequence.
pub fn mask_tokens<R: Rng>(ids: &[u32], cfg: &MaskingConfig, rng: &mut R) -> MaskedTokens {
    let mut input_ids = Vec::with_capacity(ids.len());
    let mut labels    = Vec::with_capacity(ids.len());
    let mut selected  = Vec::with_capacity(ids.len());

    for &id in ids {
        let eligible = !cfg.special_ids.contains(&id);

        if !eligible || !rng.gen_bool(cfg.mlm_probability) {
            input_ids.push(id);
            labels.push(0);
            selected.push(false);
            continue;
        }

        let roll: f64 = rng.gen();
        let replacement = if roll < MASK_REPLACE_PROB {
            cfg.mask_token_id
        } else if roll < MASK_REPLACE_PROB + RANDOM_REPLACE_PROB {
            rng.gen_range(0..cfg.vocab_size) as u32
        } else {
            id
        };

        input_ids.push(replacement);
        labels.push(id);
        selected.push(true);
    }

    MaskedTokens { input_ids, labels, selected }
}
