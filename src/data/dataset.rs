use anyhow::Result;
use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};
use tokenizers::Tokenizer;

use crate::domain::caption::Caption;
use crate::infra::tokenizer_store::SpecialTokens;

/// One tokenised caption: `<s> … </s>`, at most `max_len` ids, unpadded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlmSample {
    pub input_ids: Vec<u32>,
}

pub struct CaptionDataset {
    samples: Vec<MlmSample>,
}

impl CaptionDataset {
    pub fn new(samples: Vec<MlmSample>) -> Self { Self { samples } }

    /// Tokenise every text caption. Non-string captions are skipped.
    pub fn from_captions(
        captions:  &[Caption],
        tokenizer: &Tokenizer,
        special:   &SpecialTokens,
        max_len:   usize,
    ) -> Result<Self> {
        let mut samples = Vec::with_capacity(captions.len());

        for (row, caption) in captions.iter().enumerate() {
            let Some(text) = caption.as_text() else {
                tracing::warn!("Row {row}: caption is not a string, not tokenised ({caption})");
                continue;
            };

            let enc = tokenizer
                .encode(text, true)
                .map_err(|e| anyhow::anyhow!("Tokenisation error on row {row}: {e}"))?;

            samples.push(MlmSample {
                input_ids: truncate_ids(enc.get_ids().to_vec(), max_len, special.eos),
            });
        }

        Ok(Self::new(samples))
    }

    pub fn sample_count(&self) -> usize { self.samples.len() }
}

/// Cut `ids` to `max_len`, keeping `eos` as the last id when cut.
fn truncate_ids(mut ids: Vec<u32>, max_len: usize, eos: u32) -> Vec<u32> {
    if ids.len() > max_len && max_len > 0 {
        ids.truncate(max_len - 1);
        ids.push(eos);
    }
    ids
}

impl Dataset<MlmSample> for CaptionDataset {
    fn get(&self, index: usize) -> Option<MlmSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_eos() {
        let ids = vec![0, 10, 11, 12, 13, 2];
        assert_eq!(truncate_ids(ids, 4, 2), vec![0, 10, 11, 2]);
    }

    #[test]
    fn test_short_sequence_untouched() {
        let ids = vec![0, 10, 2];
        assert_eq!(truncate_ids(ids.clone(), 128, 2), ids);
    }

    #[test]
    fn test_dataset_get() {
        let ds = CaptionDataset::new(vec![MlmSample { input_ids: vec![0, 5, 2] }]);
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.get(0).unwrap().input_ids, vec![0, 5, 2]);
        assert!(ds.get(1).is_none());
    }
}
