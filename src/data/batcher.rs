// ============================================================
// Layer 4 — MLM Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<MlmSample>
// into masked, padded tensors.
//
// How batching works here:
//   Input:  N samples of varying length (≤ max_len)
//   Output: MlmBatch with tensors of shape [N, S]
//           where S is the longest sample in this batch
//
//   1. Mask each sample (dynamic: new mask every batch,
//      drawn from the batcher's own seeded RNG)
//   2. Pad every row to S with <pad>
//   3. Flatten rows and reshape to [N, S]
//
// Reference: Burn Book §4 (Batcher)

use std::{
    marker::PhantomData,
    sync::{Arc, Mutex, PoisonError},
};

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::data::collator::{mask_tokens, MaskingConfig};
use crate::data::dataset::MlmSample;

// ─── MlmBatch ─────────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct MlmBatch<B: Backend> {
    /// Masked token ids — shape: [batch_size, seq_len]
    pub input_ids: Tensor<B, 2, Int>,

    /// Original ids at selected positions, 0 elsewhere — [batch_size, seq_len]
    pub labels: Tensor<B, 2, Int>,

    /// true where the loss is computed — [batch_size, seq_len]
    pub label_mask: Tensor<B, 2, Bool>,

    /// true on padding positions — [batch_size, seq_len]
    pub padding_mask: Tensor<B, 2, Bool>,
}

// ─── MlmBatcher ───────────────────────────────────────────────────────────────
/// Typed on the backend so the DataLoader can infer it.
/// Clones share one RNG, so a seeded batcher yields the same
/// sequence of masks on every run.
#[derive(Clone, Debug)]
pub struct MlmBatcher<B: Backend> {
    masking:      MaskingConfig,
    pad_token_id: u32,
    rng:          Arc<Mutex<StdRng>>,
    _backend:     PhantomData<B>,
}

impl<B: Backend> MlmBatcher<B> {
    pub fn new(masking: MaskingConfig, pad_token_id: u32, seed: u64) -> Self {
        Self {
            masking,
            pad_token_id,
            rng: Arc::new(Mutex::new(StdRng::seed_from_u64(seed))),
            _backend: PhantomData,
        }
    }

    /// Build a batch with the given random source.
    pub fn collate<R: Rng>(
        &self,
        items:  Vec<MlmSample>,
        rng:    &mut R,
        device: &B::Device,
    ) -> MlmBatch<B> {
        let batch_size = items.len();
        let seq_len    = items.iter().map(|s| s.input_ids.len()).max().unwrap_or(0).max(1);

        let mut input_flat:   Vec<i32> = Vec::with_capacity(batch_size * seq_len);
        let mut label_flat:   Vec<i32> = Vec::with_capacity(batch_size * seq_len);
        let mut selected_flat: Vec<i32> = Vec::with_capacity(batch_size * seq_len);
        let mut padding_flat: Vec<i32> = Vec::with_capacity(batch_size * seq_len);

        for item in &items {
            let masked = mask_tokens(&item.input_ids, &self.masking, rng);
            let pad    = seq_len - masked.input_ids.len();

            input_flat.extend(masked.input_ids.iter().map(|&x| x as i32));
            input_flat.extend(std::iter::repeat(self.pad_token_id as i32).take(pad));

            label_flat.extend(masked.labels.iter().map(|&x| x as i32));
            label_flat.extend(std::iter::repeat(0).take(pad));

            selected_flat.extend(masked.selected.iter().map(|&s| s as i32));
            selected_flat.extend(std::iter::repeat(0).take(pad));

            padding_flat.extend(std::iter::repeat(0).take(masked.input_ids.len()));
            padding_flat.extend(std::iter::repeat(1).take(pad));
        }

        let to_tensor = |flat: Vec<i32>| {
            Tensor::<B, 2, Int>::from_data(TensorData::new(flat, [batch_size, seq_len]), device)
        };

        MlmBatch {
            input_ids:    to_tensor(input_flat),
            labels:       to_tensor(label_flat),
            label_mask:   to_tensor(selected_flat).equal_elem(1),
            padding_mask: to_tensor(padding_flat).equal_elem(1),
        }
    }
}

// ─── Burn Batcher Trait Implementation ────────────────────────────────────────
impl<B: Backend> Batcher<B, MlmSample, MlmBatch<B>> for MlmBatcher<B> {
    fn batch(&self, items: Vec<MlmSample>, device: &B::Device) -> MlmBatch<B> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        self.collate(items, &mut *rng, device)
    }
}
