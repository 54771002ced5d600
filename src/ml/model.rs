use burn::{
    nn::{
        transformer::{TransformerEncoder, TransformerEncoderConfig, TransformerEncoderInput},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::{gelu, log_softmax},
};

use crate::data::batcher::MlmBatch;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct MaskedLmConfig {
    pub vocab_size:              usize,
    pub max_position_embeddings: usize,
    pub hidden_size:             usize,
    pub num_attention_heads:     usize,
    pub num_hidden_layers:       usize,
    pub intermediate_size:       usize,
    pub type_vocab_size:         usize,
    #[config(default = 0.1)]
    pub dropout:                 f64,
    #[config(default = 1e-5)]
    pub layer_norm_eps:          f64,
}

impl MaskedLmConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> MaskedLm<B> {
        let token_embedding    = EmbeddingConfig::new(self.vocab_size, self.hidden_size).init(device);
        let position_embedding = EmbeddingConfig::new(self.max_position_embeddings, self.hidden_size).init(device);
        let type_embedding     = EmbeddingConfig::new(self.type_vocab_size.max(1), self.hidden_size).init(device);
        let embedding_norm     = LayerNormConfig::new(self.hidden_size)
            .with_epsilon(self.layer_norm_eps)
            .init(device);

        let encoder = TransformerEncoderConfig::new(
            self.hidden_size,
            self.intermediate_size,
            self.num_attention_heads,
            self.num_hidden_layers,
        )
        .with_dropout(self.dropout)
        .init(device);

        let head_dense = LinearConfig::new(self.hidden_size, self.hidden_size).init(device);
        let head_norm  = LayerNormConfig::new(self.hidden_size)
            .with_epsilon(self.layer_norm_eps)
            .init(device);
        let decoder    = LinearConfig::new(self.hidden_size, self.vocab_size).init(device);
        let dropout    = DropoutConfig::new(self.dropout).init();

        MaskedLm {
            token_embedding, position_embedding, type_embedding, embedding_norm,
            encoder, head_dense, head_norm, decoder, dropout,
        }
    }
}

/// Encoder-only language model with a token-prediction head.
#[derive(Module, Debug)]
pub struct MaskedLm<B: Backend> {
    pub token_embedding:    Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub type_embedding:     Embedding<B>,
    pub embedding_norm:     LayerNorm<B>,
    pub encoder:            TransformerEncoder<B>,
    pub head_dense:         Linear<B>,
    pub head_norm:          LayerNorm<B>,
    pub decoder:            Linear<B>,
    pub dropout:            Dropout,
}

impl<B: Backend> MaskedLm<B> {
    /// input_ids, padding_mask: [batch, seq_len] → logits: [batch, seq_len, vocab]
    pub fn forward(
        &self,
        input_ids:    Tensor<B, 2, Int>,
        padding_mask: Tensor<B, 2, Bool>,
    ) -> Tensor<B, 3> {
        let [batch_size, seq_len] = input_ids.dims();
        let device = input_ids.device();

        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &device)
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        // Single segment: every token has type id 0
        let types = Tensor::<B, 2, Int>::zeros([batch_size, seq_len], &device);

        let x = self.token_embedding.forward(input_ids)
            + self.position_embedding.forward(positions)
            + self.type_embedding.forward(types);
        let x = self.dropout.forward(self.embedding_norm.forward(x));

        let x = self
            .encoder
            .forward(TransformerEncoderInput::new(x).mask_pad(padding_mask));

        let x = self.head_norm.forward(gelu(self.head_dense.forward(x)));
        self.decoder.forward(x)
    }

    /// Mean cross-entropy over selected positions — shape [1].
    /// 0 when the batch has no selected position.
    pub fn forward_loss(&self, batch: MlmBatch<B>) -> Tensor<B, 1> {
        let logits = self.forward(batch.input_ids, batch.padding_mask);
        let [batch_size, seq_len, vocab_size] = logits.dims();
        let n = batch_size * seq_len;

        let log_probs = log_softmax(logits.reshape([n, vocab_size]), 1);
        let picked: Tensor<B, 1> = log_probs
            .gather(1, batch.labels.reshape([n, 1]))
            .reshape([n]);

        // Unselected positions carry a dummy label; weight them out.
        let weights = batch.label_mask.reshape([n]).float();
        let count   = weights.clone().sum().clamp_min(1.0);
        (picked * weights).sum().neg() / count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn tiny_config() -> MaskedLmConfig {
        MaskedLmConfig::new(50, 16, 8, 2, 1, 16, 1).with_dropout(0.0)
    }

    fn tiny_batch(device: &<TestBackend as Backend>::Device, selected: [bool; 4]) -> MlmBatch<TestBackend> {
        let ids = Tensor::<TestBackend, 2, Int>::from_data(TensorData::new(vec![0i32, 7, 4, 2], [1, 4]), device);
        let labels = Tensor::<TestBackend, 2, Int>::from_data(TensorData::new(vec![0i32, 0, 9, 0], [1, 4]), device);
        let mask = Tensor::<TestBackend, 2, Int>::from_data(
            TensorData::new(selected.iter().map(|&s| s as i32).collect::<Vec<_>>(), [1, 4]),
            device,
        )
        .equal_elem(1);
        let padding = Tensor::<TestBackend, 2, Int>::zeros([1, 4], device).equal_elem(1);
        MlmBatch { input_ids: ids, labels, label_mask: mask, padding_mask: padding }
    }

    #[test]
    fn test_logits_shape() {
        let device = Default::default();
        let model: MaskedLm<TestBackend> = tiny_config().init(&device);
        let batch = tiny_batch(&device, [false, false, true, false]);
        let logits = model.forward(batch.input_ids, batch.padding_mask);
        assert_eq!(logits.dims(), [1, 4, 50]);
    }

    #[test]
    fn test_loss_is_finite_and_positive() {
        let device = Default::default();
        let model: MaskedLm<TestBackend> = tiny_config().init(&device);
        let loss: f64 = model
            .forward_loss(tiny_batch(&device, [false, false, true, false]))
            .into_scalar()
            .elem::<f64>();
        assert!(loss.is_finite());
        assert!(loss > 0.0);
    }

    #[test]
    fn test_loss_zero_when_nothing_selected() {
        let device = Default::default();
        let model: MaskedLm<TestBackend> = tiny_config().init(&device);
        let loss: f64 = model
            .forward_loss(tiny_batch(&device, [false; 4]))
            .into_scalar()
            .elem::<f64>();
        assert_eq!(loss, 0.0);
    }
}
