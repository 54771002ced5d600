// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Train + evaluate loop using Burn's DataLoader and AdamW.
//
//   for each epoch:
//     train:    masked batches → loss → backward → AdamW step
//               every `save_steps` steps → step checkpoint
//     evaluate: model.valid() on the inner backend, mean loss
//     log:      epoch,train_loss,eval_loss,perplexity → CSV
//
// Evaluation batches are masked dynamically too, so the
// reported loss is the same quantity the model is trained on.
// Both batchers draw their masks from RNGs seeded with `seed`,
// so two runs with the same config report the same losses.
// With zero epochs the untrained model is evaluated once.
//
// Reference: Burn Book §5, Loshchilov & Hutter (2019) AdamW

use anyhow::{bail, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamWConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::MlmBatcher, collator::MaskingConfig, dataset::CaptionDataset};
use crate::infra::{checkpoint::CheckpointManager, metrics::{EpochMetrics, MetricsLogger}};
use crate::ml::model::{MaskedLm, MaskedLmConfig};

pub type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// What a finished run reports back.
#[derive(Debug, Clone, Copy)]
pub struct TrainingSummary {
    pub steps:     usize,
    pub eval_loss: f64,
}

impl TrainingSummary {
    /// exp(mean evaluation loss)
    pub fn perplexity(&self) -> f64 {
        self.eval_loss.exp()
    }
}

pub struct TrainingRun<'a> {
    pub config:       &'a TrainConfig,
    pub model_config: MaskedLmConfig,
    pub masking:      MaskingConfig,
    pub pad_token_id: u32,
    pub checkpoints:  &'a CheckpointManager,
    pub metrics:      &'a MetricsLogger,
}

/// Train on the default WGPU device.
pub fn run_training(
    run:           TrainingRun<'_>,
    train_dataset: CaptionDataset,
    eval_dataset:  CaptionDataset,
) -> Result<TrainingSummary> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    train_loop::<TrainBackend>(run, train_dataset, eval_dataset, device)
}

pub fn train_loop<B: AutodiffBackend>(
    run:           TrainingRun<'_>,
    train_dataset: CaptionDataset,
    eval_dataset:  CaptionDataset,
    device:        B::Device,
) -> Result<TrainingSummary> {
    let cfg = run.config;

    if train_dataset.sample_count() == 0 {
        bail!("Training split is empty");
    }
    if eval_dataset.sample_count() == 0 {
        bail!("Evaluation split is empty (train_rows = {})", cfg.train_rows);
    }

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: MaskedLm<B> = run.model_config.init(&device);
    tracing::info!(
        "Model ready: {} layers, hidden={}, heads={}, vocab={}",
        run.model_config.num_hidden_layers,
        run.model_config.hidden_size,
        run.model_config.num_attention_heads,
        run.model_config.vocab_size,
    );

    // ── AdamW optimiser ───────────────────────────────────────────────────────
    let mut optim = AdamWConfig::new()
        .with_weight_decay(cfg.weight_decay as f32)
        .init();

    // ── Data loaders ──────────────────────────────────────────────────────────
    let train_batcher = MlmBatcher::<B>::new(run.masking.clone(), run.pad_token_id, cfg.seed);
    let eval_batcher  = MlmBatcher::<B::InnerBackend>::new(
        run.masking.clone(),
        run.pad_token_id,
        cfg.seed.wrapping_add(1),
    );

    let train_loader = DataLoaderBuilder::new(train_batcher)
        .batch_size(cfg.train_batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(train_dataset);

    let eval_loader = DataLoaderBuilder::new(eval_batcher)
        .batch_size(cfg.valid_batch_size)
        .num_workers(1)
        .build(eval_dataset);

    // Mean loss over every evaluation batch, dropout off, no autodiff
    let evaluate = |model: &MaskedLm<B>| -> f64 {
        let model_valid = model.valid();
        let mut loss_sum = 0.0f64;
        let mut batches  = 0usize;

        for batch in eval_loader.iter() {
            loss_sum += model_valid.forward_loss(batch).into_scalar().elem::<f64>();
            batches  += 1;
        }

        if batches > 0 { loss_sum / batches as f64 } else { f64::NAN }
    };

    let mut step      = 0usize;
    let mut eval_loss = None;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let loss = model.forward_loss(batch);

            train_loss_sum += loss.clone().into_scalar().elem::<f64>();
            train_batches  += 1;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
            step += 1;

            if cfg.save_steps > 0 && step % cfg.save_steps == 0 {
                run.checkpoints.save_step(&model, step, cfg.save_total_limit)?;
            }
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };

        // ── Evaluation phase ──────────────────────────────────────────────────
        let epoch_eval_loss = evaluate(&model);
        eval_loss = Some(epoch_eval_loss);

        let metrics = EpochMetrics::new(epoch, avg_train_loss, epoch_eval_loss);
        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | eval_loss={:.4} | perplexity={:.2}",
            epoch, cfg.epochs, metrics.train_loss, metrics.eval_loss, metrics.perplexity,
        );
        run.metrics.log(&metrics)?;
    }

    let eval_loss = match eval_loss {
        Some(loss) => loss,
        None => {
            tracing::info!("No training epochs run; evaluating the initial model");
            evaluate(&model)
        }
    };

    run.checkpoints.save_final(&model)?;
    tracing::info!("Training complete after {} steps", step);

    Ok(TrainingSummary { steps: step, eval_loss })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::MlmSample;
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = Autodiff<NdArray>;

    fn dataset(n: usize) -> CaptionDataset {
        CaptionDataset::new(
            (0..n)
                .map(|i| MlmSample { input_ids: vec![0, 10 + (i % 20) as u32, 11, 12, 2] })
                .collect(),
        )
    }

    fn tiny_run<'a>(
        config:      &'a TrainConfig,
        checkpoints: &'a CheckpointManager,
        metrics:     &'a MetricsLogger,
    ) -> TrainingRun<'a> {
        TrainingRun {
            config,
            model_config: MaskedLmConfig::new(40, 16, 8, 2, 1, 16, 1),
            masking: MaskingConfig {
                mlm_probability: 0.5,
                mask_token_id:   4,
                vocab_size:      40,
                special_ids:     vec![0, 1, 2, 3, 4],
            },
            pad_token_id: 1,
            checkpoints,
            metrics,
        }
    }

    fn tiny_config() -> TrainConfig {
        TrainConfig {
            epochs:           1,
            train_batch_size: 4,
            valid_batch_size: 2,
            save_steps:       2,
            save_total_limit: 1,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_runs_end_to_end_on_cpu() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoints = CheckpointManager::new(dir.path()).unwrap();
        let metrics = MetricsLogger::new(dir.path()).unwrap();
        let config = tiny_config();

        let summary = train_loop::<TestBackend>(
            tiny_run(&config, &checkpoints, &metrics),
            dataset(12),
            dataset(4),
            Default::default(),
        )
        .unwrap();

        assert_eq!(summary.steps, 3);
        assert!(summary.eval_loss.is_finite());
        assert!(summary.perplexity() >= 1.0);
        assert_eq!(checkpoints.step_checkpoints().unwrap(), vec![2]);

        let csv = std::fs::read_to_string(metrics.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 2);
    }

    #[test]
    fn test_empty_eval_split_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoints = CheckpointManager::new(dir.path()).unwrap();
        let metrics = MetricsLogger::new(dir.path()).unwrap();
        let config = tiny_config();

        let result = train_loop::<TestBackend>(
            tiny_run(&config, &checkpoints, &metrics),
            dataset(4),
            CaptionDataset::new(Vec::new()),
            Default::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_epochs_still_reports_eval_loss() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoints = CheckpointManager::new(dir.path()).unwrap();
        let metrics = MetricsLogger::new(dir.path()).unwrap();
        let config = TrainConfig { epochs: 0, ..tiny_config() };

        let summary = train_loop::<TestBackend>(
            tiny_run(&config, &checkpoints, &metrics),
            dataset(4),
            dataset(4),
            Default::default(),
        )
        .unwrap();

        assert_eq!(summary.steps, 0);
        assert!(summary.eval_loss.is_finite());
        assert!(summary.perplexity().is_finite());

        let csv = std::fs::read_to_string(metrics.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }
}
