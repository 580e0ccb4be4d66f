// ============================================================
// Layer 2 — Vocoder Use Cases
// ============================================================
// Two workflows over the network entry of an options file:
//
//   describe_network  — plan only, no weights
//   ForwardUseCase    — build the network on a backend and run
//                       one forward pass on random inputs
//
// Both stay backend-agnostic; the CLI picks Wgpu, tests NdArray.

use anyhow::{Context, Result};
use burn::{prelude::*, tensor::Distribution};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::infra::options::ExperimentOptions;
use crate::ml::registry::create_network;
use crate::ml::truncation::{ForwardMode, TopBounds};

/// Plan lines for the configured network
pub fn describe_network(opts: &ExperimentOptions) -> Result<Vec<String>> {
    let plan = opts
        .network
        .kwargs
        .plan()
        .with_context(|| format!("Cannot plan network '{}'", opts.network.which_model))?;

    let mut lines = vec![format!(
        "{}: {} levels, input multiple {}, length unit {}",
        opts.network.which_model,
        plan.levels.len(),
        opts.network.kwargs.input_multiple,
        plan.length_unit()
    )];
    lines.extend(plan.describe());
    Ok(lines)
}

#[derive(Debug, Clone)]
pub struct ForwardConfig {
    pub batch_size:        usize,
    /// Input length; 0 uses the network's input multiple
    pub length:            usize,
    /// Frames of spectrogram codes
    pub spectrogram_len:   usize,
    /// Samples in the reference clip
    pub conditioning_len:  usize,
    pub mode:              ForwardMode,
    pub seed:              u64,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            batch_size:       1,
            length:           0,
            spectrogram_len:  64,
            conditioning_len: 4096,
            mode:             ForwardMode::Train,
            seed:             0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ForwardReport {
    pub output_shape:     [usize; 3],
    pub bounds:           TopBounds,
    pub params:           usize,
    pub trainable_params: usize,
}

pub struct ForwardUseCase {
    config: ForwardConfig,
}

impl ForwardUseCase {
    pub fn new(config: ForwardConfig) -> Self {
        Self { config }
    }

    pub fn execute<B: Backend>(&self, opts: &ExperimentOptions, device: &B::Device) -> Result<ForwardReport> {
        let cfg    = &self.config;
        let kwargs = &opts.network.kwargs;

        // ── Step 1: Build ─────────────────────────────────────────────────────
        let net = create_network::<B>(opts.network.which_model, kwargs, device)
            .with_context(|| format!("Cannot build network '{}'", opts.network.which_model))?;
        let params           = net.model.num_params();
        let trainable_params = net.model.trainable_params(&net.trainable);
        tracing::info!("Built network: {} parameters, {} trainable", params, trainable_params);

        // ── Step 2: Random inputs ─────────────────────────────────────────────
        let length = if cfg.length == 0 { kwargs.input_multiple } else { cfg.length };
        let batch  = cfg.batch_size;

        let x = Tensor::<B, 3>::random([batch, kwargs.in_channels, length], Distribution::Normal(0.0, 1.0), device);
        let steps: Vec<i32> = (0..batch).map(|i| (i * 100) as i32).collect();
        let timesteps   = Tensor::<B, 1, Int>::from_ints(steps.as_slice(), device);
        let spectrogram = Tensor::<B, 3>::random(
            [batch, kwargs.discrete_codes, cfg.spectrogram_len],
            Distribution::Default,
            device,
        );
        let conditioning = kwargs.conditioning_inputs_provided.then(|| {
            Tensor::<B, 3>::random(
                [batch, kwargs.conditioning_input_dim.unwrap_or(kwargs.in_channels), cfg.conditioning_len],
                Distribution::Normal(0.0, 1.0),
                device,
            )
        });

        // ── Step 3: Forward ───────────────────────────────────────────────────
        let mut rng = ChaCha8Rng::seed_from_u64(cfg.seed);
        let out = net
            .model
            .forward(x, timesteps, spectrogram, conditioning, cfg.mode, &mut rng)
            .context("Forward pass failed")?;

        Ok(ForwardReport {
            output_shape: out.output.dims(),
            bounds: out.bounds,
            params,
            trainable_params,
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::VocoderConfig;
    use burn::backend::NdArray;

    fn small_options() -> ExperimentOptions {
        let mut opts = ExperimentOptions::default();
        opts.network.kwargs = VocoderConfig::new(16)
            .with_discrete_codes(8)
            .with_channel_mult(vec![1.0, 2.0])
            .with_num_res_blocks(vec![1, 1])
            .with_attention_resolutions(vec![2])
            .with_spectrogram_conditioning_resolutions(vec![2])
            .with_contextual_base_channels(4)
            .with_contextual_depth(1)
            .with_input_multiple(32);
        opts
    }

    #[test]
    fn test_describe_lists_levels() {
        let lines = describe_network(&small_options()).unwrap();
        assert!(lines[0].contains("2 levels"));
        assert!(lines.iter().any(|l| l.contains("spectrogram")));
    }

    #[test]
    fn test_forward_report() {
        let device = Default::default();
        let report = ForwardUseCase::new(ForwardConfig {
            batch_size:       2,
            length:           64,
            spectrogram_len:  8,
            conditioning_len: 50,
            mode:             ForwardMode::Eval,
            seed:             0,
        })
        .execute::<NdArray>(&small_options(), &device)
        .unwrap();

        assert_eq!(report.output_shape, [2, 2, 64]);
        assert_eq!(report.bounds, TopBounds { start: 0, stop: 64 });
        assert_eq!(report.params, report.trainable_params);
    }

    #[test]
    fn test_forward_rejects_bad_length() {
        let device = Default::default();
        let config = ForwardConfig { length: 48, ..ForwardConfig::default() };
        let err = ForwardUseCase::new(config)
            .execute::<NdArray>(&small_options(), &device)
            .unwrap_err();
        assert!(format!("{err:#}").contains("not a multiple"));
    }
}
