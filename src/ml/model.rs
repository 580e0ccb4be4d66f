// ============================================================
// Layer 5 — Diffusion Vocoder with Truncated Top
// ============================================================
// A 1D U-Net that denoises a waveform conditioned on discrete
// spectrogram codes, a diffusion timestep and (optionally) a
// reference clip.
//
//   x [B, C, N] ─┬─ slice [start..stop] ─► top_inp_raw ─► top_inp_blocks ─┐
//                │                                                  (stack)
//                └─ cheater_input (stride 2) ─► input_blocks ─► middle     │
//                     ▲ spectrogram fused at chosen levels        │        │
//                     └──────────── skips ──────────► output_blocks        │
//                                                          │               │
//                               slice [start/2..stop/2] ◄──┘               │
//                               top_out_upsample (×2)                      │
//                               top_out_blocks (cat with stack) ◄──────────┘
//                               norm → SiLU → conv ─► [B, out, stop - start]
//
// The main U-Net runs at half resolution on the whole input; only
// the full-resolution top branch is truncated during training.

use std::collections::BTreeSet;

use burn::{
    nn::{conv::Conv1d, GroupNorm, Linear, LinearConfig},
    prelude::*,
    tensor::activation::silu,
};
use rand::Rng;

use crate::error::{CoreError, Result as CoreResult};
use crate::ml::blocks::{
    conv1d, normalization, timestep_embedding, zero_conv1d, AttentionBlockConfig, Downsample, EmbedLayer,
    EmbedSequential, ResBlock, ResBlockConfig, Upsample,
};
use crate::ml::conditioning::{AudioMiniEncoder, AudioMiniEncoderConfig, SpectrogramConditioning};
use crate::ml::plan::{ChannelPlan, DownBlock, NetworkBlockPlanner, SkipStack};
use crate::ml::truncation::{check_input_length, ForwardMode, TopBounds};

/// The main path runs at half the input rate and the fusion undoes that
const TOP_FACTOR: usize = 2;

// ─── Configuration ────────────────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct VocoderConfig {
    pub model_channels: usize,
    #[config(default = 1)]
    pub in_channels: usize,
    /// Mean and variance
    #[config(default = 2)]
    pub out_channels: usize,
    #[config(default = 512)]
    pub discrete_codes: usize,
    #[config(default = 0.0)]
    pub dropout: f64,
    #[config(default = "vec![1.0, 1.5, 2.0, 3.0, 4.0, 6.0, 8.0, 12.0, 16.0, 24.0, 32.0, 48.0]")]
    pub channel_mult: Vec<f32>,
    #[config(default = "vec![1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 2, 2]")]
    pub num_res_blocks: Vec<usize>,
    #[config(default = "vec![512]")]
    pub spectrogram_conditioning_resolutions: Vec<usize>,
    #[config(default = "vec![512, 1024, 2048]")]
    pub attention_resolutions: Vec<usize>,
    #[config(default = true)]
    pub conv_resample: bool,
    #[config(default = 1)]
    pub dims: usize,
    #[config(default = false)]
    pub use_fp16: bool,
    #[config(default = 1)]
    pub num_heads: usize,
    /// Fixed width per attention head; overrides `num_heads` when set
    pub num_head_channels: Option<usize>,
    /// Heads on the up path; falls back to `num_heads`
    pub num_heads_upsample: Option<usize>,
    #[config(default = false)]
    pub use_scale_shift_norm: bool,
    #[config(default = false)]
    pub resblock_updown: bool,
    #[config(default = 3)]
    pub kernel_size: usize,
    #[config(default = 2)]
    pub scale_factor: usize,
    #[config(default = true)]
    pub conditioning_inputs_provided: bool,
    /// Channels of the reference clip; falls back to `in_channels`
    pub conditioning_input_dim: Option<usize>,
    #[config(default = 4)]
    pub time_embed_dim_multiplier: usize,
    #[config(default = false)]
    pub only_train_dvae_connection_layers: bool,
    /// Input lengths must be a multiple of this
    #[config(default = 4096)]
    pub input_multiple: usize,
    #[config(default = 32)]
    pub contextual_base_channels: usize,
    #[config(default = 6)]
    pub contextual_depth: usize,
    #[config(default = 1)]
    pub contextual_resnet_blocks: usize,
    #[config(default = 2)]
    pub contextual_attn_blocks: usize,
    #[config(default = 2)]
    pub contextual_heads: usize,
    #[config(default = 4)]
    pub contextual_downsample_factor: usize,
    #[config(default = 5)]
    pub contextual_kernel_size: usize,
}

impl VocoderConfig {
    pub fn time_embed_dim(&self) -> usize {
        self.model_channels * self.time_embed_dim_multiplier
    }

    /// Validate and lay out every block
    pub fn plan(&self) -> CoreResult<ChannelPlan> {
        if self.dims != 1 {
            return Err(CoreError::UnsupportedDims(self.dims));
        }
        if self.kernel_size % 2 == 0 {
            return Err(CoreError::InvalidConfig(format!(
                "kernel_size must be odd, got {}",
                self.kernel_size
            )));
        }
        if self.in_channels == 0 || self.out_channels == 0 || self.discrete_codes == 0 {
            return Err(CoreError::InvalidConfig("in/out channels and discrete_codes must be positive".into()));
        }

        let plan = NetworkBlockPlanner::from_config(self).plan()?;

        if self.input_multiple == 0 || self.input_multiple % plan.length_unit() != 0 {
            return Err(CoreError::InvalidConfig(format!(
                "input_multiple {} is not a multiple of the network's length unit {}",
                self.input_multiple,
                plan.length_unit()
            )));
        }
        // The training window is half the input and starts on an even
        // sample, so its half-rate image must be whole as well
        if self.input_multiple % 4 != 0 {
            return Err(CoreError::InvalidConfig(format!(
                "input_multiple {} must be divisible by 4 so the top window halves evenly",
                self.input_multiple
            )));
        }
        if !self.conv_resample && !self.resblock_updown && plan.top.upsample_in != plan.top.channels {
            return Err(CoreError::InvalidConfig(format!(
                "top fusion needs {} → {} channels, which requires conv_resample or resblock_updown",
                plan.top.upsample_in, plan.top.channels
            )));
        }
        Ok(plan)
    }

    /// Parameters left trainable after construction
    pub fn trainable_set(&self, plan: &ChannelPlan) -> TrainableSet {
        if !self.only_train_dvae_connection_layers {
            return TrainableSet::All;
        }
        TrainableSet::Only(
            plan.conditioning_blocks()
                .map(|i| format!("input_blocks.{i}.conditioning"))
                .collect(),
        )
    }

    fn res_block(&self, channels: usize, out_channels: usize) -> ResBlockConfig {
        ResBlockConfig::new(channels, out_channels)
            .with_emb_channels(Some(self.time_embed_dim()))
            .with_dropout(self.dropout)
            .with_kernel_size(self.kernel_size)
            .with_use_scale_shift_norm(self.use_scale_shift_norm)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> CoreResult<DiffusionVocoder<B>> {
        let plan = self.plan()?;
        self.init_with_plan(&plan, device)
    }

    pub fn init_with_plan<B: Backend>(&self, plan: &ChannelPlan, device: &B::Device) -> CoreResult<DiffusionVocoder<B>> {
        let mc  = self.model_channels;
        let ted = self.time_embed_dim();

        if self.use_fp16 {
            tracing::warn!("use_fp16 is set; element precision follows the backend's float type");
        }

        let contextual_embedder = if self.conditioning_inputs_provided {
            let encoder = AudioMiniEncoderConfig::new(self.conditioning_input_dim.unwrap_or(self.in_channels), ted)
                .with_base_channels(self.contextual_base_channels)
                .with_depth(self.contextual_depth)
                .with_resnet_blocks(self.contextual_resnet_blocks)
                .with_attn_blocks(self.contextual_attn_blocks)
                .with_num_attn_heads(self.contextual_heads)
                .with_dropout(self.dropout)
                .with_downsample_factor(self.contextual_downsample_factor)
                .with_kernel_size(self.contextual_kernel_size)
                .init(device)?;
            Some(encoder)
        } else {
            None
        };

        // ─── Down path ────────────────────────────────────────────────────────
        let input_blocks = plan
            .down
            .iter()
            .map(|block| self.build_down_block(block, device))
            .collect();

        // ─── Middle ───────────────────────────────────────────────────────────
        let ch = plan.middle_channels;
        let middle_block = EmbedSequential::new(vec![
            EmbedLayer::res(self.res_block(ch, ch).init(device)),
            EmbedLayer::attention(AttentionBlockConfig::new(ch, plan.middle_heads).init(device)),
            EmbedLayer::res(self.res_block(ch, ch).init(device)),
        ]);

        // ─── Up path ──────────────────────────────────────────────────────────
        let output_blocks = plan
            .up
            .iter()
            .map(|block| {
                let mut layers = vec![EmbedLayer::res(self.res_block(block.in_channels, block.out_channels).init(device))];
                if let Some(heads) = block.attention_heads {
                    layers.push(EmbedLayer::attention(AttentionBlockConfig::new(block.out_channels, heads).init(device)));
                }
                if block.upsample {
                    layers.push(self.upsample_layer(block.out_channels, block.out_channels, self.scale_factor, device));
                }
                EmbedSequential::new(layers)
            })
            .collect();

        // ─── Top branch ───────────────────────────────────────────────────────
        let top = &plan.top;
        let top_inp_blocks = (0..top.blocks).map(|_| self.res_block(mc, mc).init(device)).collect();
        let top_out_blocks = (0..top.blocks).map(|_| self.res_block(2 * mc, mc).init(device)).collect();

        let trainable = self.trainable_set(plan);
        tracing::info!(
            "Vocoder: {} levels, {} input blocks, {} output blocks, emb {} ({})",
            plan.levels.len(),
            plan.down.len(),
            plan.up.len(),
            ted,
            trainable
        );

        Ok(DiffusionVocoder {
            time_embed_in:    LinearConfig::new(mc, ted).init(device),
            time_embed_out:   LinearConfig::new(ted, ted).init(device),
            contextual_embedder,
            cheater_input:    conv1d(self.in_channels, mc / 2, self.kernel_size, 2, device),
            input_blocks,
            middle_block,
            output_blocks,
            top_inp_raw:      conv1d(self.in_channels, mc, self.kernel_size, 1, device),
            top_inp_blocks,
            top_out_upsample: self.upsample_layer(top.upsample_in, mc, TOP_FACTOR, device),
            top_out_blocks,
            top_out_norm:     normalization(mc, device),
            top_out_conv:     zero_conv1d(mc, self.out_channels, self.kernel_size, device),
            model_channels:   mc,
            input_multiple:   self.input_multiple,
        })
    }

    fn build_down_block<B: Backend>(&self, block: &DownBlock, device: &B::Device) -> InputBlock<B> {
        match block {
            DownBlock::Input { out_channels } => InputBlock::body(EmbedSequential::new(vec![EmbedLayer::conv(
                conv1d(self.model_channels / 2, *out_channels, self.kernel_size, 1, device),
            )])),
            DownBlock::Conditioning { channels, .. } => {
                InputBlock::conditioning(SpectrogramConditioning::new(self.discrete_codes, *channels, device))
            }
            DownBlock::Residual { in_channels, out_channels, attention_heads, .. } => {
                let mut layers = vec![EmbedLayer::res(self.res_block(*in_channels, *out_channels).init(device))];
                if let Some(heads) = attention_heads {
                    layers.push(EmbedLayer::attention(AttentionBlockConfig::new(*out_channels, *heads).init(device)));
                }
                InputBlock::body(EmbedSequential::new(layers))
            }
            DownBlock::Downsample { channels, resblock, .. } => {
                let layer = if *resblock {
                    EmbedLayer::res(
                        self.res_block(*channels, *channels)
                            .with_down(true)
                            .with_factor(self.scale_factor)
                            .init(device),
                    )
                } else {
                    EmbedLayer::downsample(Downsample::new(
                        *channels,
                        *channels,
                        self.conv_resample,
                        self.scale_factor,
                        device,
                    ))
                };
                InputBlock::body(EmbedSequential::new(vec![layer]))
            }
        }
    }

    fn upsample_layer<B: Backend>(&self, channels: usize, out_channels: usize, factor: usize, device: &B::Device) -> EmbedLayer<B> {
        if self.resblock_updown {
            EmbedLayer::res(
                self.res_block(channels, out_channels)
                    .with_up(true)
                    .with_factor(factor)
                    .init(device),
            )
        } else {
            EmbedLayer::upsample(Upsample::new(channels, out_channels, self.conv_resample, factor, device))
        }
    }
}

// ─── TrainableSet ─────────────────────────────────────────────────────────────
/// Which parameters an optimizer should update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainableSet {
    All,
    /// Module paths whose parameters (and their descendants') train
    Only(BTreeSet<String>),
}

impl TrainableSet {
    pub fn is_trainable(&self, path: &str) -> bool {
        match self {
            TrainableSet::All => true,
            TrainableSet::Only(prefixes) => prefixes
                .iter()
                .any(|p| path == p || path.strip_prefix(p.as_str()).is_some_and(|rest| rest.starts_with('.'))),
        }
    }
}

impl std::fmt::Display for TrainableSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrainableSet::All => f.write_str("all parameters trainable"),
            TrainableSet::Only(paths) => write!(f, "{} module(s) trainable", paths.len()),
        }
    }
}

// ─── Modules ──────────────────────────────────────────────────────────────────

/// Down-path entry: a spectrogram fusion or an embedded stack
#[derive(Module, Debug)]
pub struct InputBlock<B: Backend> {
    conditioning: Option<SpectrogramConditioning<B>>,
    body:         Option<EmbedSequential<B>>,
}

impl<B: Backend> InputBlock<B> {
    fn conditioning(block: SpectrogramConditioning<B>) -> Self {
        Self { conditioning: Some(block), body: None }
    }

    fn body(body: EmbedSequential<B>) -> Self {
        Self { conditioning: None, body: Some(body) }
    }
}

#[derive(Module, Debug)]
pub struct DiffusionVocoder<B: Backend> {
    time_embed_in:       Linear<B>,
    time_embed_out:      Linear<B>,
    contextual_embedder: Option<AudioMiniEncoder<B>>,
    cheater_input:       Conv1d<B>,
    input_blocks:        Vec<InputBlock<B>>,
    middle_block:        EmbedSequential<B>,
    output_blocks:       Vec<EmbedSequential<B>>,
    top_inp_raw:         Conv1d<B>,
    top_inp_blocks:      Vec<ResBlock<B>>,
    top_out_upsample:    EmbedLayer<B>,
    top_out_blocks:      Vec<ResBlock<B>>,
    top_out_norm:        GroupNorm<B>,
    top_out_conv:        Conv1d<B>,
    model_channels:      usize,
    input_multiple:      usize,
}

/// Forward result: the denoised window and where it sits in the input
#[derive(Debug, Clone)]
pub struct VocoderOutput<B: Backend> {
    /// [batch, out_channels, bounds.len()]
    pub output: Tensor<B, 3>,
    pub bounds: TopBounds,
}

impl<B: Backend> DiffusionVocoder<B> {
    /// Parameters that `set` leaves trainable
    pub fn trainable_params(&self, set: &TrainableSet) -> usize {
        match set {
            TrainableSet::All => self.num_params(),
            TrainableSet::Only(_) => self
                .input_blocks
                .iter()
                .enumerate()
                .filter(|(i, _)| set.is_trainable(&format!("input_blocks.{i}.conditioning")))
                .filter_map(|(_, b)| b.conditioning.as_ref())
                .map(|c| c.num_params())
                .sum(),
        }
    }

    /// x: [B, C, N], timesteps: [B], spectrogram: [B, codes, M],
    /// conditioning: [B, C_ref, N_ref] when the contextual encoder is on
    pub fn forward<R: Rng + ?Sized>(
        &self,
        x:            Tensor<B, 3>,
        timesteps:    Tensor<B, 1, Int>,
        spectrogram:  Tensor<B, 3>,
        conditioning: Option<Tensor<B, 3>>,
        mode:         ForwardMode,
        rng:          &mut R,
    ) -> CoreResult<VocoderOutput<B>> {
        let [batch, channels, len] = x.dims();
        check_input_length(len, self.input_multiple)?;

        let emb = self.time_embed_out.forward(silu(
            self.time_embed_in.forward(timestep_embedding(timesteps, self.model_channels)),
        ));
        let emb = match &self.contextual_embedder {
            Some(encoder) => {
                let reference = conditioning.ok_or(CoreError::MissingConditioning)?;
                emb + encoder.forward(reference)
            }
            None => emb,
        };

        // ─── Top branch on the chosen window ──────────────────────────────────
        let bounds        = TopBounds::choose(len, mode, rng);
        let mut top_stack = SkipStack::new();
        let mut ht        = self.top_inp_raw.forward(x.clone().slice([0..batch, 0..channels, bounds.range()]));
        for block in &self.top_inp_blocks {
            ht = block.forward(ht, Some(emb.clone()));
            top_stack.push(ht.clone());
        }

        // ─── U-Net on the whole input at half rate ────────────────────────────
        let mut h  = self.cheater_input.forward(x);
        let mut hs = SkipStack::new();
        for block in &self.input_blocks {
            if let Some(cond) = &block.conditioning {
                h = cond.forward(h, spectrogram.clone());
            } else if let Some(body) = &block.body {
                h = body.forward(h, &emb);
                hs.push(h.clone());
            }
        }
        h = self.middle_block.forward(h, &emb);
        for (i, block) in self.output_blocks.iter().enumerate() {
            let skip = hs.pop(i)?;
            h = block.forward(Tensor::cat(vec![h, skip], 1), &emb);
        }
        hs.finish()?;

        // ─── Fuse ─────────────────────────────────────────────────────────────
        let [_, h_channels, _] = h.dims();
        let mut hb = self.top_out_upsample.forward(h.slice([0..batch, 0..h_channels, bounds.half()]), &emb);
        for (i, block) in self.top_out_blocks.iter().enumerate() {
            let skip = top_stack.pop(i)?;
            hb = block.forward(Tensor::cat(vec![hb, skip], 1), Some(emb.clone()));
        }
        top_stack.finish()?;

        let output = self.top_out_conv.forward(silu(self.top_out_norm.forward(hb)));
        tracing::debug!("Vocoder forward: len {} → window {}..{}", len, bounds.start, bounds.stop);
        Ok(VocoderOutput { output, bounds })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    type TestBackend = NdArray;

    #[test]
    fn test_input_multiple_must_quarter() {
        let single = small_config()
            .with_channel_mult(vec![1.0])
            .with_num_res_blocks(vec![1])
            .with_attention_resolutions(vec![]);
        let err = single.clone().with_input_multiple(6).plan().unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig(_)));
        assert!(single.with_input_multiple(8).plan().is_ok());
    }

    #[test]
    fn test_config_file_reloads() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocoder.json");
        small_config().with_num_heads_upsample(Some(2)).save(&path).unwrap();

        let loaded = VocoderConfig::load(&path).unwrap();
        assert_eq!(loaded.channel_mult, vec![1.0, 2.0]);
        assert_eq!(loaded.num_heads_upsample, Some(2));
        assert_eq!(loaded.input_multiple, 64);
        assert!(loaded.plan().is_ok());
    }

    fn small_config() -> VocoderConfig {
        VocoderConfig::new(32)
            .with_discrete_codes(16)
            .with_channel_mult(vec![1.0, 2.0])
            .with_num_res_blocks(vec![1, 1])
            .with_attention_resolutions(vec![2])
            .with_spectrogram_conditioning_resolutions(vec![1])
            .with_time_embed_dim_multiplier(2)
            .with_contextual_base_channels(8)
            .with_contextual_depth(2)
            .with_input_multiple(64)
    }

    struct Inputs {
        x:    Tensor<TestBackend, 3>,
        t:    Tensor<TestBackend, 1, Int>,
        mel:  Tensor<TestBackend, 3>,
        cond: Tensor<TestBackend, 3>,
    }

    fn inputs(len: usize) -> Inputs {
        let device = Default::default();
        Inputs {
            x:    Tensor::random([2, 1, len], Distribution::Normal(0.0, 1.0), &device),
            t:    Tensor::from_ints([5, 900].as_slice(), &device),
            mel:  Tensor::random([2, 16, 12], Distribution::Default, &device),
            cond: Tensor::random([2, 1, 200], Distribution::Normal(0.0, 1.0), &device),
        }
    }

    #[test]
    fn test_train_forward_returns_half_window() {
        let device = Default::default();
        let model: DiffusionVocoder<TestBackend> = small_config().init(&device).unwrap();
        let i = inputs(128);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let out = model.forward(i.x, i.t, i.mel, Some(i.cond), ForwardMode::Train, &mut rng).unwrap();
        assert_eq!(out.output.dims(), [2, 2, 64]);
        assert_eq!(out.bounds.len(), 64);
        assert_eq!(out.bounds.start % 2, 0);
    }

    #[test]
    fn test_eval_forward_covers_input() {
        let device = Default::default();
        let model: DiffusionVocoder<TestBackend> = small_config().init(&device).unwrap();
        let i = inputs(128);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let out = model.forward(i.x, i.t, i.mel, Some(i.cond), ForwardMode::Eval, &mut rng).unwrap();
        assert_eq!(out.output.dims(), [2, 2, 128]);
        assert_eq!(out.bounds, TopBounds { start: 0, stop: 128 });
    }

    #[test]
    fn test_updown_resblocks_and_scale_shift() {
        let device = Default::default();
        let config = small_config()
            .with_resblock_updown(true)
            .with_use_scale_shift_norm(true)
            .with_conditioning_inputs_provided(false);
        let model: DiffusionVocoder<TestBackend> = config.init(&device).unwrap();
        let i = inputs(64);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let out = model.forward(i.x, i.t, i.mel, None, ForwardMode::Eval, &mut rng).unwrap();
        assert_eq!(out.output.dims(), [2, 2, 64]);
    }

    #[test]
    fn test_rejects_ragged_length() {
        let device = Default::default();
        let model: DiffusionVocoder<TestBackend> = small_config().init(&device).unwrap();
        let i = inputs(100);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let err = model.forward(i.x, i.t, i.mel, Some(i.cond), ForwardMode::Train, &mut rng).unwrap_err();
        assert!(matches!(err, CoreError::InputLength { len: 100, unit: 64 }));
    }

    #[test]
    fn test_missing_reference_clip() {
        let device = Default::default();
        let model: DiffusionVocoder<TestBackend> = small_config().init(&device).unwrap();
        let i = inputs(64);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let err = model.forward(i.x, i.t, i.mel, None, ForwardMode::Eval, &mut rng).unwrap_err();
        assert!(matches!(err, CoreError::MissingConditioning));
    }

    #[test]
    fn test_default_base_unit_is_4096() {
        let config = VocoderConfig::new(32);
        assert_eq!(config.input_multiple, 4096);
        let plan = config.plan().unwrap();
        assert_eq!(plan.levels.len(), 12);
        assert_eq!(4096 % plan.length_unit(), 0);
    }

    #[test]
    fn test_config_errors() {
        let dims = small_config().with_dims(2).plan().unwrap_err();
        assert!(matches!(dims, CoreError::UnsupportedDims(2)));

        let unit = small_config().with_input_multiple(6).plan().unwrap_err();
        assert!(matches!(unit, CoreError::InvalidConfig(_)));

        let lists = small_config().with_num_res_blocks(vec![1]).plan().unwrap_err();
        assert!(matches!(lists, CoreError::InvalidConfig(_)));
    }

    #[test]
    fn test_only_conditioning_layers_train() {
        let device = Default::default();
        let config = small_config().with_only_train_dvae_connection_layers(true);
        let plan   = config.plan().unwrap();
        let set    = config.trainable_set(&plan);

        assert!(set.is_trainable("input_blocks.1.conditioning"));
        assert!(set.is_trainable("input_blocks.1.conditioning.proj.weight"));
        assert!(!set.is_trainable("input_blocks.10.conditioning"));
        assert!(!set.is_trainable("middle_block.layers.0"));

        let model: DiffusionVocoder<TestBackend> = config.init_with_plan(&plan, &device).unwrap();
        let trainable = model.trainable_params(&set);
        assert!(trainable > 0);
        assert!(trainable < model.num_params());
        assert_eq!(model.trainable_params(&TrainableSet::All), model.num_params());
    }

    #[test]
    fn test_config_survives_json() {
        let config = small_config();
        let json   = serde_json::to_string(&config).unwrap();
        let back: VocoderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.channel_mult, vec![1.0, 2.0]);
        assert_eq!(back.input_multiple, 64);
        assert_eq!(back.num_head_channels, None);
    }
}
