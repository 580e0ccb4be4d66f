// ============================================================
// Layer 5 — Conditioning Inputs
// ============================================================
// Two ways outside information enters the vocoder:
//
//   SpectrogramConditioning
//     Discrete spectrogram codes [B, codes, M] are projected,
//     normalised, convolved and nearest-resized to the trunk's
//     current length, then concatenated onto the trunk:
//       [B, C, S] → [B, 2C, S]
//
//   AudioMiniEncoder
//     A reference clip [B, C_ref, N_ref] is reduced to one
//     embedding vector [B, E] that is added to the timestep
//     embedding:
//       conv stem → (res ×r, strided down ×4, ch×2) ×depth
//       → norm/SiLU/1×1 conv → attention ×a → first frame

use burn::{
    nn::{
        conv::{Conv1d, Conv1dConfig},
        GroupNorm,
    },
    prelude::*,
    tensor::activation::silu,
};

use crate::error::{CoreError, Result as CoreResult};
use crate::ml::blocks::{
    conv1d, normalization, resize_nearest, AttentionBlock, AttentionBlockConfig, Downsample, ResBlock,
    ResBlockConfig,
};

// ─── SpectrogramConditioning ──────────────────────────────────────────────────

#[derive(Module, Debug)]
pub struct SpectrogramConditioning<B: Backend> {
    proj: Conv1d<B>,
    norm: GroupNorm<B>,
    conv: Conv1d<B>,
}

impl<B: Backend> SpectrogramConditioning<B> {
    pub fn new(discrete_codes: usize, channels: usize, device: &B::Device) -> Self {
        Self {
            proj: conv1d(discrete_codes, channels, 1, 1, device),
            norm: normalization(channels, device),
            // Unpadded: the resize below absorbs the two lost frames
            conv: Conv1dConfig::new(channels, channels, 3).init(device),
        }
    }

    /// x: [B, C, S], codes: [B, discrete_codes, M] with M ≥ 3 → [B, 2C, S]
    pub fn forward(&self, x: Tensor<B, 3>, codes: Tensor<B, 3>) -> Tensor<B, 3> {
        let [_, _, len] = x.dims();
        let emb = self.conv.forward(silu(self.norm.forward(self.proj.forward(codes))));
        let emb = resize_nearest(emb, len);
        Tensor::cat(vec![x, emb], 1)
    }
}

// ─── AudioMiniEncoder ─────────────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct AudioMiniEncoderConfig {
    pub in_channels:   usize,
    pub embedding_dim: usize,
    #[config(default = 32)]
    pub base_channels: usize,
    #[config(default = 6)]
    pub depth: usize,
    #[config(default = 1)]
    pub resnet_blocks: usize,
    #[config(default = 2)]
    pub attn_blocks: usize,
    #[config(default = 2)]
    pub num_attn_heads: usize,
    #[config(default = 0.0)]
    pub dropout: f64,
    #[config(default = 4)]
    pub downsample_factor: usize,
    #[config(default = 5)]
    pub kernel_size: usize,
}

impl AudioMiniEncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> CoreResult<AudioMiniEncoder<B>> {
        if self.num_attn_heads == 0 || self.embedding_dim % self.num_attn_heads != 0 {
            return Err(CoreError::InvalidConfig(format!(
                "contextual embedding of {} channels cannot be split into {} heads",
                self.embedding_dim, self.num_attn_heads
            )));
        }
        if self.in_channels == 0 || self.base_channels == 0 {
            return Err(CoreError::InvalidConfig("contextual encoder needs non-zero widths".into()));
        }

        let mut ch     = self.base_channels;
        let mut stages = Vec::with_capacity(self.depth);
        for _ in 0..self.depth {
            let res = (0..self.resnet_blocks)
                .map(|_| {
                    ResBlockConfig::new(ch, ch)
                        .with_dropout(self.dropout)
                        .with_kernel_size(self.kernel_size)
                        .init(device)
                })
                .collect();
            let down = Downsample::strided(ch, ch * 2, 5, self.downsample_factor, device);
            stages.push(EncoderStage { res, down });
            ch *= 2;
        }

        let attn = (0..self.attn_blocks)
            .map(|_| AttentionBlockConfig::new(self.embedding_dim, self.num_attn_heads).init(device))
            .collect();

        Ok(AudioMiniEncoder {
            stem:       conv1d(self.in_channels, self.base_channels, 3, 1, device),
            stages,
            final_norm: normalization(ch, device),
            final_conv: conv1d(ch, self.embedding_dim, 1, 1, device),
            attn,
        })
    }
}

#[derive(Module, Debug)]
pub struct EncoderStage<B: Backend> {
    res:  Vec<ResBlock<B>>,
    down: Downsample<B>,
}

#[derive(Module, Debug)]
pub struct AudioMiniEncoder<B: Backend> {
    stem:       Conv1d<B>,
    stages:     Vec<EncoderStage<B>>,
    final_norm: GroupNorm<B>,
    final_conv: Conv1d<B>,
    attn:       Vec<AttentionBlock<B>>,
}

impl<B: Backend> AudioMiniEncoder<B> {
    /// [B, in_channels, N] → [B, embedding_dim]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 2> {
        let mut h = self.stem.forward(x);
        for stage in &self.stages {
            for block in &stage.res {
                h = block.forward(h, None);
            }
            h = stage.down.forward(h);
        }
        let mut h = self.final_conv.forward(silu(self.final_norm.forward(h)));
        for block in &self.attn {
            h = block.forward(h);
        }
        let [batch, channels, _] = h.dims();
        h.slice([0..batch, 0..channels, 0..1]).reshape([batch, channels])
    }
}
