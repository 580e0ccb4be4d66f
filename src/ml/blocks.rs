// ============================================================
// Layer 5 — Network Building Blocks
// ============================================================
// The 1D layers the vocoder is assembled from:
//
//   timestep_embedding  sinusoidal embedding of diffusion steps
//   ResBlock            norm → SiLU → conv, timestep injection,
//                       norm → SiLU → dropout → conv, plus a skip.
//                       Optionally resamples inside (strided
//                       residual up/down) and optionally applies
//                       the embedding as scale/shift (FiLM).
//   AttentionBlock      group norm + multi-head self-attention
//                       over the time axis, residual.
//   Downsample          strided conv or average pooling
//   Upsample            nearest repeat, optional conv
//   EmbedLayer          one of the above behind a common forward
//   EmbedSequential     a list of EmbedLayers sharing one embedding
//
// Tensors are [batch, channels, length] throughout.

use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        conv::{Conv1d, Conv1dConfig},
        Dropout, DropoutConfig, GroupNorm, GroupNormConfig, Initializer, Linear, LinearConfig,
        PaddingConfig1d,
    },
    prelude::*,
    tensor::activation::silu,
};

/// Upper bound on normalisation groups
const NORM_GROUPS: usize = 32;

/// Period of the slowest timestep frequency
const MAX_PERIOD: f64 = 10_000.0;

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// Largest group count ≤ 32 that divides `channels`
pub fn norm_groups(channels: usize) -> usize {
    let (mut a, mut b) = (NORM_GROUPS, channels);
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a.max(1)
}

/// Group normalisation used by every block
pub fn normalization<B: Backend>(channels: usize, device: &B::Device) -> GroupNorm<B> {
    GroupNormConfig::new(norm_groups(channels), channels).init(device)
}

/// "Same"-padded 1D convolution
pub fn conv1d<B: Backend>(
    channels_in:  usize,
    channels_out: usize,
    kernel_size:  usize,
    stride:       usize,
    device:       &B::Device,
) -> Conv1d<B> {
    Conv1dConfig::new(channels_in, channels_out, kernel_size)
        .with_stride(stride)
        .with_padding(PaddingConfig1d::Explicit(kernel_size / 2))
        .init(device)
}

/// Same-padded convolution whose weights start at zero
pub fn zero_conv1d<B: Backend>(
    channels_in:  usize,
    channels_out: usize,
    kernel_size:  usize,
    device:       &B::Device,
) -> Conv1d<B> {
    Conv1dConfig::new(channels_in, channels_out, kernel_size)
        .with_padding(PaddingConfig1d::Explicit(kernel_size / 2))
        .with_initializer(Initializer::Zeros)
        .init(device)
}

/// Sinusoidal embedding of integer timesteps: [n] → [n, dim]
pub fn timestep_embedding<B: Backend>(timesteps: Tensor<B, 1, Int>, dim: usize) -> Tensor<B, 2> {
    let device = timesteps.device();
    let [n]    = timesteps.dims();
    let half   = dim / 2;

    let freqs = Tensor::<B, 1, Int>::arange(0..half as i64, &device)
        .float()
        .mul_scalar(-MAX_PERIOD.ln() / half as f64)
        .exp();

    let args = timesteps.float().unsqueeze_dim::<2>(1).expand([n, half])
        * freqs.unsqueeze_dim::<2>(0).expand([n, half]);
    let emb  = Tensor::cat(vec![args.clone().cos(), args.sin()], 1);

    if dim % 2 == 1 {
        Tensor::cat(vec![emb, Tensor::zeros([n, 1], &device)], 1)
    } else {
        emb
    }
}

/// Repeat every sample `factor` times along the length axis
pub fn upsample_nearest<B: Backend>(x: Tensor<B, 3>, factor: usize) -> Tensor<B, 3> {
    let [_, _, len] = x.dims();
    resize_nearest(x, len * factor)
}

/// Nearest-neighbour resize of the length axis to `size`
pub fn resize_nearest<B: Backend>(x: Tensor<B, 3>, size: usize) -> Tensor<B, 3> {
    let [_, _, len] = x.dims();
    if len == size {
        return x;
    }
    let indices: Vec<i32> = (0..size).map(|i| (i * len / size) as i32).collect();
    let indices = Tensor::<B, 1, Int>::from_ints(indices.as_slice(), &x.device());
    x.select(2, indices)
}

/// Average every `factor` consecutive samples; a ragged tail is dropped
pub fn downsample_avg<B: Backend>(x: Tensor<B, 3>, factor: usize) -> Tensor<B, 3> {
    let [batch, channels, len] = x.dims();
    let out = len / factor;
    x.slice([0..batch, 0..channels, 0..out * factor])
        .reshape([batch, channels, out, factor])
        .mean_dim(3)
        .reshape([batch, channels, out])
}

// ─── Downsample / Upsample ────────────────────────────────────────────────────

#[derive(Module, Debug)]
pub struct Downsample<B: Backend> {
    conv:   Option<Conv1d<B>>,
    factor: usize,
}

impl<B: Backend> Downsample<B> {
    /// Strided conv when `use_conv`, otherwise average pooling (which
    /// keeps the channel count, so `out_channels` must equal `channels`)
    pub fn new(channels: usize, out_channels: usize, use_conv: bool, factor: usize, device: &B::Device) -> Self {
        let conv = use_conv.then(|| conv1d(channels, out_channels, 3, factor, device));
        Self { conv, factor }
    }

    /// Strided conv with a wider kernel
    pub fn strided(channels: usize, out_channels: usize, kernel_size: usize, factor: usize, device: &B::Device) -> Self {
        Self { conv: Some(conv1d(channels, out_channels, kernel_size, factor, device)), factor }
    }

    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        match &self.conv {
            Some(conv) => conv.forward(x),
            None => downsample_avg(x, self.factor),
        }
    }
}

#[derive(Module, Debug)]
pub struct Upsample<B: Backend> {
    conv:   Option<Conv1d<B>>,
    factor: usize,
}

impl<B: Backend> Upsample<B> {
    pub fn new(channels: usize, out_channels: usize, use_conv: bool, factor: usize, device: &B::Device) -> Self {
        let conv = use_conv.then(|| conv1d(channels, out_channels, 3, 1, device));
        Self { conv, factor }
    }

    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let x = upsample_nearest(x, self.factor);
        match &self.conv {
            Some(conv) => conv.forward(x),
            None => x,
        }
    }
}

// ─── ResBlock ─────────────────────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct ResBlockConfig {
    pub channels:     usize,
    pub out_channels: usize,
    /// Width of the timestep embedding; `None` builds an unconditioned block
    pub emb_channels: Option<usize>,
    #[config(default = 0.0)]
    pub dropout: f64,
    #[config(default = 3)]
    pub kernel_size: usize,
    #[config(default = false)]
    pub use_scale_shift_norm: bool,
    #[config(default = false)]
    pub up: bool,
    #[config(default = false)]
    pub down: bool,
    #[config(default = 2)]
    pub factor: usize,
}

impl ResBlockConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ResBlock<B> {
        let emb_width = if self.use_scale_shift_norm { 2 * self.out_channels } else { self.out_channels };
        let emb_proj  = self
            .emb_channels
            .map(|emb| LinearConfig::new(emb, emb_width).init(device));
        let skip = (self.channels != self.out_channels)
            .then(|| conv1d(self.channels, self.out_channels, 1, 1, device));

        ResBlock {
            in_norm:  normalization(self.channels, device),
            in_conv:  conv1d(self.channels, self.out_channels, self.kernel_size, 1, device),
            emb_proj,
            out_norm: normalization(self.out_channels, device),
            dropout:  DropoutConfig::new(self.dropout).init(),
            out_conv: zero_conv1d(self.out_channels, self.out_channels, self.kernel_size, device),
            skip,
            up:       self.up,
            down:     self.down,
            factor:   self.factor,
            use_scale_shift_norm: self.use_scale_shift_norm,
        }
    }
}

#[derive(Module, Debug)]
pub struct ResBlock<B: Backend> {
    in_norm:  GroupNorm<B>,
    in_conv:  Conv1d<B>,
    emb_proj: Option<Linear<B>>,
    out_norm: GroupNorm<B>,
    dropout:  Dropout,
    out_conv: Conv1d<B>,
    skip:     Option<Conv1d<B>>,
    up:       bool,
    down:     bool,
    factor:   usize,
    use_scale_shift_norm: bool,
}

impl<B: Backend> ResBlock<B> {
    /// x: [batch, channels, len], emb: [batch, emb_channels]
    pub fn forward(&self, x: Tensor<B, 3>, emb: Option<Tensor<B, 2>>) -> Tensor<B, 3> {
        let h = silu(self.in_norm.forward(x.clone()));
        let (h, x) = if self.up {
            (upsample_nearest(h, self.factor), upsample_nearest(x, self.factor))
        } else if self.down {
            (downsample_avg(h, self.factor), downsample_avg(x, self.factor))
        } else {
            (h, x)
        };
        let h = self.in_conv.forward(h);
        let [batch, channels, len] = h.dims();

        let h = match (&self.emb_proj, emb) {
            (Some(proj), Some(emb)) => {
                let emb_out = proj.forward(silu(emb)).unsqueeze_dim::<3>(2);
                if self.use_scale_shift_norm {
                    let scale = emb_out.clone().slice([0..batch, 0..channels, 0..1]);
                    let shift = emb_out.slice([0..batch, channels..2 * channels, 0..1]);
                    let h = self.out_norm.forward(h) * scale.add_scalar(1.0).expand([batch, channels, len])
                        + shift.expand([batch, channels, len]);
                    self.out_conv.forward(self.dropout.forward(silu(h)))
                } else {
                    self.out_layers(h + emb_out.expand([batch, channels, len]))
                }
            }
            _ => self.out_layers(h),
        };

        let skip = match &self.skip {
            Some(conv) => conv.forward(x),
            None => x,
        };
        skip + h
    }

    fn out_layers(&self, h: Tensor<B, 3>) -> Tensor<B, 3> {
        self.out_conv.forward(self.dropout.forward(silu(self.out_norm.forward(h))))
    }
}

// ─── AttentionBlock ───────────────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct AttentionBlockConfig {
    pub channels:  usize,
    pub num_heads: usize,
}

impl AttentionBlockConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> AttentionBlock<B> {
        AttentionBlock {
            norm: normalization(self.channels, device),
            attn: MultiHeadAttentionConfig::new(self.channels, self.num_heads)
                .with_dropout(0.0)
                .init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct AttentionBlock<B: Backend> {
    norm: GroupNorm<B>,
    attn: MultiHeadAttention<B>,
}

impl<B: Backend> AttentionBlock<B> {
    /// Self-attention over the length axis, added back onto x
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let h = self.norm.forward(x.clone()).swap_dims(1, 2);
        let h = self.attn.forward(MhaInput::self_attn(h)).context.swap_dims(1, 2);
        x + h
    }
}

// ─── EmbedLayer / EmbedSequential ─────────────────────────────────────────────
// A stage of the U-Net is a short list of heterogeneous layers that
// all see the same timestep embedding. Exactly one field of an
// EmbedLayer is set.

#[derive(Module, Debug)]
pub struct EmbedLayer<B: Backend> {
    conv: Option<Conv1d<B>>,
    res:  Option<ResBlock<B>>,
    attn: Option<AttentionBlock<B>>,
    down: Option<Downsample<B>>,
    up:   Option<Upsample<B>>,
}

impl<B: Backend> EmbedLayer<B> {
    fn empty() -> Self {
        Self { conv: None, res: None, attn: None, down: None, up: None }
    }

    pub fn conv(conv: Conv1d<B>) -> Self {
        Self { conv: Some(conv), ..Self::empty() }
    }

    pub fn res(res: ResBlock<B>) -> Self {
        Self { res: Some(res), ..Self::empty() }
    }

    pub fn attention(attn: AttentionBlock<B>) -> Self {
        Self { attn: Some(attn), ..Self::empty() }
    }

    pub fn downsample(down: Downsample<B>) -> Self {
        Self { down: Some(down), ..Self::empty() }
    }

    pub fn upsample(up: Upsample<B>) -> Self {
        Self { up: Some(up), ..Self::empty() }
    }

    pub fn forward(&self, x: Tensor<B, 3>, emb: &Tensor<B, 2>) -> Tensor<B, 3> {
        if let Some(conv) = &self.conv {
            conv.forward(x)
        } else if let Some(res) = &self.res {
            res.forward(x, Some(emb.clone()))
        } else if let Some(attn) = &self.attn {
            attn.forward(x)
        } else if let Some(down) = &self.down {
            down.forward(x)
        } else if let Some(up) = &self.up {
            up.forward(x)
        } else {
            x
        }
    }
}

#[derive(Module, Debug)]
pub struct EmbedSequential<B: Backend> {
    layers: Vec<EmbedLayer<B>>,
}

impl<B: Backend> EmbedSequential<B> {
    pub fn new(layers: Vec<EmbedLayer<B>>) -> Self {
        Self { layers }
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn forward(&self, x: Tensor<B, 3>, emb: &Tensor<B, 2>) -> Tensor<B, 3> {
        self.layers.iter().fold(x, |h, layer| layer.forward(h, emb))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn ramp(batch: usize, channels: usize, len: usize) -> Tensor<TestBackend, 3> {
        let device = Default::default();
        Tensor::<TestBackend, 1, Int>::arange(0..(batch * channels * len) as i64, &device)
            .float()
            .reshape([batch, channels, len])
    }

    #[test]
    fn test_norm_groups_divide_channels() {
        assert_eq!(norm_groups(64), 32);
        assert_eq!(norm_groups(48), 16);
        assert_eq!(norm_groups(3), 1);
        for ch in 1..200 {
            assert_eq!(ch % norm_groups(ch), 0);
        }
    }

    #[test]
    fn test_timestep_embedding_shape_and_zero_step() {
        let device = Default::default();
        let t   = Tensor::<TestBackend, 1, Int>::from_ints([0, 10, 500].as_slice(), &device);
        let emb = timestep_embedding(t, 8);
        assert_eq!(emb.dims(), [3, 8]);

        // Step 0 → cos = 1, sin = 0
        let row: Vec<f32> = emb.slice([0..1, 0..8]).into_data().to_vec::<f32>().unwrap();
        assert!(row[..4].iter().all(|v| (v - 1.0).abs() < 1e-6));
        assert!(row[4..].iter().all(|v| v.abs() < 1e-6));
    }

    #[test]
    fn test_odd_embedding_is_padded() {
        let device = Default::default();
        let t = Tensor::<TestBackend, 1, Int>::from_ints([1, 2].as_slice(), &device);
        assert_eq!(timestep_embedding(t, 7).dims(), [2, 7]);
    }

    #[test]
    fn test_nearest_resampling() {
        let x  = ramp(1, 1, 4);
        let up = upsample_nearest(x.clone(), 2);
        let v: Vec<f32> = up.into_data().to_vec::<f32>().unwrap();
        assert_eq!(v, vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);

        let down: Vec<f32> = resize_nearest(x, 2).into_data().to_vec::<f32>().unwrap();
        assert_eq!(down, vec![0.0, 2.0]);
    }

    #[test]
    fn test_average_downsample() {
        let v: Vec<f32> = downsample_avg(ramp(1, 1, 6), 2).into_data().to_vec::<f32>().unwrap();
        assert_eq!(v, vec![0.5, 2.5, 4.5]);
    }

    #[test]
    fn test_resblock_changes_width_and_resamples() {
        let device = Default::default();
        let emb    = Tensor::<TestBackend, 2>::zeros([2, 16], &device);

        let block: ResBlock<TestBackend> = ResBlockConfig::new(8, 12).with_emb_channels(Some(16)).init(&device);
        assert_eq!(block.forward(ramp(2, 8, 10), Some(emb.clone())).dims(), [2, 12, 10]);

        let down: ResBlock<TestBackend> = ResBlockConfig::new(8, 8)
            .with_emb_channels(Some(16))
            .with_down(true)
            .init(&device);
        assert_eq!(down.forward(ramp(2, 8, 10), Some(emb.clone())).dims(), [2, 8, 5]);

        let up: ResBlock<TestBackend> = ResBlockConfig::new(8, 8)
            .with_emb_channels(Some(16))
            .with_up(true)
            .with_use_scale_shift_norm(true)
            .init(&device);
        assert_eq!(up.forward(ramp(2, 8, 10), Some(emb)).dims(), [2, 8, 20]);
    }

    #[test]
    fn test_attention_keeps_shape() {
        let device = Default::default();
        let block: AttentionBlock<TestBackend> = AttentionBlockConfig::new(16, 2).init(&device);
        assert_eq!(block.forward(ramp(1, 16, 12)).dims(), [1, 16, 12]);
    }

    #[test]
    fn test_strided_downsample_halves_length() {
        let device = Default::default();
        let down = Downsample::<TestBackend>::new(4, 4, true, 2, &device);
        assert_eq!(down.forward(ramp(1, 4, 16)).dims(), [1, 4, 8]);
        let pool = Downsample::<TestBackend>::new(4, 4, false, 2, &device);
        assert_eq!(pool.forward(ramp(1, 4, 16)).dims(), [1, 4, 8]);
        let up = Upsample::<TestBackend>::new(4, 6, true, 2, &device);
        assert_eq!(up.forward(ramp(1, 4, 16)).dims(), [1, 6, 32]);
    }
}
