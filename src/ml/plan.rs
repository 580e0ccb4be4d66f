// ============================================================
// Layer 5 — Network Block Planner
// ============================================================
// Works out the block layout and channel widths of the U-Net
// before any weights exist. Model construction walks the
// resulting ChannelPlan; nothing here touches a tensor.
//
//   Input conv ──push──┐
//   Level 0: [cond] res×n (push each) down (push)
//   Level 1: [cond] res×n (push each) down (push)
//   ...
//   Level K: [cond] res×n (push each)
//   Middle:  res → attn → res
//   Level K..0: (n+1)× { pop, res(ch + skip) [attn] } [up]
//
// The same SkipStack type records widths while planning and holds
// activations during the forward pass, so an unbalanced layout is
// caught here rather than as a shape mismatch deep inside burn.

use std::collections::BTreeSet;

use crate::error::{CoreError, Result};
use crate::ml::model::VocoderConfig;

// ─── SkipStack ────────────────────────────────────────────────────────────────
/// LIFO of skip connections between the down and up paths
#[derive(Debug, Clone)]
pub struct SkipStack<T> {
    entries: Vec<T>,
}

impl<T> Default for SkipStack<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T> SkipStack<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: T) {
        self.entries.push(entry);
    }

    /// Pop the newest entry for up-path block `block`
    pub fn pop(&mut self, block: usize) -> Result<T> {
        self.entries.pop().ok_or(CoreError::SkipUnderflow { block })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every pushed entry must have been consumed
    pub fn finish(self) -> Result<()> {
        if self.entries.is_empty() {
            Ok(())
        } else {
            Err(CoreError::SkipImbalance { remaining: self.entries.len() })
        }
    }
}

// ─── Plan Types ───────────────────────────────────────────────────────────────
/// Channel bookkeeping for one resolution level
#[derive(Debug, Clone, PartialEq)]
pub struct LevelPlan {
    pub level:          usize,
    /// Resolution key matched against the attention and conditioning
    /// lists; doubles per level whatever the resampling factor
    pub ds:             usize,
    pub in_channels:    usize,
    pub out_channels:   usize,
    pub res_blocks:     usize,
    pub attention:      bool,
    pub conditioning:   bool,
}

/// One entry of the down path, in construction order
#[derive(Debug, Clone, PartialEq)]
pub enum DownBlock {
    /// Main-path input convolution
    Input { out_channels: usize },
    /// Spectrogram fusion; output width is twice `channels`
    Conditioning { ds: usize, channels: usize },
    Residual {
        ds:              usize,
        in_channels:     usize,
        out_channels:    usize,
        attention_heads: Option<usize>,
    },
    Downsample { ds: usize, channels: usize, resblock: bool },
}

impl DownBlock {
    /// Whether this block's output is kept for the up path
    pub fn pushes_skip(&self) -> bool {
        !matches!(self, DownBlock::Conditioning { .. })
    }
}

/// One entry of the up path, in construction order
#[derive(Debug, Clone, PartialEq)]
pub struct UpBlock {
    pub level:           usize,
    pub ds:              usize,
    /// Running width plus `skip_channels`
    pub in_channels:     usize,
    pub skip_channels:   usize,
    pub out_channels:    usize,
    pub attention_heads: Option<usize>,
    pub upsample:        bool,
}

/// Layout of the full-resolution top branch
#[derive(Debug, Clone, PartialEq)]
pub struct TopPlan {
    /// Residual blocks on each side of the fusion
    pub blocks:      usize,
    /// Width of every top block
    pub channels:    usize,
    /// Width of the main-path output entering the fusion upsample
    pub upsample_in: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelPlan {
    pub model_channels:  usize,
    pub factor:          usize,
    pub levels:          Vec<LevelPlan>,
    pub down:            Vec<DownBlock>,
    pub middle_channels: usize,
    pub middle_heads:    usize,
    pub up:              Vec<UpBlock>,
    pub final_channels:  usize,
    pub top:             TopPlan,
    /// Widths in push order
    pub skip_trace:      Vec<usize>,
}

impl ChannelPlan {
    /// Down-path entries that feed the spectrogram into the trunk
    pub fn conditioning_blocks(&self) -> impl Iterator<Item = usize> + '_ {
        self.down
            .iter()
            .enumerate()
            .filter(|(_, b)| matches!(b, DownBlock::Conditioning { .. }))
            .map(|(i, _)| i)
    }

    /// Smallest main-path length every level divides evenly: the
    /// stride-2 input conv times one `factor` per downsample
    pub fn length_unit(&self) -> usize {
        2 * self.factor.pow(self.levels.len().saturating_sub(1) as u32)
    }

    /// One human-readable line per level and block
    pub fn describe(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for l in &self.levels {
            lines.push(format!(
                "level {} (ds={}): {} → {} ch, {} res blocks{}{}",
                l.level,
                l.ds,
                l.in_channels,
                l.out_channels,
                l.res_blocks,
                if l.attention { ", attention" } else { "" },
                if l.conditioning { ", spectrogram" } else { "" },
            ));
        }
        for (i, b) in self.down.iter().enumerate() {
            lines.push(format!("  input_blocks[{i}] {b:?}"));
        }
        lines.push(format!("  middle_block {} ch, {} heads", self.middle_channels, self.middle_heads));
        for (i, b) in self.up.iter().enumerate() {
            lines.push(format!(
                "  output_blocks[{i}] level {} ds={} {} (+{}) → {}{}{}",
                b.level,
                b.ds,
                b.in_channels - b.skip_channels,
                b.skip_channels,
                b.out_channels,
                b.attention_heads.map(|h| format!(", attn×{h}")).unwrap_or_default(),
                if b.upsample { ", upsample" } else { "" },
            ));
        }
        lines.push(format!(
            "  top branch: {} blocks at {} ch, fusion upsample {} → {}",
            self.top.blocks, self.top.channels, self.top.upsample_in, self.top.channels
        ));
        lines
    }
}

// ─── NetworkBlockPlanner ──────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct NetworkBlockPlanner {
    model_channels:           usize,
    channel_mult:             Vec<f32>,
    num_res_blocks:           Vec<usize>,
    attention_resolutions:    BTreeSet<usize>,
    conditioning_resolutions: BTreeSet<usize>,
    factor:                   usize,
    resblock_updown:          bool,
    num_heads:                usize,
    num_heads_upsample:       usize,
    num_head_channels:        Option<usize>,
}

impl NetworkBlockPlanner {
    /// No attention, no conditioning, factor 2, one head
    pub fn new(model_channels: usize, channel_mult: Vec<f32>, num_res_blocks: Vec<usize>) -> Self {
        Self {
            model_channels,
            channel_mult,
            num_res_blocks,
            attention_resolutions:    BTreeSet::new(),
            conditioning_resolutions: BTreeSet::new(),
            factor:                   2,
            resblock_updown:          false,
            num_heads:                1,
            num_heads_upsample:       1,
            num_head_channels:        None,
        }
    }

    pub fn from_config(config: &VocoderConfig) -> Self {
        Self {
            model_channels:           config.model_channels,
            channel_mult:             config.channel_mult.clone(),
            num_res_blocks:           config.num_res_blocks.clone(),
            attention_resolutions:    config.attention_resolutions.iter().copied().collect(),
            conditioning_resolutions: config.spectrogram_conditioning_resolutions.iter().copied().collect(),
            factor:                   config.scale_factor,
            resblock_updown:          config.resblock_updown,
            num_heads:                config.num_heads,
            num_heads_upsample:       config.num_heads_upsample.unwrap_or(config.num_heads),
            num_head_channels:        config.num_head_channels,
        }
    }

    pub fn with_attention(mut self, resolutions: impl IntoIterator<Item = usize>) -> Self {
        self.attention_resolutions = resolutions.into_iter().collect();
        self
    }

    pub fn with_conditioning(mut self, resolutions: impl IntoIterator<Item = usize>) -> Self {
        self.conditioning_resolutions = resolutions.into_iter().collect();
        self
    }

    pub fn with_heads(mut self, num_heads: usize, num_head_channels: Option<usize>) -> Self {
        self.num_heads          = num_heads;
        self.num_heads_upsample = num_heads;
        self.num_head_channels  = num_head_channels;
        self
    }

    pub fn with_factor(mut self, factor: usize) -> Self {
        self.factor = factor;
        self
    }

    fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(CoreError::InvalidConfig(msg));
        if self.channel_mult.is_empty() {
            return invalid("channel_mult must name at least one level".into());
        }
        if self.channel_mult.len() != self.num_res_blocks.len() {
            return invalid(format!(
                "channel_mult has {} levels but num_res_blocks has {}",
                self.channel_mult.len(),
                self.num_res_blocks.len()
            ));
        }
        if self.model_channels < 2 {
            return invalid(format!("model_channels must be at least 2, got {}", self.model_channels));
        }
        if self.factor < 2 {
            return invalid(format!("scale_factor must be at least 2, got {}", self.factor));
        }
        if self.num_heads == 0 || self.num_heads_upsample == 0 || self.num_head_channels == Some(0) {
            return invalid("attention head counts must be positive".into());
        }
        for (level, mult) in self.channel_mult.iter().enumerate() {
            if self.width(*mult) == 0 {
                return invalid(format!("channel_mult[{level}] = {mult} gives zero channels"));
            }
        }
        Ok(())
    }

    fn width(&self, mult: f32) -> usize {
        if mult > 0.0 {
            (mult * self.model_channels as f32) as usize
        } else {
            0
        }
    }

    /// Heads for an attention layer of width `channels`
    fn heads(&self, channels: usize, num_heads: usize) -> Result<usize> {
        let heads = match self.num_head_channels {
            Some(per_head) => channels / per_head,
            None => num_heads,
        };
        if heads == 0 || channels % heads != 0 {
            return Err(CoreError::InvalidConfig(format!(
                "{channels} channels cannot be split into {heads} attention heads"
            )));
        }
        Ok(heads)
    }

    pub fn plan(&self) -> Result<ChannelPlan> {
        self.validate()?;

        let last_level = self.channel_mult.len() - 1;
        let mut skips  = SkipStack::new();
        let mut trace  = Vec::new();
        let mut push   = |skips: &mut SkipStack<usize>, ch: usize| {
            skips.push(ch);
            trace.push(ch);
        };

        // ─── Down path ────────────────────────────────────────────────────────
        let mut ch     = self.model_channels;
        let mut ds     = 1;
        let mut levels = Vec::with_capacity(self.channel_mult.len());
        let mut down   = vec![DownBlock::Input { out_channels: ch }];
        push(&mut skips, ch);

        for (level, (&mult, &blocks)) in self.channel_mult.iter().zip(&self.num_res_blocks).enumerate() {
            let in_channels  = ch;
            let conditioning = self.conditioning_resolutions.contains(&ds);
            let attention    = self.attention_resolutions.contains(&ds);

            if conditioning {
                down.push(DownBlock::Conditioning { ds, channels: ch });
                ch *= 2;
            }
            for _ in 0..blocks {
                let out_channels    = self.width(mult);
                let attention_heads = if attention { Some(self.heads(out_channels, self.num_heads)?) } else { None };
                down.push(DownBlock::Residual { ds, in_channels: ch, out_channels, attention_heads });
                ch = out_channels;
                push(&mut skips, ch);
            }
            levels.push(LevelPlan {
                level,
                ds,
                in_channels,
                out_channels: ch,
                res_blocks: blocks,
                attention,
                conditioning,
            });
            if level != last_level {
                down.push(DownBlock::Downsample { ds, channels: ch, resblock: self.resblock_updown });
                push(&mut skips, ch);
                ds *= 2;
            }
        }

        let middle_channels = ch;
        let middle_heads    = self.heads(ch, self.num_heads)?;

        // ─── Up path ──────────────────────────────────────────────────────────
        let mut up = Vec::new();
        for (level, (&mult, &blocks)) in self.channel_mult.iter().zip(&self.num_res_blocks).enumerate().rev() {
            for i in 0..=blocks {
                let skip_channels   = skips.pop(up.len())?;
                let out_channels    = self.width(mult);
                let attention_heads = if self.attention_resolutions.contains(&ds) {
                    Some(self.heads(out_channels, self.num_heads_upsample)?)
                } else {
                    None
                };
                let upsample = level > 0 && i == blocks;
                up.push(UpBlock {
                    level,
                    ds,
                    in_channels: ch + skip_channels,
                    skip_channels,
                    out_channels,
                    attention_heads,
                    upsample,
                });
                ch = out_channels;
                if upsample {
                    ds /= 2;
                }
            }
        }
        skips.finish()?;

        let top = TopPlan {
            blocks:      self.num_res_blocks[0],
            channels:    self.model_channels,
            upsample_in: ch,
        };

        tracing::debug!(
            "Planned {} levels: {} down blocks, {} up blocks, middle {} ch",
            levels.len(),
            down.len(),
            up.len(),
            middle_channels
        );

        Ok(ChannelPlan {
            model_channels: self.model_channels,
            factor: self.factor,
            levels,
            down,
            middle_channels,
            middle_heads,
            up,
            final_channels: ch,
            top,
            skip_trace: trace,
        })
    }
}
