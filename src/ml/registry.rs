// ============================================================
// Layer 5 — Network Registry
// ============================================================
// Options files name their network by a model string. As with
// datasets, the names this build can construct form a closed
// enum and construction matches on it exhaustively.

use std::fmt;
use std::str::FromStr;

use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::ml::model::{DiffusionVocoder, TrainableSet, VocoderConfig};
use crate::ml::plan::ChannelPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkMode {
    /// U-Net vocoder with a reference encoder and a truncated top branch
    UnetDiffusionVocoderWithRefTruncTop,
}

impl NetworkMode {
    pub fn name(&self) -> &'static str {
        match self {
            NetworkMode::UnetDiffusionVocoderWithRefTruncTop => "unet_diffusion_vocoder_with_ref_trunc_top",
        }
    }
}

impl fmt::Display for NetworkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NetworkMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "unet_diffusion_vocoder_with_ref_trunc_top" => Ok(NetworkMode::UnetDiffusionVocoderWithRefTruncTop),
            other => Err(CoreError::InvalidConfig(format!("network '{other}' is not recognized"))),
        }
    }
}

/// A constructed network with the layout it was built from
#[derive(Debug)]
pub struct VocoderNetwork<B: Backend> {
    pub model:     DiffusionVocoder<B>,
    pub plan:      ChannelPlan,
    pub trainable: TrainableSet,
}

/// Build the network selected by `mode`
pub fn create_network<B: Backend>(
    mode:   NetworkMode,
    config: &VocoderConfig,
    device: &B::Device,
) -> Result<VocoderNetwork<B>> {
    tracing::info!("Creating network '{}'", mode);
    match mode {
        NetworkMode::UnetDiffusionVocoderWithRefTruncTop => {
            let plan      = config.plan()?;
            let model     = config.init_with_plan(&plan, device)?;
            let trainable = config.trainable_set(&plan);
            Ok(VocoderNetwork { model, plan, trainable })
        }
    }
}
