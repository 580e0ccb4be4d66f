// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the subcommands and their flags. Each Args struct
// converts into the matching application-layer config so the
// use cases never see clap types.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::application::{
    inspect_use_case::InspectConfig,
    load_use_case::LoadConfig,
    vocoder_use_case::ForwardConfig,
};
use crate::infra::options::DEFAULT_DATASET;
use crate::ml::truncation::ForwardMode;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a complete options file to start from
    Init(InitArgs),

    /// Write the tiles along random root-ward chains as PNGs
    Inspect(InspectArgs),

    /// Pull batches through the data loader and report their shapes
    Load(LoadArgs),

    /// Print the network's level plan and block list
    Plan(PlanArgs),

    /// Build the network and run one forward pass on random inputs
    Forward(ForwardArgs),
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Where to write the options file
    #[arg(long, default_value = "options.json")]
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Options file; built-in defaults when omitted
    #[arg(long)]
    pub options: Option<PathBuf>,

    /// Dataset entry to sample from
    #[arg(long, default_value = DEFAULT_DATASET)]
    pub dataset: String,

    /// Number of samples to dump
    #[arg(long, default_value_t = 8)]
    pub count: usize,

    /// Output directory for the PNGs
    #[arg(long, default_value = "debug")]
    pub out_dir: PathBuf,

    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Also write the low-quality tiles
    #[arg(long)]
    pub with_lq: bool,
}

impl From<InspectArgs> for InspectConfig {
    fn from(a: InspectArgs) -> Self {
        InspectConfig {
            options: a.options,
            dataset: a.dataset,
            count:   a.count,
            out_dir: a.out_dir,
            seed:    a.seed,
            with_lq: a.with_lq,
        }
    }
}

#[derive(Args, Debug)]
pub struct LoadArgs {
    #[arg(long)]
    pub options: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_DATASET)]
    pub dataset: String,

    #[arg(long, default_value_t = 4)]
    pub batch_size: usize,

    /// Loader worker threads
    #[arg(long, default_value_t = 4)]
    pub num_workers: usize,

    /// Stop after this many batches
    #[arg(long, default_value_t = 16)]
    pub max_batches: usize,

    /// Shuffle seed
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Epoch to draw crops for
    #[arg(long, default_value_t = 0)]
    pub epoch: u64,
}

impl From<LoadArgs> for LoadConfig {
    fn from(a: LoadArgs) -> Self {
        LoadConfig {
            options:     a.options,
            dataset:     a.dataset,
            batch_size:  a.batch_size,
            num_workers: a.num_workers,
            max_batches: a.max_batches,
            seed:        a.seed,
            epoch:       a.epoch,
        }
    }
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[arg(long)]
    pub options: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ModeArg {
    Train,
    Eval,
}

impl From<ModeArg> for ForwardMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Train => ForwardMode::Train,
            ModeArg::Eval  => ForwardMode::Eval,
        }
    }
}

#[derive(Args, Debug)]
pub struct ForwardArgs {
    #[arg(long)]
    pub options: Option<PathBuf>,

    #[arg(long, default_value_t = 1)]
    pub batch_size: usize,

    /// Input length in samples; 0 uses the network's input multiple
    #[arg(long, default_value_t = 0)]
    pub length: usize,

    /// Frames of spectrogram codes
    #[arg(long, default_value_t = 64)]
    pub spectrogram_len: usize,

    /// Samples in the reference clip
    #[arg(long, default_value_t = 4096)]
    pub conditioning_len: usize,

    #[arg(long, value_enum, default_value_t = ModeArg::Train)]
    pub mode: ModeArg,

    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

impl From<&ForwardArgs> for ForwardConfig {
    fn from(a: &ForwardArgs) -> Self {
        ForwardConfig {
            batch_size:       a.batch_size,
            length:           a.length,
            spectrogram_len:  a.spectrogram_len,
            conditioning_len: a.conditioning_len,
            mode:             a.mode.into(),
            seed:             a.seed,
        }
    }
}
