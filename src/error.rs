// ============================================================
// Crate Error Type
// ============================================================
// Typed failures raised by the dataset and network layers.
// The application and CLI layers wrap these in anyhow with
// extra context; nothing below them swallows an error.

use thiserror::Error;

/// Errors raised while tiling images or assembling / running the network
#[derive(Debug, Error)]
pub enum CoreError {
    /// A source image could not be opened or decoded
    #[error("failed to read image '{path}': {source}")]
    ImageRead {
        path:   String,
        #[source]
        source: image::ImageError,
    },

    /// A dataroot scan found nothing to sample from
    #[error("no images found under {0}")]
    EmptyDataroot(String),

    /// A tile reached a split with an odd side
    #[error("tile of {width}x{height} cannot be split into exact quadrants")]
    UnevenTile { width: u32, height: u32 },

    /// Pyramid extraction was handed a non-square image
    #[error("expected a square image, got {width}x{height}")]
    NotSquare { width: u32, height: u32 },

    /// Level lists, head counts or resampling settings do not fit together
    #[error("invalid network configuration: {0}")]
    InvalidConfig(String),

    /// Only one-dimensional signals are assembled into modules
    #[error("unsupported signal dimensionality {0}; only dims = 1 is assembled")]
    UnsupportedDims(usize),

    /// The up path asked for a skip connection the down path never recorded
    #[error("skip stack underflow at up-path block {block}")]
    SkipUnderflow { block: usize },

    /// The down path recorded skip connections the up path never consumed
    #[error("skip stack still holds {remaining} entries after the up path")]
    SkipImbalance { remaining: usize },

    /// The forward input does not line up with the bottom resolution
    #[error("input length {len} is not a multiple of {unit}")]
    InputLength { len: usize, unit: usize },

    /// Conditioning is enabled but the caller passed no conditioning tensor
    #[error("conditioning input is enabled but none was supplied")]
    MissingConditioning,
}

/// Result alias for the dataset and network layers
pub type Result<T> = std::result::Result<T, CoreError>;
