// ============================================================
// Layer 3 — PatchTensor Domain Type
// ============================================================
// A single image tile stored channel-first (C, H, W) as f32,
// the layout the network batcher expects. Pixel values are in
// [0, 1].
//
// Kept free of Burn types so the dataset can be exercised and
// tested without a backend; the batcher turns a set of these
// into device tensors.

use serde::{Deserialize, Serialize};

/// A channel-first f32 image patch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchTensor {
    pub channels: usize,
    pub height:   usize,
    pub width:    usize,

    /// Row-major planes: all of channel 0, then channel 1, ...
    pub data: Vec<f32>,
}

impl PatchTensor {
    /// Wrap an existing CHW buffer.
    ///
    /// Panics if the buffer length does not match the shape; every
    /// caller in this crate derives the shape from the buffer it built.
    pub fn new(channels: usize, height: usize, width: usize, data: Vec<f32>) -> Self {
        assert_eq!(
            data.len(),
            channels * height * width,
            "PatchTensor buffer does not match {channels}x{height}x{width}"
        );
        Self { channels, height, width, data }
    }

    pub fn zeros(channels: usize, height: usize, width: usize) -> Self {
        Self::new(channels, height, width, vec![0.0; channels * height * width])
    }

    /// Shape as (C, H, W)
    pub fn shape(&self) -> [usize; 3] {
        [self.channels, self.height, self.width]
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// Value at channel `c`, row `y`, column `x`
    pub fn at(&self, c: usize, y: usize, x: usize) -> f32 {
        self.data[(c * self.height + y) * self.width + x]
    }

    /// One channel plane as a row-major slice
    pub fn plane(&self, c: usize) -> &[f32] {
        let size = self.height * self.width;
        &self.data[c * size..(c + 1) * size]
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexing_is_channel_first() {
        let data: Vec<f32> = (0..12).map(|v| v as f32).collect();
        let p = PatchTensor::new(3, 2, 2, data);
        assert_eq!(p.at(0, 0, 0), 0.0);
        assert_eq!(p.at(0, 1, 1), 3.0);
        assert_eq!(p.at(2, 0, 1), 9.0);
        assert_eq!(p.plane(1), &[4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    #[should_panic]
    fn test_shape_mismatch_panics() {
        let _ = PatchTensor::new(3, 2, 2, vec![0.0; 5]);
    }
}
