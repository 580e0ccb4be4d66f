// ============================================================
// Layer 5 — Truncated Top Branch Bounds
// ============================================================
// The top branch runs at full resolution, which is expensive. In
// training it only sees a random half-length window of the
// input; the main path's output is cut to the matching window
// (at half resolution) before the two are fused.
//
//   x:      |-------------------- N --------------------|
//   train:        |-------- N/2 --------|
//                 ^ start (even)        ^ stop
//   main:   |---------- N/2 ----------|
//   fused:      |--- N/4 ---|  at start/2 .. stop/2, upsampled ×2

use std::ops::Range;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Whether a forward pass is for training or for evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForwardMode {
    Train,
    Eval,
}

/// Window of the input seen by the top branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopBounds {
    pub start: usize,
    pub stop:  usize,
}

impl TopBounds {
    /// Pick the window for an input of `len` samples
    pub fn choose<R: Rng + ?Sized>(len: usize, mode: ForwardMode, rng: &mut R) -> Self {
        match mode {
            ForwardMode::Eval => Self { start: 0, stop: len },
            ForwardMode::Train => {
                let half  = len / 2;
                let start = (rng.gen_range(0..=half) / 2) * 2;
                Self { start, stop: start + half }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.stop - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.stop == self.start
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.stop
    }

    /// The same window on the half-resolution main path
    pub fn half(&self) -> Range<usize> {
        self.start / 2..self.stop / 2
    }
}

/// Input lengths must be a whole number of `unit`s
pub fn check_input_length(len: usize, unit: usize) -> Result<()> {
    if unit == 0 || len == 0 || len % unit != 0 {
        return Err(CoreError::InputLength { len, unit });
    }
    Ok(())
}
