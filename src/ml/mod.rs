// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Everything that builds or runs the vocoder network. Burn
// module code lives here and in the batcher; the planner and the
// truncation bounds are plain Rust and testable without a device.
//
//   plan.rs          — NetworkBlockPlanner: level widths, block
//                      list and skip-connection bookkeeping
//   blocks.rs        — timestep embedding, ResBlock, attention,
//                      resamplers and the embedded sequential
//   conditioning.rs  — spectrogram fusion block and the
//                      reference-clip mini encoder
//   truncation.rs    — train/eval window of the top branch
//   model.rs         — VocoderConfig and DiffusionVocoder
//   registry.rs      — network name → constructor
//
// Reference: Ho et al. (2020) Denoising Diffusion Probabilistic Models
//            Nichol & Dhariwal (2021) Improved DDPM (the U-Net blocks)

/// Channel plan and skip stack
pub mod plan;

/// Shared network layers
pub mod blocks;

/// Spectrogram and reference-clip conditioning
pub mod conditioning;

/// Top-branch window selection
pub mod truncation;

/// The diffusion vocoder
pub mod model;

/// Mode name → network constructor
pub mod registry;
