// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs and traits describing what the system
// works with: the tile index tree, channel-first patches,
// and the image source abstraction.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Everything here is testable without a device or a dataset
// on disk.

// The 4-ary index tree that names every slot of a patch pyramid
pub mod tile_tree;

// A channel-first f32 patch, the unit the dataset hands out
pub mod patch;

// Core abstractions (traits) that other layers implement
pub mod traits;
