// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates the other layers to accomplish one
// goal per use case.
//
// Rules for this layer:
//   - No tensor math or module code here
//   - No printing here (that's Layer 1)
//   - File access only through Layer 4 and 6
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Dump tiles along a random root-ward chain
pub mod inspect_use_case;

// Push the dataset through Burn's DataLoader
pub mod load_use_case;

// Plan and smoke-run the network
pub mod vocoder_use_case;
