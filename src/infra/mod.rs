// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// File-system concerns shared by the use cases:
//
//   options.rs     — Experiment options file
//                    Dataset entries and the network entry,
//                    read and written as JSON with contextual
//                    errors.
//
//   tile_writer.rs — PNG output of dataset tiles
//                    Used by the inspect command to dump the
//                    tiles along one root-ward chain.
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            serde_json documentation

/// Experiment options loading and saving
pub mod options;

/// PatchTensor → PNG
pub mod tile_writer;
