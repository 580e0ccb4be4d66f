// ============================================================
// Layer 6 — Experiment Options
// ============================================================
// One JSON file describes an experiment: named dataset entries
// and the network to build.
//
//   {
//     "name": "amalgam",
//     "datasets": {
//       "train": { "mode": "multiscale", "dataroot": ["data/images"],
//                  "hq_tile_size": 128, "num_scales": 4, "scale": 2.0 }
//     },
//     "network": {
//       "which_model": "unet_diffusion_vocoder_with_ref_trunc_top",
//       "kwargs": { "model_channels": 32, ... }
//     }
//   }
//
// Dataset entries are plain serde structs, so omitted seed and
// augment fields take their defaults. The network kwargs are a
// burn Config; `multiscale-vocoder init` writes a complete file
// to start from.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use crate::data::dataset::MultiscaleDatasetOptions;
use crate::data::registry::DatasetMode;
use crate::ml::model::VocoderConfig;
use crate::ml::registry::NetworkMode;

/// Dataset name used when none is given on the command line
pub const DEFAULT_DATASET: &str = "train";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetEntry {
    pub mode: DatasetMode,

    #[serde(flatten)]
    pub options: MultiscaleDatasetOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkEntry {
    pub which_model: NetworkMode,
    pub kwargs:      VocoderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentOptions {
    pub name:     String,
    pub datasets: BTreeMap<String, DatasetEntry>,
    pub network:  NetworkEntry,
}

impl Default for ExperimentOptions {
    fn default() -> Self {
        let mut datasets = BTreeMap::new();
        datasets.insert(
            DEFAULT_DATASET.to_string(),
            DatasetEntry { mode: DatasetMode::Multiscale, options: MultiscaleDatasetOptions::default() },
        );
        Self {
            name: "multiscale_vocoder".to_string(),
            datasets,
            network: NetworkEntry {
                which_model: NetworkMode::UnetDiffusionVocoderWithRefTruncTop,
                kwargs:      VocoderConfig::new(32),
            },
        }
    }
}

impl ExperimentOptions {
    /// Look up a dataset entry by name
    pub fn dataset(&self, name: &str) -> Result<&DatasetEntry> {
        self.datasets.get(name).with_context(|| {
            let known: Vec<&str> = self.datasets.keys().map(String::as_str).collect();
            format!("No dataset named '{name}' in options (have: {})", known.join(", "))
        })
    }
}

/// Reads and writes experiment options files
pub struct OptionsStore {
    path: PathBuf,
}

impl OptionsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<ExperimentOptions> {
        let json = fs::read_to_string(&self.path).with_context(|| {
            format!(
                "Cannot read options from '{}'. Run 'init' to write a template.",
                self.path.display()
            )
        })?;
        let opts: ExperimentOptions = serde_json::from_str(&json)
            .with_context(|| format!("Malformed options file '{}'", self.path.display()))?;

        tracing::debug!("Loaded options '{}' from '{}'", opts.name, self.path.display());
        Ok(opts)
    }

    /// Load the file, or fall back to defaults when no path was given
    pub fn load_or_default(path: Option<&Path>) -> Result<ExperimentOptions> {
        match path {
            Some(path) => Self::new(path).load(),
            None => {
                tracing::info!("No options file given, using built-in defaults");
                Ok(ExperimentOptions::default())
            }
        }
    }

    pub fn save(&self, opts: &ExperimentOptions) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create directory '{}'", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(opts)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Cannot write options to '{}'", self.path.display()))?;

        tracing::debug!("Saved options to '{}'", self.path.display());
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let dir   = tempfile::tempdir().unwrap();
        let store = OptionsStore::new(dir.path().join("nested/opts.json"));

        let mut opts = ExperimentOptions::default();
        opts.network.kwargs = VocoderConfig::new(48).with_input_multiple(8192);
        store.save(&opts).unwrap();

        let back = store.load().unwrap();
        assert_eq!(back.network.kwargs.model_channels, 48);
        assert_eq!(back.network.kwargs.input_multiple, 8192);
        assert_eq!(back.dataset(DEFAULT_DATASET).unwrap().options.num_scales, 4);
    }

    #[test]
    fn test_dataset_entry_defaults_optional_fields() {
        let json = r#"{ "mode": "multiscale", "dataroot": ["a", "b"],
                        "hq_tile_size": 64, "num_scales": 3, "scale": 4.0 }"#;
        let entry: DatasetEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.mode, DatasetMode::Multiscale);
        assert_eq!(entry.options.dataroot.len(), 2);
        assert_eq!(entry.options.seed, 0);
        assert!(entry.options.augment);
    }

    #[test]
    fn test_unknown_dataset_name() {
        let opts = ExperimentOptions::default();
        let err  = opts.dataset("val").unwrap_err().to_string();
        assert!(err.contains("val"));
        assert!(err.contains("train"));
    }

    #[test]
    fn test_missing_file_has_context() {
        let dir = tempfile::tempdir().unwrap();
        let err = OptionsStore::new(dir.path().join("none.json")).load().unwrap_err();
        assert!(format!("{err:#}").contains("none.json"));
    }

    #[test]
    fn test_defaults_without_path() {
        let opts = OptionsStore::load_or_default(None).unwrap();
        assert_eq!(opts.network.which_model, NetworkMode::UnetDiffusionVocoderWithRefTruncTop);
    }
}
