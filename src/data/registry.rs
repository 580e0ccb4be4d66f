// ============================================================
// Layer 4 — Dataset Registry
// ============================================================
// Options files name their dataset by a mode string. Instead of
// dispatching on the raw string, the set of modes this build can
// construct is a closed enum: serde rejects unknown names while
// the options file is parsed, and `create_dataset` matches
// exhaustively.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::data::dataset::{MultiscaleDataset, MultiscaleDatasetOptions};
use crate::error::{CoreError, Result};

/// Dataset modes this build knows how to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetMode {
    /// Tile pyramids pulled at regular zoom intervals
    Multiscale,
}

impl DatasetMode {
    pub fn name(&self) -> &'static str {
        match self {
            DatasetMode::Multiscale => "multiscale",
        }
    }
}

impl fmt::Display for DatasetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DatasetMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "multiscale" => Ok(DatasetMode::Multiscale),
            other => Err(CoreError::InvalidConfig(format!("dataset mode '{other}' is not recognized"))),
        }
    }
}

/// Build the dataset selected by `mode`
pub fn create_dataset(mode: DatasetMode, opts: &MultiscaleDatasetOptions) -> Result<MultiscaleDataset> {
    tracing::info!("Creating dataset of mode '{}'", mode);
    match mode {
        DatasetMode::Multiscale => MultiscaleDataset::new(opts),
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_round_trips_through_name() {
        let mode: DatasetMode = "multiscale".parse().unwrap();
        assert_eq!(mode, DatasetMode::Multiscale);
        assert_eq!(mode.to_string(), "multiscale");
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        assert!("stylegan2".parse::<DatasetMode>().is_err());
        assert!(serde_json::from_str::<DatasetMode>("\"zipfile\"").is_err());
    }

    #[test]
    fn test_mode_deserialises_from_options() {
        let mode: DatasetMode = serde_json::from_str("\"multiscale\"").unwrap();
        assert_eq!(mode, DatasetMode::Multiscale);
    }
}
