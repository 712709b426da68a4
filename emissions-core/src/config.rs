//! Data-source configuration.
//!
//! The two input files are named in a small TOML document rather than being
//! hardcoded next to the binary:
//!
//! ```toml
//! [sources]
//! geometry = "data/ne_50m_admin_0_countries.csv"
//! emissions = "data/annual-co2-emissions-per-country.csv"
//! ```

use crate::errors::{EmissionsError, EmissionsResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Locations of the two read-only input files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceConfig {
    pub sources: Sources,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sources {
    /// Country geometry table (code, display name, boundary blob)
    pub geometry: PathBuf,
    /// Annual emissions table (entity, code, year, one quantity column)
    pub emissions: PathBuf,
}

impl DataSourceConfig {
    pub fn new(geometry: impl Into<PathBuf>, emissions: impl Into<PathBuf>) -> Self {
        Self {
            sources: Sources {
                geometry: geometry.into(),
                emissions: emissions.into(),
            },
        }
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> EmissionsResult<Self> {
        toml::from_str(text).map_err(|e| EmissionsError::Schema(format!("invalid config: {e}")))
    }

    /// Read and parse a configuration file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> EmissionsResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| EmissionsError::DataSourceUnavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    pub fn geometry_path(&self) -> &Path {
        &self.sources.geometry
    }

    pub fn emissions_path(&self) -> &Path {
        &self.sources.emissions
    }
}
