use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::loader::LoadOptions;
use crate::data::schema::Domain;

/// File looked up in the working directory when no override is given.
pub const CONFIG_FILE: &str = "dashboard.json";
/// Environment variable pointing at an alternative config file.
pub const CONFIG_ENV: &str = "ADMISSION_DASHBOARD_CONFIG";

/// Runtime settings, read from JSON. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Admission CSV used when nothing was opened.
    pub admission_default: PathBuf,
    /// Directory (or file) of applicant CSVs used when nothing was opened.
    pub applicant_default: PathBuf,
    /// Enquiry CSV used when nothing was opened.
    pub enquiry_default: PathBuf,
    /// Year ages are computed against.
    pub reference_year: i32,
    /// Length of "top N" rankings.
    pub top_n: usize,
    /// Rows shown in the data preview tables.
    pub preview_rows: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            admission_default: PathBuf::from("2025 admissions  - primary only (1).csv"),
            applicant_default: PathBuf::from("applicant data"),
            enquiry_default: PathBuf::from("enquiry_data.csv"),
            reference_year: 2025,
            top_n: 10,
            preview_rows: 200,
        }
    }
}

impl DashboardConfig {
    /// Parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Config from `$ADMISSION_DASHBOARD_CONFIG` or `./dashboard.json`.
    /// Falls back to defaults when the file is absent or unusable.
    pub fn discover() -> Self {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => {
                log::info!("loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("ignoring config: {e:#}");
                Self::default()
            }
        }
    }

    pub fn default_path(&self, domain: Domain) -> &Path {
        match domain {
            Domain::Admission => &self.admission_default,
            Domain::Applicant => &self.applicant_default,
            Domain::Enquiry => &self.enquiry_default,
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            reference_year: self.reference_year,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "reference_year": 2026, "enquiry_default": "data/enq.csv" }}"#).unwrap();

        let config = DashboardConfig::load(file.path()).unwrap();
        assert_eq!(config.reference_year, 2026);
        assert_eq!(config.default_path(Domain::Enquiry), Path::new("data/enq.csv"));
        assert_eq!(config.top_n, 10);
        assert_eq!(config.load_options().reference_year, 2026);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(DashboardConfig::load(file.path()).is_err());
    }
}
