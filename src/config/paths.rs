use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default baseline table location, relative to the working directory
pub const DEFAULT_BASELINE_CSV: &str = "data/baseline.csv";

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    pub baseline_csv: PathBuf,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            baseline_csv: PathBuf::from(DEFAULT_BASELINE_CSV),
        }
    }
}
