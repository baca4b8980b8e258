use serde::{Deserialize, Serialize};

/// Workload overrides; each one takes precedence over the matching CSV column
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkloadConfig {
    pub ratio_prefill: Option<i64>,
    pub ratio_decode: Option<i64>,
    pub seq_in: Option<i64>,
    pub seq_out: Option<i64>,
}
