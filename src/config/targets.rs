use serde::{Deserialize, Serialize};

/// Latency targets given on the command line
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Prefill bucket to evaluate, in seconds; must be integer-valued
    pub ttft_s: Option<f64>,

    /// Decode bucket to evaluate when integer-valued, in milliseconds.
    /// Always used as a soft target for the estimated TPOT.
    pub tpot_ms: Option<f64>,
}
