pub mod commands;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use llm_perf_rs::config::{
    EstimateConfig, PathConfig, TargetConfig, WorkloadConfig, DEFAULT_BASELINE_CSV,
};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "llm_perf", version)]
#[command(about = "Estimate per-card LLM throughput from baseline CSV", long_about = None)]
struct Cli {
    /// Baseline CSV with per-chip prefill/decode throughput
    #[arg(long, default_value = DEFAULT_BASELINE_CSV)]
    csv: PathBuf,
    /// Chip to report on (repeatable; default: every chip in the CSV)
    #[arg(long = "chip")]
    chips: Vec<String>,
    /// Prefill TTFT bucket in seconds (integer-valued)
    #[arg(long, allow_negative_numbers = true)]
    ttft_s: Option<f64>,
    /// Decode TPOT bucket in milliseconds; also a soft target for estimated TPOT
    #[arg(long, allow_negative_numbers = true)]
    tpot_ms: Option<f64>,
    /// Prefill workers in a fixed prefill:decode ratio (requires --ratio-decode)
    #[arg(long, allow_negative_numbers = true)]
    ratio_prefill: Option<i64>,
    /// Decode workers in a fixed prefill:decode ratio (requires --ratio-prefill)
    #[arg(long, allow_negative_numbers = true)]
    ratio_decode: Option<i64>,
    /// Input sequence length, overriding the CSV's seq_len_in
    #[arg(long, allow_negative_numbers = true)]
    seq_in: Option<i64>,
    /// Output sequence length, overriding the CSV's seq_len_out
    #[arg(long, allow_negative_numbers = true)]
    seq_out: Option<i64>,
    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

impl Cli {
    fn into_config(self) -> (EstimateConfig, OutputFormat) {
        let config = EstimateConfig {
            paths: PathConfig {
                baseline_csv: self.csv,
            },
            chips: self.chips,
            targets: TargetConfig {
                ttft_s: self.ttft_s,
                tpot_ms: self.tpot_ms,
            },
            workload: WorkloadConfig {
                ratio_prefill: self.ratio_prefill,
                ratio_decode: self.ratio_decode,
                seq_in: self.seq_in,
                seq_out: self.seq_out,
            },
        };
        (config, self.format)
    }
}

pub fn run() -> Result<()> {
    let (config, format) = Cli::parse().into_config();
    commands::estimate(&config, format)
}
