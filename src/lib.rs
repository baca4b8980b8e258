//! Serving Throughput and Cost Estimation for LLM Inference Hardware
//!
//! Reads a baseline CSV of per-chip prefill/decode throughput measured at
//! discrete latency buckets and estimates the end-to-end request and token
//! rates a disaggregated deployment would sustain, together with cost per
//! unit of throughput and a comparison against a baseline chip.
//!
//! ## Main Components
//!
//! - `baseline`: CSV loading and row selection
//! - `config`: Run configuration and validation
//! - `resolve`: Per-chip bucket, sequence length and ratio resolution
//! - `estimator`: Core throughput algorithm, including the balanced ratio search
//! - `pipeline`: Enumeration over chips and bucket pairs
//! - `report`: Text and JSON rendering with baseline comparisons

pub mod baseline;
pub mod config;
pub mod error;
pub mod estimator;
pub mod pipeline;
pub mod report;
pub mod resolve;

pub use baseline::{load_baseline, BaselineRow, BaselineTable};
pub use config::{EstimateConfig, Settings};
pub use error::EstimateError;
pub use estimator::{balance_ratio, estimate_combo, ComboResult, RatioMode, WorkerRatio};
pub use pipeline::{estimate_all, ChipReport, EstimateRun};
