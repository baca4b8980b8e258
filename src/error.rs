//! Errors that abort an estimation run

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EstimateError {
    #[error("ratio-prefill and ratio-decode must be provided together")]
    UnpairedRatio,

    #[error("ratio-prefill and ratio-decode must be positive integers")]
    NonPositiveRatio,

    #[error("{flag} must be a positive integer, got {value}")]
    NonPositiveSeqLen { flag: &'static str, value: i64 },

    #[error("ttft-s target must be a non-negative integer s value, got {0}")]
    NonIntegerTtft(f64),

    #[error("tpot-ms target must be a positive number, got {0}")]
    InvalidTpot(f64),

    #[error("failed to open CSV '{}': {}", path.display(), source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV is empty")]
    EmptyCsv,

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("chip '{chip}': column '{column}' is not a number: {value}")]
    InvalidNumber {
        chip: String,
        column: String,
        value: String,
    },

    #[error("chip '{chip}': column '{column}' must be a non-negative finite throughput, got {value}")]
    InvalidThroughput {
        chip: String,
        column: String,
        value: String,
    },

    #[error("no chips available for output after filtering")]
    NoChipsResolved,
}

pub type Result<T> = std::result::Result<T, EstimateError>;
