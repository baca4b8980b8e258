//! A single measured hardware configuration and its bucket columns

use crate::error::{EstimateError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::str::FromStr;

static PREFILL_COLUMN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^prefill_ttft_(\d+)s$").unwrap());

static DECODE_COLUMN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^decode_tpot_(\d+)ms$").unwrap());

/// Inference phase a bucket column belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Time-to-first-token buckets, in seconds
    Prefill,
    /// Time-per-output-token buckets, in milliseconds
    Decode,
}

impl Phase {
    pub fn prefix(self) -> &'static str {
        match self {
            Phase::Prefill => "prefill_ttft_",
            Phase::Decode => "decode_tpot_",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Phase::Prefill => "s",
            Phase::Decode => "ms",
        }
    }

    /// Canonical column name for a bucket, e.g. `decode_tpot_20ms`
    pub fn column(self, bucket: u32) -> String {
        format!("{}{}{}", self.prefix(), bucket, self.unit())
    }

    fn pattern(self) -> &'static Regex {
        match self {
            Phase::Prefill => &*PREFILL_COLUMN,
            Phase::Decode => &*DECODE_COLUMN,
        }
    }

    /// Extract the bucket value from a column name, if it is a bucket column of this phase
    pub fn bucket_of(self, column: &str) -> Option<u32> {
        let caps = self.pattern().captures(column)?;
        match caps[1].parse::<u32>() {
            Ok(bucket) => Some(bucket),
            Err(e) => {
                tracing::debug!("ignoring column '{}': bucket out of range ({})", column, e);
                None
            }
        }
    }
}

/// Value of an optional column on a row
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue<T> {
    /// Column absent from the CSV or empty on this row
    Missing,
    Parsed(T),
    /// Non-empty but unparseable; keeps the raw text for warnings
    Malformed(String),
}

impl<T: FromStr> ColumnValue<T> {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None | Some("") => ColumnValue::Missing,
            Some(text) => match text.parse::<T>() {
                Ok(value) => ColumnValue::Parsed(value),
                Err(_) => ColumnValue::Malformed(text.to_string()),
            },
        }
    }
}

impl<T> ColumnValue<T> {
    pub fn is_missing(&self) -> bool {
        matches!(self, ColumnValue::Missing)
    }

    pub fn parsed(&self) -> Option<&T> {
        match self {
            ColumnValue::Parsed(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> Default for ColumnValue<T> {
    fn default() -> Self {
        ColumnValue::Missing
    }
}

/// One row of the baseline table.
///
/// Bucket columns are folded into per-phase maps from bucket value to
/// throughput (tokens/s) when the row is loaded; a bucket exists only when
/// its cell is non-empty. Cells that are not a finite, non-negative number
/// are kept as [`ColumnValue::Malformed`] and only fail once evaluated.
#[derive(Debug, Clone, Default)]
pub struct BaselineRow {
    pub chip: String,
    pub prefill: BTreeMap<u32, ColumnValue<f64>>,
    pub decode: BTreeMap<u32, ColumnValue<f64>>,
    pub ratio_prefill: ColumnValue<i64>,
    pub ratio_decode: ColumnValue<i64>,
    pub seq_len_in: ColumnValue<i64>,
    pub seq_len_out: ColumnValue<i64>,
    pub tco_per_gpu: ColumnValue<f64>,
}

impl BaselineRow {
    /// Build a row from `(column, value)` cells. Values are expected trimmed.
    pub fn from_cells<'a, I>(cells: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let cells: Vec<(&str, &str)> = cells.into_iter().collect();
        let lookup = |name: &str| {
            cells
                .iter()
                .find(|(column, _)| *column == name)
                .map(|(_, value)| *value)
        };

        let mut row = BaselineRow {
            chip: lookup("chip").unwrap_or_default().to_string(),
            ratio_prefill: ColumnValue::parse(lookup("ratio_prefill")),
            ratio_decode: ColumnValue::parse(lookup("ratio_decode")),
            seq_len_in: ColumnValue::parse(lookup("seq_len_in")),
            seq_len_out: ColumnValue::parse(lookup("seq_len_out")),
            tco_per_gpu: ColumnValue::parse(lookup("TCO_per_GPU")),
            ..Default::default()
        };

        for (column, value) in &cells {
            if value.is_empty() {
                continue;
            }
            for phase in [Phase::Prefill, Phase::Decode] {
                let Some(bucket) = phase.bucket_of(column) else {
                    continue;
                };
                let tput = match value.parse::<f64>() {
                    Ok(tput) if tput.is_finite() && tput >= 0.0 => ColumnValue::Parsed(tput),
                    _ => ColumnValue::Malformed(value.to_string()),
                };
                // Zero-padded aliases (`prefill_ttft_05s`) never shadow the first column seen.
                row.buckets_mut(phase).entry(bucket).or_insert(tput);
            }
        }

        row
    }

    fn buckets_mut(&mut self, phase: Phase) -> &mut BTreeMap<u32, ColumnValue<f64>> {
        match phase {
            Phase::Prefill => &mut self.prefill,
            Phase::Decode => &mut self.decode,
        }
    }

    /// Sorted bucket values available for a phase
    pub fn buckets(&self, phase: Phase) -> Vec<u32> {
        match phase {
            Phase::Prefill => self.prefill.keys().copied().collect(),
            Phase::Decode => self.decode.keys().copied().collect(),
        }
    }

    /// Measured throughput (tokens/s) at a bucket; `None` if the bucket is absent.
    ///
    /// Fails when the cell is not a number, or is negative or non-finite.
    pub fn throughput(&self, phase: Phase, bucket: u32) -> Result<Option<f64>> {
        let value = match phase {
            Phase::Prefill => self.prefill.get(&bucket),
            Phase::Decode => self.decode.get(&bucket),
        };
        match value {
            None | Some(ColumnValue::Missing) => Ok(None),
            Some(ColumnValue::Parsed(tput)) => Ok(Some(*tput)),
            Some(ColumnValue::Malformed(raw)) => {
                let chip = self.chip.clone();
                let column = phase.column(bucket);
                let value = raw.clone();
                Err(if raw.parse::<f64>().is_ok() {
                    EstimateError::InvalidThroughput {
                        chip,
                        column,
                        value,
                    }
                } else {
                    EstimateError::InvalidNumber {
                        chip,
                        column,
                        value,
                    }
                })
            }
        }
    }
}
