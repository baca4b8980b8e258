//! Per-chip resolution of buckets, sequence lengths and worker ratio

use crate::baseline::{BaselineRow, BaselineTable, ColumnValue, Phase};
use crate::config::Settings;
use crate::estimator::WorkerRatio;

/// Everything needed to evaluate one chip's bucket combinations
#[derive(Debug, Clone)]
pub struct ChipPlan<'a> {
    pub chip: String,
    pub row: &'a BaselineRow,
    pub seq_in: u32,
    pub seq_out: u32,
    pub ratio: Option<WorkerRatio>,
    pub prefill_buckets: Vec<u32>,
    pub decode_buckets: Vec<u32>,
    /// Warnings attached to every combination of this chip
    pub notes: Vec<String>,
}

/// Outcome of resolving one chip
#[derive(Debug, Clone)]
pub struct ChipResolution<'a> {
    /// Warnings to surface immediately, in order; a skipped chip ends with the reason
    pub warnings: Vec<String>,
    pub plan: Option<ChipPlan<'a>>,
}

impl<'a> ChipResolution<'a> {
    fn skipped(mut warnings: Vec<String>, reason: String) -> Self {
        warnings.push(reason);
        Self {
            warnings,
            plan: None,
        }
    }
}

/// Buckets to evaluate for a phase: the explicit target if any, otherwise all available.
///
/// The error text lists the valid alternatives.
pub fn resolve_buckets(
    row: &BaselineRow,
    phase: Phase,
    target: Option<u32>,
) -> Result<Vec<u32>, String> {
    let available = row.buckets(phase);
    if available.is_empty() {
        return Err(format!(
            "no available {} buckets found in CSV",
            phase.prefix()
        ));
    }
    match target {
        None => Ok(available),
        Some(bucket) if available.contains(&bucket) => Ok(vec![bucket]),
        Some(bucket) => Err(format!(
            "{} target {}{} not in CSV available buckets {:?}",
            phase.prefix(),
            bucket,
            phase.unit(),
            available
        )),
    }
}

fn row_ratio(chip: &str, row: &BaselineRow, warnings: &mut Vec<String>) -> Option<WorkerRatio> {
    if row.ratio_prefill.is_missing() || row.ratio_decode.is_missing() {
        return None;
    }
    let (Some(&prefill), Some(&decode)) = (row.ratio_prefill.parsed(), row.ratio_decode.parsed())
    else {
        warnings.push(format!(
            "chip '{}' has non-integer ratio fields; ignoring",
            chip
        ));
        return None;
    };
    let ratio = WorkerRatio::new(prefill, decode);
    if ratio.is_none() {
        warnings.push(format!(
            "chip '{}' has non-positive ratio fields; ignoring",
            chip
        ));
    }
    ratio
}

fn row_seq_len(
    chip: &str,
    column: &str,
    value: &ColumnValue<i64>,
    warnings: &mut Vec<String>,
) -> Option<u32> {
    match value {
        ColumnValue::Missing => None,
        ColumnValue::Parsed(len) => match u32::try_from(*len) {
            Ok(len) if len > 0 => Some(len),
            _ => {
                warnings.push(format!(
                    "chip '{}' has non-positive {}; value ignored",
                    chip, column
                ));
                None
            }
        },
        ColumnValue::Malformed(_) => {
            warnings.push(format!(
                "chip '{}' has non-integer {}; value ignored",
                chip, column
            ));
            None
        }
    }
}

/// Resolve one chip against the table: row lookup, worker ratio, sequence
/// lengths, then bucket targets.
pub fn resolve_chip<'a>(
    table: &'a BaselineTable,
    chip: &str,
    settings: &Settings,
) -> ChipResolution<'a> {
    let mut warnings = Vec::new();

    let Some(found) = table.select(chip) else {
        return ChipResolution::skipped(warnings, format!("chip '{}' not found in CSV", chip));
    };
    let row = found.row;

    let ratio = settings
        .ratio
        .or_else(|| row_ratio(chip, row, &mut warnings));

    let seq_in = settings
        .seq_in
        .or_else(|| row_seq_len(chip, "seq_len_in", &row.seq_len_in, &mut warnings));
    let seq_out = settings
        .seq_out
        .or_else(|| row_seq_len(chip, "seq_len_out", &row.seq_len_out, &mut warnings));
    let (Some(seq_in), Some(seq_out)) = (seq_in, seq_out) else {
        return ChipResolution::skipped(
            warnings,
            format!(
                "chip '{}' skipped: seq_len_in/seq_len_out not provided and not found in CSV",
                chip
            ),
        );
    };

    let buckets = resolve_buckets(row, Phase::Prefill, settings.prefill_target).and_then(
        |prefill| {
            resolve_buckets(row, Phase::Decode, settings.decode_target)
                .map(|decode| (prefill, decode))
        },
    );
    let (prefill_buckets, decode_buckets) = match buckets {
        Ok(buckets) => buckets,
        Err(reason) => {
            return ChipResolution::skipped(
                warnings,
                format!("chip '{}' skipped: {}", chip, reason),
            )
        }
    };

    tracing::debug!(
        "chip '{}': seq {}/{}, ratio {:?}, prefill {:?}, decode {:?}",
        chip,
        seq_in,
        seq_out,
        ratio,
        prefill_buckets,
        decode_buckets
    );

    ChipResolution {
        warnings,
        plan: Some(ChipPlan {
            chip: chip.to_string(),
            row,
            seq_in,
            seq_out,
            ratio,
            prefill_buckets,
            decode_buckets,
            notes: found.duplicate_warning().into_iter().collect(),
        }),
    }
}
