//! Report rendering and comparison against the baseline chip
//!
//! The first chip processed is the baseline. Every later result whose
//! (prefill bucket, decode bucket) pair the baseline also has is compared
//! against it by end-to-end request rate and, when both sides carry a cost
//! figure, by cost per unit of token throughput.

use crate::estimator::{ComboResult, RatioMode};
use crate::pipeline::ChipReport;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, Write};

/// Comparison of one result against the baseline entry with the same buckets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub base_chip: String,
    /// Candidate e2e_rps over baseline e2e_rps; 0.0 when the baseline rate is zero
    pub ratio_vs_base: f64,
    /// Baseline cost_per_tokens_s over candidate cost_per_tokens_s; above 1 means cheaper
    pub value_ratio_vs_base: Option<f64>,
}

/// Baseline entries keyed by bucket pair
#[derive(Debug)]
pub struct Baseline<'a> {
    chip: &'a str,
    entries: HashMap<(u32, u32), &'a ComboResult>,
}

impl<'a> Baseline<'a> {
    pub fn new(base: &'a ChipReport) -> Self {
        Self {
            chip: &base.chip,
            entries: base
                .combos
                .iter()
                .map(|combo| ((combo.prefill_bucket, combo.decode_bucket), combo))
                .collect(),
        }
    }

    pub fn chip(&self) -> &str {
        self.chip
    }

    pub fn compare(&self, candidate: &ComboResult) -> Option<Comparison> {
        let base = self
            .entries
            .get(&(candidate.prefill_bucket, candidate.decode_bucket))?;

        let ratio_vs_base = if base.e2e_rps != 0.0 {
            candidate.e2e_rps / base.e2e_rps
        } else {
            0.0
        };
        let value_ratio_vs_base = match (base.cost_per_tokens_s, candidate.cost_per_tokens_s) {
            (Some(base_cost), Some(cost)) if base_cost > 0.0 => Some(base_cost / cost),
            _ => None,
        };

        Some(Comparison {
            base_chip: self.chip.to_string(),
            ratio_vs_base,
            value_ratio_vs_base,
        })
    }
}

/// Pair every result with its baseline comparison; the baseline chip's own
/// results never get one.
pub fn with_comparisons(reports: &[ChipReport]) -> Vec<(&ComboResult, Option<Comparison>)> {
    let Some(first) = reports.first() else {
        return Vec::new();
    };
    let baseline = Baseline::new(first);

    reports
        .iter()
        .enumerate()
        .flat_map(|(index, report)| {
            let baseline = &baseline;
            report
                .combos
                .iter()
                .map(move |combo| (combo, (index > 0).then(|| baseline.compare(combo)).flatten()))
        })
        .collect()
}

fn mode_line(mode: &RatioMode) -> String {
    match mode {
        RatioMode::Balanced { prefill, decode } => {
            format!("balanced (prefill:decode chips {}:{})", prefill, decode)
        }
        RatioMode::Fixed { prefill, decode } => format!("fixed_ratio ({}:{})", prefill, decode),
    }
}

fn write_combo<W: Write>(
    out: &mut W,
    result: &ComboResult,
    comparison: Option<&Comparison>,
) -> io::Result<()> {
    writeln!(out, "chip: {}", result.chip)?;
    writeln!(
        out,
        "  prefill: {}s, tput={:.2} tok/s",
        result.prefill_bucket, result.prefill_tput
    )?;
    writeln!(
        out,
        "  decode:  {}ms, tput={:.2} tok/s",
        result.decode_bucket, result.decode_tput
    )?;
    writeln!(
        out,
        "  rps: prefill={:.4}, decode={:.4}, e2e={:.4}",
        result.prefill_rps, result.decode_rps, result.e2e_rps
    )?;
    writeln!(out, "  e2e_tokens_s: {:.2}", result.e2e_tokens_s)?;
    writeln!(out, "  mode: {}", mode_line(&result.ratio))?;

    if let Some(tco) = result.tco_per_gpu {
        writeln!(out, "  tco_per_gpu: {:.2}", tco)?;
    }
    if let Some(cost) = result.cost_per_rps {
        writeln!(out, "  cost_per_rps: {:.4}", cost)?;
    }
    if let Some(cost) = result.cost_per_tokens_s {
        writeln!(out, "  cost_per_tokens_s: {:.4}", cost)?;
    }

    writeln!(
        out,
        "  estimates_ms: ttft={:.2}, tpot={:.2}",
        result.ttft_est_ms, result.tpot_est_ms
    )?;

    if let Some(cmp) = comparison {
        writeln!(out, "  ratio_vs_{}: {:.3}x", cmp.base_chip, cmp.ratio_vs_base)?;
        if let Some(value) = cmp.value_ratio_vs_base {
            writeln!(out, "  value_ratio_vs_{}: {:.3}x", cmp.base_chip, value)?;
        }
    }

    if !result.warnings.is_empty() {
        writeln!(out, "  warnings:")?;
        for warning in &result.warnings {
            writeln!(out, "    - {}", warning)?;
        }
    }
    writeln!(out)
}

/// Write the human-readable report, one block per combination
pub fn write_text_report<W: Write>(out: &mut W, reports: &[ChipReport]) -> io::Result<()> {
    for (result, comparison) in with_comparisons(reports) {
        write_combo(out, result, comparison.as_ref())?;
    }
    Ok(())
}

#[derive(Serialize)]
struct JsonCombo<'a> {
    #[serde(flatten)]
    result: &'a ComboResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    comparison: Option<Comparison>,
}

#[derive(Serialize)]
struct JsonChip<'a> {
    chip: &'a str,
    combos: Vec<JsonCombo<'a>>,
}

/// Render the reports as a pretty-printed JSON array of chips
pub fn render_json(reports: &[ChipReport]) -> serde_json::Result<String> {
    let mut paired = with_comparisons(reports).into_iter();
    let chips: Vec<JsonChip<'_>> = reports
        .iter()
        .map(|report| JsonChip {
            chip: &report.chip,
            combos: paired
                .by_ref()
                .take(report.combos.len())
                .map(|(result, comparison)| JsonCombo { result, comparison })
                .collect(),
        })
        .collect();
    serde_json::to_string_pretty(&chips)
}
