//! Chip × prefill bucket × decode bucket enumeration

use crate::baseline::{BaselineTable, Phase};
use crate::config::Settings;
use crate::error::Result;
use crate::estimator::{estimate_combo, ComboInput, ComboResult};
use crate::resolve::{resolve_chip, ChipPlan};
use serde::{Deserialize, Serialize};

/// All results for one chip, in prefill-then-decode bucket order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChipReport {
    pub chip: String,
    pub combos: Vec<ComboResult>,
}

/// Output of a full run
#[derive(Debug, Clone, Default)]
pub struct EstimateRun {
    pub reports: Vec<ChipReport>,
    /// Chip-level warnings in processing order
    pub warnings: Vec<String>,
}

/// Evaluate every bucket combination of a resolved chip.
///
/// Fails on the first bucket cell that is not a usable throughput; cells of
/// buckets that are not evaluated are never read.
pub fn evaluate_plan(plan: &ChipPlan<'_>, settings: &Settings) -> Result<ChipReport> {
    let mut combos = Vec::with_capacity(plan.prefill_buckets.len() * plan.decode_buckets.len());
    for &prefill_bucket in &plan.prefill_buckets {
        for &decode_bucket in &plan.decode_buckets {
            // Resolved buckets always come from the row's own maps
            let (Some(prefill_tput), Some(decode_tput)) = (
                plan.row.throughput(Phase::Prefill, prefill_bucket)?,
                plan.row.throughput(Phase::Decode, decode_bucket)?,
            ) else {
                continue;
            };
            let input = ComboInput {
                prefill_bucket,
                decode_bucket,
                prefill_tput,
                decode_tput,
                seq_in: plan.seq_in,
                seq_out: plan.seq_out,
                ratio: plan.ratio,
                tpot_target_ms: settings.tpot_target_ms,
                tco_per_gpu: plan.row.tco_per_gpu.clone(),
            };
            let mut result = estimate_combo(&plan.chip, &input);
            result.warnings.extend(plan.notes.iter().cloned());
            combos.push(result);
        }
    }
    Ok(ChipReport {
        chip: plan.chip.clone(),
        combos,
    })
}

/// Chips to process: `settings.chips` in the given order, or every chip in
/// the table sorted by name
pub fn chips_to_process(table: &BaselineTable, settings: &Settings) -> Vec<String> {
    if settings.chips.is_empty() {
        table.chip_names()
    } else {
        settings.chips.clone()
    }
}

/// Run the whole pipeline over the table.
///
/// The caller decides what an empty run means.
pub fn estimate_all(table: &BaselineTable, settings: &Settings) -> Result<EstimateRun> {
    let mut run = EstimateRun::default();
    for chip in &chips_to_process(table, settings) {
        let resolution = resolve_chip(table, chip, settings);
        run.warnings.extend(resolution.warnings);
        if let Some(plan) = resolution.plan {
            let report = evaluate_plan(&plan, settings)?;
            if !report.combos.is_empty() {
                run.reports.push(report);
            }
        }
    }
    Ok(run)
}
