//! CLI command implementations

use super::OutputFormat;
use anyhow::Result;
use llm_perf_rs::config::EstimateConfig;
use llm_perf_rs::report::{render_json, write_text_report};
use llm_perf_rs::pipeline::{chips_to_process, evaluate_plan};
use llm_perf_rs::resolve::resolve_chip;
use llm_perf_rs::{load_baseline, EstimateError};
use std::io::{self, Write};

pub fn estimate(config: &EstimateConfig, format: OutputFormat) -> Result<()> {
    // Configuration errors abort before the CSV is read
    let settings = config.validate()?;
    let table = load_baseline(&config.paths.baseline_csv)?;

    // Chip warnings are printed before that chip's buckets are read
    let mut reports = Vec::new();
    for chip in chips_to_process(&table, &settings) {
        let resolution = resolve_chip(&table, &chip, &settings);
        for warning in &resolution.warnings {
            match format {
                OutputFormat::Text => println!("warning: {}", warning),
                OutputFormat::Json => tracing::warn!("{}", warning),
            }
        }
        let Some(plan) = resolution.plan else {
            continue;
        };
        let report = evaluate_plan(&plan, &settings)?;
        if !report.combos.is_empty() {
            reports.push(report);
        }
    }
    if reports.is_empty() {
        return Err(EstimateError::NoChipsResolved.into());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Text => write_text_report(&mut out, &reports)?,
        OutputFormat::Json => writeln!(out, "{}", render_json(&reports)?)?,
    }
    out.flush()?;
    Ok(())
}
