//! End-to-end throughput estimation for disaggregated prefill/decode serving
//!
//! A deployment splits its accelerators between a prefill pool and a decode
//! pool. Given the measured per-chip throughput of each phase at one latency
//! bucket, the estimator derives per-phase request rates and the end-to-end
//! request rate the combined system sustains, either at a fixed worker ratio
//! or at the power-of-two ratio that best balances the two pools.
//!
//! # Formulas
//!
//! ```text
//! prefill_rps = prefill_tput / seq_in
//! decode_rps  = decode_tput / seq_out
//! e2e_rps     = min(p/(p+d) * prefill_rps, d/(p+d) * decode_rps)
//! ttft_est_ms = 1000 * (seq_in / prefill_tput + 1 / decode_tput)
//! tpot_est_ms = 1000 / decode_tput
//! ```

use crate::baseline::ColumnValue;
use serde::{Deserialize, Serialize};

/// Largest power-of-two exponent tried on either side of the balanced ratio
pub const MAX_BALANCE_EXPONENT: u32 = 10;

/// Relative count of prefill-serving and decode-serving workers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRatio {
    pub prefill: u32,
    pub decode: u32,
}

impl WorkerRatio {
    /// Both counts must be positive
    pub fn new(prefill: i64, decode: i64) -> Option<Self> {
        let prefill = u32::try_from(prefill).ok().filter(|&p| p > 0)?;
        let decode = u32::try_from(decode).ok().filter(|&d| d > 0)?;
        Some(Self { prefill, decode })
    }
}

/// How the worker ratio behind a result was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RatioMode {
    /// Ratio supplied on the command line or by the CSV row
    #[serde(rename = "fixed_ratio")]
    Fixed { prefill: u32, decode: u32 },
    /// Ratio found by the power-of-two search; `0:0` when either phase has no capacity
    Balanced { prefill: u32, decode: u32 },
}

/// Inputs for one (chip, prefill bucket, decode bucket) combination
#[derive(Debug, Clone)]
pub struct ComboInput {
    pub prefill_bucket: u32,
    pub decode_bucket: u32,
    pub prefill_tput: f64,
    pub decode_tput: f64,
    pub seq_in: u32,
    pub seq_out: u32,
    pub ratio: Option<WorkerRatio>,
    pub tpot_target_ms: Option<f64>,
    pub tco_per_gpu: ColumnValue<f64>,
}

/// Estimate for one (chip, prefill bucket, decode bucket) combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboResult {
    pub chip: String,
    pub prefill_bucket: u32,
    pub decode_bucket: u32,
    pub prefill_tput: f64,
    pub decode_tput: f64,
    pub prefill_rps: f64,
    pub decode_rps: f64,
    pub e2e_rps: f64,
    pub e2e_tokens_s: f64,
    pub ratio: RatioMode,
    pub tco_per_gpu: Option<f64>,
    pub cost_per_rps: Option<f64>,
    pub cost_per_tokens_s: Option<f64>,
    pub ttft_est_ms: f64,
    pub tpot_est_ms: f64,
    pub warnings: Vec<String>,
}

/// Find the power-of-two worker ratio `2^a : 2^b` closest, in log space, to
/// `decode_rps / prefill_rps`.
///
/// Exponents range over `0..=MAX_BALANCE_EXPONENT`; the first minimum in
/// `(a, b)` order wins. Returns `(0, 0)` if either rate is zero.
pub fn balance_ratio(prefill_rps: f64, decode_rps: f64) -> (u32, u32) {
    if prefill_rps == 0.0 || decode_rps == 0.0 {
        return (0, 0);
    }

    let target = (decode_rps / prefill_rps).log2();
    let mut best = (0, 0, f64::INFINITY);
    for a in 0..=MAX_BALANCE_EXPONENT {
        for b in 0..=MAX_BALANCE_EXPONENT {
            let candidate = (2f64.powi(a as i32) / 2f64.powi(b as i32)).log2();
            let error = (candidate - target).abs();
            if error < best.2 {
                best = (a, b, error);
            }
        }
    }

    (1 << best.0, 1 << best.1)
}

/// Request rate sustained when workers are split `prefill:decode`
pub fn end_to_end_rps(prefill_rps: f64, decode_rps: f64, prefill: u32, decode: u32) -> f64 {
    let total = f64::from(prefill) + f64::from(decode);
    let prefill_share = f64::from(prefill) / total;
    let decode_share = f64::from(decode) / total;
    (prefill_share * prefill_rps).min(decode_share * decode_rps)
}

/// Evaluate one combination
pub fn estimate_combo(chip: &str, input: &ComboInput) -> ComboResult {
    let mut warnings = Vec::new();

    let prefill_rps = input.prefill_tput / f64::from(input.seq_in);
    let decode_rps = input.decode_tput / f64::from(input.seq_out);

    let (ratio, e2e_rps) = match input.ratio {
        Some(WorkerRatio { prefill, decode }) => (
            RatioMode::Fixed { prefill, decode },
            end_to_end_rps(prefill_rps, decode_rps, prefill, decode),
        ),
        None => match balance_ratio(prefill_rps, decode_rps) {
            (0, 0) => (
                RatioMode::Balanced {
                    prefill: 0,
                    decode: 0,
                },
                0.0,
            ),
            (prefill, decode) => (
                RatioMode::Balanced { prefill, decode },
                end_to_end_rps(prefill_rps, decode_rps, prefill, decode),
            ),
        },
    };
    let e2e_tokens_s = e2e_rps * (f64::from(input.seq_in) + f64::from(input.seq_out));

    let tpot_est_ms = 1000.0 / input.decode_tput;
    let ttft_est_ms =
        1000.0 * (f64::from(input.seq_in) / input.prefill_tput + 1.0 / input.decode_tput);

    let (tco_per_gpu, cost_per_rps, cost_per_tokens_s) = match &input.tco_per_gpu {
        ColumnValue::Parsed(tco) => (
            Some(*tco),
            (e2e_rps > 0.0).then(|| tco / e2e_rps),
            (e2e_tokens_s > 0.0).then(|| tco / e2e_tokens_s),
        ),
        ColumnValue::Malformed(_) => {
            warnings.push("TCO_per_GPU is not a number; cost metrics skipped".to_string());
            (None, None, None)
        }
        ColumnValue::Missing => (None, None, None),
    };

    if let Some(target) = input.tpot_target_ms {
        if tpot_est_ms > target {
            warnings.push(format!(
                "tpot_est_ms={:.2} exceeds target {:?}ms",
                tpot_est_ms, target
            ));
        }
    }

    ComboResult {
        chip: chip.to_string(),
        prefill_bucket: input.prefill_bucket,
        decode_bucket: input.decode_bucket,
        prefill_tput: input.prefill_tput,
        decode_tput: input.decode_tput,
        prefill_rps,
        decode_rps,
        e2e_rps,
        e2e_tokens_s,
        ratio,
        tco_per_gpu,
        cost_per_rps,
        cost_per_tokens_s,
        ttft_est_ms,
        tpot_est_ms,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(prefill_tput: f64, decode_tput: f64) -> ComboInput {
        ComboInput {
            prefill_bucket: 5,
            decode_bucket: 20,
            prefill_tput,
            decode_tput,
            seq_in: 512,
            seq_out: 128,
            ratio: None,
            tpot_target_ms: None,
            tco_per_gpu: ColumnValue::Missing,
        }
    }

    #[test]
    fn test_balanced_reference_combo() {
        let result = estimate_combo("h100", &input(100.0, 50.0));

        assert!((result.prefill_rps - 0.1953).abs() < 1e-4);
        assert!((result.decode_rps - 0.3906).abs() < 1e-4);
        assert_eq!(
            result.ratio,
            RatioMode::Balanced {
                prefill: 2,
                decode: 1
            }
        );
        assert!((result.e2e_rps - 0.1302).abs() < 1e-4, "{}", result.e2e_rps);
        assert!((result.e2e_tokens_s - result.e2e_rps * 640.0).abs() < 1e-9);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_latency_estimates() {
        let result = estimate_combo("h100", &input(100.0, 50.0));
        assert!((result.tpot_est_ms - 20.0).abs() < 1e-9);
        assert!((result.ttft_est_ms - (5120.0 + 20.0)).abs() < 1e-6);
    }

    #[test]
    fn test_fixed_ratio_bottleneck() {
        let mut combo = input(100.0, 50.0);
        combo.ratio = WorkerRatio::new(1, 3);
        let result = estimate_combo("h100", &combo);

        assert_eq!(
            result.ratio,
            RatioMode::Fixed {
                prefill: 1,
                decode: 3
            }
        );
        // prefill share 0.25 * 0.1953 is the bottleneck
        assert!((result.e2e_rps - 0.25 * 100.0 / 512.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_zero_rate() {
        let result = estimate_combo("h100", &input(0.0, 50.0));
        assert_eq!(
            result.ratio,
            RatioMode::Balanced {
                prefill: 0,
                decode: 0
            }
        );
        assert_eq!(result.e2e_rps, 0.0);
        assert_eq!(result.e2e_tokens_s, 0.0);
    }

    #[test]
    fn test_balance_ratio_exact_powers() {
        assert_eq!(balance_ratio(1.0, 1.0), (1, 1));
        assert_eq!(balance_ratio(1.0, 8.0), (8, 1));
        assert_eq!(balance_ratio(8.0, 1.0), (1, 8));
        // Clamped at the grid edge
        assert_eq!(balance_ratio(1.0, 1e6), (1024, 1));
    }

    #[test]
    fn test_balance_ratio_is_symmetric() {
        let rates = [0.013, 0.2, 0.39, 1.0, 3.7, 42.0, 900.0];
        for &p in &rates {
            for &d in &rates {
                let (a, b) = balance_ratio(p, d);
                let (c, e) = balance_ratio(d, p);
                assert_eq!((a, b), (e, c), "p={} d={}", p, d);
            }
        }
    }

    #[test]
    fn test_balanced_never_exceeds_either_phase() {
        let rates = [0.001, 0.05, 0.5, 2.0, 17.0, 300.0];
        for &p in &rates {
            for &d in &rates {
                let (a, b) = balance_ratio(p, d);
                let e2e = end_to_end_rps(p, d, a, b);
                assert!(e2e > 0.0);
                assert!(e2e <= p.min(d), "p={} d={} e2e={}", p, d, e2e);
            }
        }
    }

    #[test]
    fn test_equal_fixed_ratio_matches_unit_balance() {
        for &rps in &[0.1, 1.0, 7.5] {
            let (a, b) = balance_ratio(rps, rps);
            assert_eq!((a, b), (1, 1));
            assert_eq!(end_to_end_rps(rps, rps, 3, 3), end_to_end_rps(rps, rps, a, b));
        }
    }

    #[test]
    fn test_cost_metrics() {
        let mut combo = input(100.0, 50.0);
        combo.tco_per_gpu = ColumnValue::Parsed(1000.0);
        let result = estimate_combo("h100", &combo);

        assert_eq!(result.tco_per_gpu, Some(1000.0));
        let cost_per_rps = result.cost_per_rps.unwrap();
        assert!((cost_per_rps - 1000.0 / result.e2e_rps).abs() < 1e-6);
        let cost_per_tokens = result.cost_per_tokens_s.unwrap();
        assert!((cost_per_tokens - 1000.0 / result.e2e_tokens_s).abs() < 1e-6);
    }

    #[test]
    fn test_cost_skipped_without_throughput() {
        let mut combo = input(0.0, 50.0);
        combo.tco_per_gpu = ColumnValue::Parsed(1000.0);
        let result = estimate_combo("h100", &combo);

        assert_eq!(result.tco_per_gpu, Some(1000.0));
        assert!(result.cost_per_rps.is_none());
        assert!(result.cost_per_tokens_s.is_none());
    }

    #[test]
    fn test_malformed_tco_warns() {
        let mut combo = input(100.0, 50.0);
        combo.tco_per_gpu = ColumnValue::Malformed("n/a".to_string());
        let result = estimate_combo("h100", &combo);

        assert!(result.tco_per_gpu.is_none());
        assert!(result.cost_per_tokens_s.is_none());
        assert_eq!(
            result.warnings,
            vec!["TCO_per_GPU is not a number; cost metrics skipped"]
        );
    }

    #[test]
    fn test_tpot_target_warning() {
        let mut combo = input(100.0, 50.0);
        combo.tpot_target_ms = Some(15.0);
        let result = estimate_combo("h100", &combo);
        assert_eq!(result.warnings, vec!["tpot_est_ms=20.00 exceeds target 15.0ms"]);

        combo.tpot_target_ms = Some(20.0);
        assert!(estimate_combo("h100", &combo).warnings.is_empty());
    }
}
