pub mod paths;
pub mod targets;
pub mod workload;

use crate::error::{EstimateError, Result};
use crate::estimator::WorkerRatio;
use serde::{Deserialize, Serialize};

pub use paths::{PathConfig, DEFAULT_BASELINE_CSV};
pub use targets::TargetConfig;
pub use workload::WorkloadConfig;

/// Main configuration for an estimation run, as given by the user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EstimateConfig {
    pub paths: PathConfig,
    /// Chips to report on; empty means every chip in the table
    pub chips: Vec<String>,
    pub targets: TargetConfig,
    pub workload: WorkloadConfig,
}

/// Validated run settings derived from an [`EstimateConfig`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub chips: Vec<String>,
    /// Prefill bucket (seconds) to restrict to
    pub prefill_target: Option<u32>,
    /// Decode bucket (ms) to restrict to; only set for an integer-valued `tpot_ms`
    pub decode_target: Option<u32>,
    /// Soft target compared against the estimated TPOT
    pub tpot_target_ms: Option<f64>,
    pub ratio: Option<WorkerRatio>,
    pub seq_in: Option<u32>,
    pub seq_out: Option<u32>,
}

/// Integer bucket value of a target, if it has one
fn integer_bucket(value: f64) -> Option<u32> {
    (value.is_finite() && value.fract() == 0.0 && value >= 0.0 && value <= f64::from(u32::MAX))
        .then(|| value as u32)
}

fn positive_seq_len(flag: &'static str, value: Option<i64>) -> Result<Option<u32>> {
    value
        .map(|v| {
            u32::try_from(v)
                .ok()
                .filter(|&v| v > 0)
                .ok_or(EstimateError::NonPositiveSeqLen { flag, value: v })
        })
        .transpose()
}

impl EstimateConfig {
    /// Check the configuration before any CSV row is touched
    pub fn validate(&self) -> Result<Settings> {
        let ratio = match (self.workload.ratio_prefill, self.workload.ratio_decode) {
            (None, None) => None,
            (Some(prefill), Some(decode)) => {
                Some(WorkerRatio::new(prefill, decode).ok_or(EstimateError::NonPositiveRatio)?)
            }
            _ => return Err(EstimateError::UnpairedRatio),
        };

        let prefill_target = self
            .targets
            .ttft_s
            .map(|ttft| integer_bucket(ttft).ok_or(EstimateError::NonIntegerTtft(ttft)))
            .transpose()?;

        let tpot_target_ms = match self.targets.tpot_ms {
            Some(tpot) if !(tpot.is_finite() && tpot > 0.0) => {
                return Err(EstimateError::InvalidTpot(tpot))
            }
            other => other,
        };
        let decode_target = tpot_target_ms.and_then(integer_bucket);
        if let (Some(tpot), None) = (tpot_target_ms, decode_target) {
            tracing::debug!(
                "tpot-ms {} is not an integer bucket; evaluating all decode buckets",
                tpot
            );
        }

        Ok(Settings {
            chips: self.chips.clone(),
            prefill_target,
            decode_target,
            tpot_target_ms,
            ratio,
            seq_in: positive_seq_len("seq-in", self.workload.seq_in)?,
            seq_out: positive_seq_len("seq-out", self.workload.seq_out)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_ratio(prefill: Option<i64>, decode: Option<i64>) -> EstimateConfig {
        EstimateConfig {
            workload: WorkloadConfig {
                ratio_prefill: prefill,
                ratio_decode: decode,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_default_csv_path() {
        let config = EstimateConfig::default();
        assert_eq!(config.paths.baseline_csv.to_str(), Some("data/baseline.csv"));
        assert_eq!(config.validate().unwrap(), Settings::default());
    }

    #[test]
    fn test_ratio_must_be_paired() {
        assert!(matches!(
            with_ratio(Some(1), None).validate(),
            Err(EstimateError::UnpairedRatio)
        ));
        assert!(matches!(
            with_ratio(None, Some(2)).validate(),
            Err(EstimateError::UnpairedRatio)
        ));
    }

    #[test]
    fn test_ratio_must_be_positive() {
        assert!(matches!(
            with_ratio(Some(0), Some(2)).validate(),
            Err(EstimateError::NonPositiveRatio)
        ));
        assert!(matches!(
            with_ratio(Some(1), Some(-2)).validate(),
            Err(EstimateError::NonPositiveRatio)
        ));
        let settings = with_ratio(Some(1), Some(2)).validate().unwrap();
        assert_eq!(
            settings.ratio,
            Some(WorkerRatio {
                prefill: 1,
                decode: 2
            })
        );
    }

    #[test]
    fn test_ttft_must_be_integer() {
        let mut config = EstimateConfig::default();
        config.targets.ttft_s = Some(2.5);
        assert!(matches!(
            config.validate(),
            Err(EstimateError::NonIntegerTtft(_))
        ));

        config.targets.ttft_s = Some(5.0);
        assert_eq!(config.validate().unwrap().prefill_target, Some(5));
    }

    #[test]
    fn test_tpot_split_between_bucket_and_target() {
        let mut config = EstimateConfig::default();
        config.targets.tpot_ms = Some(20.0);
        let settings = config.validate().unwrap();
        assert_eq!(settings.decode_target, Some(20));
        assert_eq!(settings.tpot_target_ms, Some(20.0));

        config.targets.tpot_ms = Some(12.5);
        let settings = config.validate().unwrap();
        assert_eq!(settings.decode_target, None);
        assert_eq!(settings.tpot_target_ms, Some(12.5));

        config.targets.tpot_ms = Some(-1.0);
        assert!(matches!(config.validate(), Err(EstimateError::InvalidTpot(_))));
    }

    #[test]
    fn test_seq_len_must_be_positive() {
        let mut config = EstimateConfig::default();
        config.workload.seq_in = Some(0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("seq-in"));

        config.workload.seq_in = Some(256);
        config.workload.seq_out = Some(64);
        let settings = config.validate().unwrap();
        assert_eq!((settings.seq_in, settings.seq_out), (Some(256), Some(64)));
    }
}
