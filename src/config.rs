use anyhow::{bail, Result};
use std::time::Duration;

use crate::tracking::ReadyState;

/// Timing and detection thresholds for a tracking context.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// How often media elements are sampled; each active sample credits this much time.
    pub sample_interval: Duration,

    /// Periodic flush cadence. Always strictly longer than `sample_interval`.
    pub report_interval: Duration,

    /// Minimum buffering readiness for a sample to count.
    pub min_ready_state: ReadyState,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_secs(1),
            report_interval: Duration::from_secs(5),
            min_ready_state: ReadyState::HaveFutureData,
        }
    }
}

impl TrackerConfig {
    pub fn new(sample_interval: Duration, report_interval: Duration) -> Result<Self> {
        if sample_interval.is_zero() {
            bail!("sample interval must be greater than zero");
        }
        if report_interval <= sample_interval {
            bail!(
                "report interval ({report_interval:?}) must be longer than sample interval ({sample_interval:?})"
            );
        }

        Ok(Self {
            sample_interval,
            report_interval,
            ..Self::default()
        })
    }

    /// Defaults, with faster reporting when `ECOSHIELD_DEBUG` is set.
    pub fn from_env() -> Self {
        let debug_mode = std::env::var("ECOSHIELD_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        if debug_mode {
            Self {
                report_interval: Duration::from_secs(2),
                ..Self::default()
            }
        } else {
            Self::default()
        }
    }

    pub fn tick_secs(&self) -> f64 {
        self.sample_interval.as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_report_every_five_samples() {
        let config = TrackerConfig::default();
        assert_eq!(config.report_interval, config.sample_interval * 5);
        assert_eq!(config.tick_secs(), 1.0);
    }

    #[test]
    fn rejects_report_interval_not_longer_than_sampling() {
        assert!(TrackerConfig::new(Duration::from_secs(1), Duration::from_secs(1)).is_err());
        assert!(TrackerConfig::new(Duration::ZERO, Duration::from_secs(1)).is_err());
        assert!(TrackerConfig::new(Duration::from_millis(500), Duration::from_secs(2)).is_ok());
    }
}
