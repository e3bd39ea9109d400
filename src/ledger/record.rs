use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::carbon::{grams, health_percent};

use super::message::{CarbonReport, EcoUpdate};

pub const KEY_DAILY_STATS: &str = "dailyStats";
pub const KEY_TOTAL_CO2: &str = "totalCO2";
pub const KEY_FOREST_HEALTH: &str = "forestHealth";

/// Domain → cumulative watched seconds.
pub type DailyStats = BTreeMap<String, f64>;

/// The persisted ledger. Stats and total live in one record so that a single
/// write covers both.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LedgerRecord {
    #[serde(rename = "dailyStats")]
    pub daily_stats: DailyStats,
    #[serde(rename = "totalCO2")]
    pub total_co2: f64,
    /// Mirror of the health derived from `total_co2` for readers that cannot
    /// compute it. Never read back as a source of truth.
    #[serde(rename = "forestHealth")]
    pub forest_health: f64,
}

impl Default for LedgerRecord {
    fn default() -> Self {
        Self {
            daily_stats: DailyStats::new(),
            total_co2: 0.0,
            forest_health: 100.0,
        }
    }
}

impl LedgerRecord {
    /// Adds a report's seconds and grams. Purely additive, so merges from
    /// independent contexts commute.
    pub fn merge(&mut self, report: &CarbonReport) {
        *self
            .daily_stats
            .entry(report.domain.clone())
            .or_insert(0.0) += report.duration;
        self.total_co2 += grams(report.duration, report.quality);
        self.forest_health = health_percent(self.total_co2);
    }

    pub fn seconds_for(&self, domain: &str) -> f64 {
        self.daily_stats.get(domain).copied().unwrap_or(0.0)
    }

    pub fn total_seconds(&self) -> f64 {
        self.daily_stats.values().sum()
    }

    /// Keys whose values differ between `self` and `next`.
    pub fn changed_keys(&self, next: &LedgerRecord) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.daily_stats != next.daily_stats {
            keys.push(KEY_DAILY_STATS);
        }
        if self.total_co2 != next.total_co2 {
            keys.push(KEY_TOTAL_CO2);
        }
        if self.forest_health != next.forest_health {
            keys.push(KEY_FOREST_HEALTH);
        }
        keys
    }
}

/// Emitted to subscribers after every ledger write.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerChange {
    pub changed_keys: Vec<&'static str>,
    pub record: LedgerRecord,
    pub changed_at: DateTime<Utc>,
}

impl LedgerChange {
    /// Snapshot message for pages that embed the dashboard.
    pub fn eco_update(&self) -> EcoUpdate {
        EcoUpdate::EcoUpdate(self.record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::QualityTier;

    fn report(domain: &str, duration: f64, quality: QualityTier) -> CarbonReport {
        CarbonReport {
            domain: domain.into(),
            duration,
            quality,
        }
    }

    #[test]
    fn merge_is_additive() {
        let mut record = LedgerRecord::default();
        record.merge(&report("youtube.com", 1800.0, QualityTier::P480));
        record.merge(&report("youtube.com", 1800.0, QualityTier::P480));
        record.merge(&report("twitch.tv", 3600.0, QualityTier::P1080));

        assert_eq!(record.seconds_for("youtube.com"), 3600.0);
        assert_eq!(record.seconds_for("twitch.tv"), 3600.0);
        assert_eq!(record.total_co2, 250.0);
        assert_eq!(record.forest_health, 0.0);
        assert_eq!(record.total_seconds(), 7200.0);
    }

    #[test]
    fn merge_order_does_not_matter() {
        let a = report("youtube.com", 5.0, QualityTier::P1080);
        let b = report("youtube.com", 3.0, QualityTier::P360);

        let mut forward = LedgerRecord::default();
        forward.merge(&a);
        forward.merge(&b);

        let mut backward = LedgerRecord::default();
        backward.merge(&b);
        backward.merge(&a);

        assert_eq!(forward, backward);
    }

    #[test]
    fn lenient_decode_fills_missing_fields() {
        let record: LedgerRecord = serde_json::from_str(r#"{"totalCO2": 12.5}"#).unwrap();
        assert_eq!(record.total_co2, 12.5);
        assert!(record.daily_stats.is_empty());
        assert_eq!(record.forest_health, 100.0);
    }

    #[test]
    fn changed_keys_tracks_fields() {
        let before = LedgerRecord::default();
        let mut after = before.clone();
        after.merge(&report("youtube.com", 60.0, QualityTier::P720));

        assert_eq!(
            before.changed_keys(&after),
            vec![KEY_DAILY_STATS, KEY_TOTAL_CO2, KEY_FOREST_HEALTH]
        );
        assert!(after.changed_keys(&after).is_empty());
    }
}
