use serde::Serialize;

use crate::carbon::{EcosystemStatus, HealthView, OverlayAlert};

use super::record::LedgerRecord;

/// CO2 mass at which the dashboard's impact bar is full.
const RATIO_SCALE_GRAMS: f64 = 200.0;
/// Suggested daily ceiling shown next to the impact bar.
pub const DAILY_TARGET_GRAMS: f64 = 50.0;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DomainUsage {
    pub domain: String,
    pub seconds: f64,
    pub label: String,
}

/// Everything a popup, overlay or dashboard renders, computed from one ledger
/// snapshot so that all surfaces agree.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EcoSummary {
    pub total_co2_grams: f64,
    pub total_co2_label: String,
    pub health_percent: f64,
    pub status: EcosystemStatus,
    pub status_label: String,
    pub alert: OverlayAlert,
    pub carbon_ratio_percent: f64,
    pub within_daily_target: bool,
    pub can_start_recovery: bool,
    pub domains: Vec<DomainUsage>,
}

impl EcoSummary {
    pub fn build(record: &LedgerRecord, view: &HealthView) -> Self {
        let total = record.total_co2.max(0.0);
        let mut domains: Vec<DomainUsage> = record
            .daily_stats
            .iter()
            .map(|(domain, seconds)| DomainUsage {
                domain: domain.clone(),
                seconds: *seconds,
                label: format_watch_time(*seconds),
            })
            .collect();
        domains.sort_by(|a, b| b.seconds.total_cmp(&a.seconds).then_with(|| a.domain.cmp(&b.domain)));

        Self {
            total_co2_grams: total,
            total_co2_label: format_grams(total),
            health_percent: view.displayed_health(),
            status: view.status(),
            status_label: view.status().label().to_string(),
            alert: OverlayAlert::for_total(total),
            carbon_ratio_percent: (total / RATIO_SCALE_GRAMS * 100.0).min(100.0),
            within_daily_target: total < DAILY_TARGET_GRAMS,
            can_start_recovery: view.can_start_recovery(),
            domains,
        }
    }
}

pub fn format_grams(grams: f64) -> String {
    format!("{grams:.1}g")
}

/// `"{minutes}m {seconds}s"`, both truncated.
pub fn format_watch_time(seconds: f64) -> String {
    let whole = seconds.max(0.0).floor() as u64;
    format!("{}m {}s", whole / 60, whole % 60)
}
