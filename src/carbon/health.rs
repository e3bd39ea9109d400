//! Gamified "forest health" derived from the ledger's CO2 total.
//!
//! Health is never stored authoritatively. Every surface recomputes it from
//! `total_co2_grams`; the recovery bonus lives only in the viewing session and
//! never reduces the ledger total that caused the damage.

use serde::{Deserialize, Serialize};

/// Grams of CO2 that cost one point of health.
const GRAMS_PER_HEALTH_POINT: f64 = 2.0;
const MAX_HEALTH: f64 = 100.0;

/// Flat bonus granted by a completed recovery break.
pub const RECOVERY_BONUS: f64 = 30.0;

pub fn health_percent(total_co2_grams: f64) -> f64 {
    let loss = (total_co2_grams.max(0.0) / GRAMS_PER_HEALTH_POINT).min(MAX_HEALTH);
    (MAX_HEALTH - loss).clamp(0.0, MAX_HEALTH)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum EcosystemStatus {
    Thriving,
    Warning,
    Critical,
    Collapse,
}

impl EcosystemStatus {
    pub fn from_health(health: f64) -> Self {
        if health >= 80.0 {
            EcosystemStatus::Thriving
        } else if health >= 50.0 {
            EcosystemStatus::Warning
        } else if health >= 20.0 {
            EcosystemStatus::Critical
        } else {
            EcosystemStatus::Collapse
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EcosystemStatus::Thriving => "Thriving Ecosystem",
            EcosystemStatus::Warning => "Warning Signs",
            EcosystemStatus::Critical => "Critical Condition",
            EcosystemStatus::Collapse => "Ecosystem Collapse",
        }
    }
}

/// Session-local health as shown by one presentation surface.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthView {
    total_co2_grams: f64,
    recovery_bonus: f64,
}

impl HealthView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks the latest ledger total. The recovery bonus survives ledger updates.
    pub fn observe_total(&mut self, total_co2_grams: f64) {
        self.total_co2_grams = total_co2_grams.max(0.0);
    }

    pub fn total_co2_grams(&self) -> f64 {
        self.total_co2_grams
    }

    pub fn base_health(&self) -> f64 {
        health_percent(self.total_co2_grams)
    }

    pub fn displayed_health(&self) -> f64 {
        (self.base_health() + self.recovery_bonus).min(MAX_HEALTH)
    }

    pub fn status(&self) -> EcosystemStatus {
        EcosystemStatus::from_health(self.displayed_health())
    }

    pub fn recovery_bonus(&self) -> f64 {
        self.recovery_bonus
    }

    pub fn can_start_recovery(&self) -> bool {
        self.displayed_health() < MAX_HEALTH
    }

    pub fn apply_recovery(&mut self) {
        self.recovery_bonus += RECOVERY_BONUS;
    }
}
