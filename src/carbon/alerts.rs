use serde::{Deserialize, Serialize};

const WARNING_ABOVE_GRAMS: f64 = 50.0;
const CRITICAL_ABOVE_GRAMS: f64 = 100.0;

/// Visual escalation of the in-page overlay for a running CO2 total.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum OverlayAlert {
    Normal,
    Warning,
    Critical,
}

impl Default for OverlayAlert {
    fn default() -> Self {
        OverlayAlert::Normal
    }
}

impl OverlayAlert {
    pub fn for_total(total_co2_grams: f64) -> Self {
        if total_co2_grams > CRITICAL_ABOVE_GRAMS {
            OverlayAlert::Critical
        } else if total_co2_grams > WARNING_ABOVE_GRAMS {
            OverlayAlert::Warning
        } else {
            OverlayAlert::Normal
        }
    }

    /// Critical totals also ask the page to offer a break.
    pub fn requests_intervention(&self) -> bool {
        matches!(self, OverlayAlert::Critical)
    }
}
