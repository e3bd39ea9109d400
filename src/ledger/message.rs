use serde::{Deserialize, Serialize};

use crate::quality::QualityTier;

use super::record::LedgerRecord;

/// One flush worth of watch time from a tracking context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CarbonReport {
    pub domain: String,
    /// Seconds watched since the previous flush.
    pub duration: f64,
    /// Missing or null on the wire means the default tier.
    #[serde(default)]
    pub quality: QualityTier,
}

impl CarbonReport {
    /// Reports with no domain or no positive, finite duration are dropped by the ledger.
    pub fn is_mergeable(&self) -> bool {
        !self.domain.trim().is_empty() && self.duration.is_finite() && self.duration > 0.0
    }
}

/// Tracker → aggregator wire message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CarbonMessage {
    UpdateCarbon(CarbonReport),
}

/// Snapshot broadcast to embedding pages such as the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EcoUpdate {
    EcoUpdate(LedgerRecord),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn update_carbon_wire_shape() {
        let message = CarbonMessage::UpdateCarbon(CarbonReport {
            domain: "youtube.com".into(),
            duration: 5.0,
            quality: QualityTier::P1080,
        });

        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "type": "UPDATE_CARBON",
                "payload": { "domain": "youtube.com", "duration": 5.0, "quality": "1080p" }
            })
        );
    }

    #[test]
    fn unknown_quality_on_the_wire_decodes_to_default() {
        let message: CarbonMessage = serde_json::from_value(json!({
            "type": "UPDATE_CARBON",
            "payload": { "domain": "vimeo.com", "duration": 2.5, "quality": "potato" }
        }))
        .unwrap();

        let CarbonMessage::UpdateCarbon(report) = message;
        assert_eq!(report.quality, QualityTier::P480);
    }

    #[test]
    fn missing_or_null_quality_decodes_to_default() {
        for payload in [
            json!({ "domain": "youtube.com", "duration": 5 }),
            json!({ "domain": "youtube.com", "duration": 5, "quality": null }),
        ] {
            let message: CarbonMessage =
                serde_json::from_value(json!({ "type": "UPDATE_CARBON", "payload": payload }))
                    .unwrap();

            let CarbonMessage::UpdateCarbon(report) = message;
            assert_eq!(report.domain, "youtube.com");
            assert_eq!(report.duration, 5.0);
            assert_eq!(report.quality, QualityTier::P480);
        }
    }

    #[test]
    fn skip_conditions() {
        let mut report = CarbonReport {
            domain: "youtube.com".into(),
            duration: 1.0,
            quality: QualityTier::P720,
        };
        assert!(report.is_mergeable());

        report.duration = 0.0;
        assert!(!report.is_mergeable());
        report.duration = f64::NAN;
        assert!(!report.is_mergeable());
        report.duration = 1.0;
        report.domain = " ".into();
        assert!(!report.is_mergeable());
    }

    #[test]
    fn eco_update_wire_shape() {
        let update = EcoUpdate::EcoUpdate(LedgerRecord::default());
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["type"], "ECO_UPDATE");
        assert_eq!(value["payload"]["totalCO2"], 0.0);
        assert_eq!(value["payload"]["forestHealth"], 100.0);
    }
}
