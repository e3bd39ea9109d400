//! Converts watch time into an estimated CO2 mass.
//!
//! Rates are global-average figures covering data centre, network and device
//! energy per hour of playback. They are configured constants, not derived from
//! live grid intensity.

use crate::quality::QualityTier;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Emission rate in grams of CO2 per hour of playback at `tier`.
pub fn rate_grams_per_hour(tier: QualityTier) -> f64 {
    match tier {
        QualityTier::P360 => 70.0,
        QualityTier::P480 => 90.0,
        QualityTier::P720 => 120.0,
        QualityTier::P1080 => 160.0,
        QualityTier::P1440 => 260.0,
        QualityTier::P2160 => 580.0,
    }
}

pub fn grams(duration_secs: f64, tier: QualityTier) -> f64 {
    (duration_secs / SECONDS_PER_HOUR) * rate_grams_per_hour(tier)
}

/// Same as [`grams`] for a raw tier label; unknown labels use the default tier's rate.
pub fn grams_for_label(duration_secs: f64, label: &str) -> f64 {
    grams(duration_secs, QualityTier::from_label(label))
}
