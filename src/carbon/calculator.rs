use serde::{Deserialize, Serialize};

/// Grams of CO2 per minute of feed scrolling.
pub const SCROLLING_GRAMS_PER_MIN: f64 = 1.5;
/// Grams of CO2 per minute of video streaming when no tier is known.
pub const STREAMING_GRAMS_PER_MIN: f64 = 3.0;

/// Self-reported usage for surfaces that have no live tracker feeding them.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManualUsage {
    pub scrolling_mins: f64,
    pub streaming_mins: f64,
}

impl ManualUsage {
    pub fn new(scrolling_mins: f64, streaming_mins: f64) -> Self {
        Self {
            scrolling_mins: scrolling_mins.max(0.0),
            streaming_mins: streaming_mins.max(0.0),
        }
    }

    pub fn scrolling_grams(&self) -> f64 {
        self.scrolling_mins * SCROLLING_GRAMS_PER_MIN
    }

    pub fn streaming_grams(&self) -> f64 {
        self.streaming_mins * STREAMING_GRAMS_PER_MIN
    }

    pub fn total_grams(&self) -> f64 {
        self.scrolling_grams() + self.streaming_grams()
    }
}
