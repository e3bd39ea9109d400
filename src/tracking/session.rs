use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::quality::QualityTier;

use super::detector::{MediaId, MediaProbe, PlaybackDetector};

/// Watch time accumulated by one tracking context since its last flush.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub context_id: String,
    pub domain: Option<String>,
    pub pending_seconds: f64,
    pub quality_tier: Option<QualityTier>,
    /// Seconds credited per active tick.
    pub tick_secs: f64,
    #[serde(skip)]
    last_positions: HashMap<MediaId, f64>,
}

impl Session {
    pub fn new(domain: Option<String>, tick_secs: f64) -> Self {
        Self {
            context_id: Uuid::new_v4().to_string(),
            domain,
            pending_seconds: 0.0,
            quality_tier: None,
            tick_secs,
            last_positions: HashMap::new(),
        }
    }

    /// Runs one sampling tick. Returns whether playback progressed.
    ///
    /// The tier is overwritten by the latest active sample; it is not weighted
    /// by time across quality switches within one report interval.
    pub fn tick(&mut self, detector: &PlaybackDetector, probes: &[MediaProbe]) -> bool {
        match detector.sample(probes, &mut self.last_positions) {
            Some(sample) => {
                self.pending_seconds += self.tick_secs;
                self.quality_tier = Some(sample.quality);
                true
            }
            None => false,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending_seconds > 0.0
    }

    /// Called only once a send has been handed to the transport without error.
    pub fn mark_flushed(&mut self) {
        self.pending_seconds = 0.0;
    }

    pub fn last_position(&self, media: MediaId) -> Option<f64> {
        self.last_positions.get(&media).copied()
    }

    /// Drops all transient state when the context stops tracking.
    pub fn clear(&mut self) {
        self.pending_seconds = 0.0;
        self.quality_tier = None;
        self.last_positions.clear();
    }
}
