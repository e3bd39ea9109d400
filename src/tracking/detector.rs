use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::quality::{classify, QualityTier};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MediaId(pub u64);

/// Buffering readiness of a media element, ordered from least to most ready.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum ReadyState {
    HaveNothing,
    HaveMetadata,
    HaveCurrentData,
    HaveFutureData,
    HaveEnoughData,
}

impl ReadyState {
    /// Maps the numeric `readyState` a page reports (0 to 4). Levels above 4
    /// are treated as fully buffered.
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => ReadyState::HaveNothing,
            1 => ReadyState::HaveMetadata,
            2 => ReadyState::HaveCurrentData,
            3 => ReadyState::HaveFutureData,
            _ => ReadyState::HaveEnoughData,
        }
    }
}

/// Point-in-time observation of one media element on the page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaProbe {
    pub id: MediaId,
    pub paused: bool,
    pub ended: bool,
    pub ready_state: ReadyState,
    pub playback_rate: f64,
    /// Playback position in seconds.
    pub current_time: f64,
    pub video_height: Option<u32>,
}

/// Anything that can enumerate the media elements currently present in a page.
/// Implementations may poll or cache values pushed from playback events; the
/// detector applies the same progress check either way.
pub trait MediaSource: Send + Sync {
    fn probe(&self) -> Vec<MediaProbe>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveSample {
    pub media: MediaId,
    pub quality: QualityTier,
    pub position: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct PlaybackDetector {
    min_ready_state: ReadyState,
}

impl Default for PlaybackDetector {
    fn default() -> Self {
        Self::new(ReadyState::HaveFutureData)
    }
}

impl PlaybackDetector {
    pub fn new(min_ready_state: ReadyState) -> Self {
        Self { min_ready_state }
    }

    /// Returns the first candidate that made forward progress since the last
    /// sample. Every present candidate's position is recorded whether or not it
    /// counted, and handles that disappeared are forgotten.
    pub fn sample(
        &self,
        candidates: &[MediaProbe],
        previous_positions: &mut HashMap<MediaId, f64>,
    ) -> Option<ActiveSample> {
        let mut active = None;

        for probe in candidates {
            let previous = previous_positions.get(&probe.id).copied().unwrap_or(0.0);
            if active.is_none() && self.is_progressing(probe, previous) {
                active = Some(ActiveSample {
                    media: probe.id,
                    quality: classify(probe.video_height),
                    position: probe.current_time,
                });
            }
            previous_positions.insert(probe.id, probe.current_time);
        }

        previous_positions.retain(|id, _| candidates.iter().any(|probe| probe.id == *id));
        active
    }

    fn is_progressing(&self, probe: &MediaProbe, previous_position: f64) -> bool {
        !probe.paused
            && !probe.ended
            && probe.ready_state >= self.min_ready_state
            && probe.playback_rate > 0.0
            // Stalled or backgrounded players still claim to be playing; a seek
            // backwards yields a negative delta. Neither counts.
            && probe.current_time > previous_position
    }
}
