use serde::{Deserialize, Serialize};
use std::cmp;
use std::time::{Duration, Instant};

use super::health::HealthView;

/// Length of one mindfulness break.
pub const RECOVERY_DURATION: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RecoveryStatus {
    Idle,
    Breathing,
    Completed,
}

impl Default for RecoveryStatus {
    fn default() -> Self {
        RecoveryStatus::Idle
    }
}

/// Countdown for a recovery break. Completing it grants the health bonus
/// exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoverySession {
    pub status: RecoveryStatus,
    pub target_ms: u64,
    pub elapsed_ms: u64,
    #[serde(skip)]
    running_anchor: Option<Instant>,
    #[serde(skip)]
    bonus_granted: bool,
}

impl Default for RecoverySession {
    fn default() -> Self {
        Self {
            status: RecoveryStatus::Idle,
            target_ms: RECOVERY_DURATION.as_millis() as u64,
            elapsed_ms: 0,
            running_anchor: None,
            bonus_granted: false,
        }
    }
}

impl RecoverySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the countdown. Refused when the view is already at full health
    /// or a break is in progress.
    pub fn begin(&mut self, view: &HealthView, now: Instant) -> bool {
        if self.status == RecoveryStatus::Breathing || !view.can_start_recovery() {
            return false;
        }

        *self = Self {
            status: RecoveryStatus::Breathing,
            running_anchor: Some(now),
            ..Self::default()
        };
        true
    }

    pub fn remaining_ms(&self, now: Instant) -> u64 {
        match self.status {
            RecoveryStatus::Idle => self.target_ms,
            RecoveryStatus::Completed => 0,
            RecoveryStatus::Breathing => {
                let remaining = self.target_ms as i64 - self.current_elapsed_ms(now) as i64;
                cmp::max(remaining, 0) as u64
            }
        }
    }

    /// Whole seconds left, as shown on the countdown face.
    pub fn remaining_secs(&self, now: Instant) -> u64 {
        self.remaining_ms(now).div_ceil(1000)
    }

    fn current_elapsed_ms(&self, now: Instant) -> u64 {
        match (self.status, self.running_anchor) {
            (RecoveryStatus::Breathing, Some(anchor)) => {
                now.saturating_duration_since(anchor).as_millis() as u64
            }
            _ => self.elapsed_ms,
        }
    }

    /// Advances the countdown; on reaching zero marks the break completed and
    /// applies the bonus to `view`. Returns true on the tick that completes it.
    pub fn tick(&mut self, view: &mut HealthView, now: Instant) -> bool {
        if self.status != RecoveryStatus::Breathing {
            return false;
        }

        self.elapsed_ms = self.current_elapsed_ms(now).min(self.target_ms);
        if self.elapsed_ms < self.target_ms {
            return false;
        }

        self.status = RecoveryStatus::Completed;
        self.running_anchor = None;
        if !self.bonus_granted {
            self.bonus_granted = true;
            view.apply_recovery();
        }
        true
    }

    pub fn cancel(&mut self) {
        *self = Self::default();
    }
}
