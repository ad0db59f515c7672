//! Points and miss streaks

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_TAUNT_STAGE, MISS_TAUNT_THRESHOLD};

/// Points for a ball that landed in the basket, by throw distance (metres).
///
/// Bands are half-open on the left: a distance exactly on a boundary belongs
/// to the nearer band. Non-positive and NaN distances score nothing.
pub fn points_for_distance(distance: f32) -> u32 {
    if distance.is_nan() || distance <= 0.0 {
        0
    } else if distance <= 0.75 {
        1
    } else if distance <= 1.5 {
        2
    } else if distance <= 2.5 {
        3
    } else {
        5
    }
}

/// Running score and taunt state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreState {
    pub total: u32,
    pub consecutive_misses: u32,
    /// Misses per taunt stage
    pub threshold: u32,
    /// Active taunt stage, 0 when none
    pub taunt_stage: u32,
    /// Throws are blocked until the taunt tune finishes
    pub paused: bool,
}

impl Default for ScoreState {
    fn default() -> Self {
        Self::new(MISS_TAUNT_THRESHOLD)
    }
}

impl ScoreState {
    pub fn new(threshold: u32) -> Self {
        Self {
            total: 0,
            consecutive_misses: 0,
            threshold: threshold.max(1),
            taunt_stage: 0,
            paused: false,
        }
    }

    /// Add points. Any nonzero score breaks the miss streak.
    pub fn record_hit(&mut self, points: u32) {
        self.total += points;
        if points > 0 {
            self.consecutive_misses = 0;
        }
    }

    /// Count a miss. Returns the taunt stage to start when the streak hits a
    /// multiple of the threshold.
    pub fn record_miss(&mut self) -> Option<u32> {
        self.consecutive_misses += 1;
        if self.consecutive_misses % self.threshold != 0 {
            return None;
        }
        let stage = (self.consecutive_misses / self.threshold).min(MAX_TAUNT_STAGE);
        self.taunt_stage = stage;
        self.paused = true;
        Some(stage)
    }

    /// The taunt tune finished. Returns false if no taunt was running.
    pub fn end_taunt(&mut self) -> bool {
        let was_running = self.paused || self.taunt_stage > 0;
        self.clear_taunt();
        was_running
    }

    pub fn clear_taunt(&mut self) {
        self.taunt_stage = 0;
        self.paused = false;
    }
}
