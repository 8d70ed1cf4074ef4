//! Fixed-period spawn timer
//!
//! Driven by the frame loop: each frame adds its elapsed time and the timer
//! reports how many periods completed. Frame time and spawn time therefore
//! never interleave.

use serde::{Deserialize, Serialize};

use crate::consts::SPAWN_PERIOD_MS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnTimer {
    period_ms: f64,
    elapsed_ms: f64,
    armed: bool,
}

impl SpawnTimer {
    /// A disarmed timer with the period for `speed`
    pub fn new(speed: u32) -> Self {
        Self {
            period_ms: Self::period_for_speed(speed),
            elapsed_ms: 0.0,
            armed: false,
        }
    }

    /// `50 ms / speed`, never below 1 ms
    pub fn period_for_speed(speed: u32) -> f64 {
        (SPAWN_PERIOD_MS / speed.max(1) as f64).max(1.0)
    }

    pub fn period_ms(&self) -> f64 {
        self.period_ms
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Start counting from zero
    pub fn arm(&mut self) {
        self.armed = true;
        self.elapsed_ms = 0.0;
    }

    pub fn disarm(&mut self) {
        self.armed = false;
        self.elapsed_ms = 0.0;
    }

    /// Change the period; time already elapsed carries over
    pub fn set_speed(&mut self, speed: u32) {
        self.period_ms = Self::period_for_speed(speed);
    }

    /// Add `dt_ms` and return how many periods completed
    pub fn advance(&mut self, dt_ms: f64) -> u32 {
        if !self.armed || !(dt_ms > 0.0) {
            return 0;
        }
        self.elapsed_ms += dt_ms;
        let mut fired = 0;
        while self.elapsed_ms >= self.period_ms {
            self.elapsed_ms -= self.period_ms;
            fired += 1;
        }
        fired
    }
}
