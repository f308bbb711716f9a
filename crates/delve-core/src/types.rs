//! Fundamental simulation types.

use serde::{Deserialize, Serialize};

use crate::constants::TICK_MS;

/// Simulation time tracking.
///
/// `tick` counts gameplay ticks (ticks that ran while unpaused);
/// `elapsed_ms` is the effective game time, which scales with game speed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SimTime {
    /// Current tick number (increments by 1 each unpaused tick).
    pub tick: u64,
    /// Elapsed effective game time in milliseconds.
    pub elapsed_ms: f64,
}

impl SimTime {
    /// Advance by one tick of `dt_ms` effective milliseconds.
    pub fn advance(&mut self, dt_ms: f64) {
        self.tick += 1;
        self.elapsed_ms += dt_ms.max(0.0);
    }

    /// Elapsed effective game time in seconds.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_ms / 1000.0
    }
}

/// Effective milliseconds per tick at the given game speed.
///
/// Non-finite or non-positive speeds fall back to 1x.
pub fn effective_delta_ms(speed: f64) -> f64 {
    if speed.is_finite() && speed > 0.0 {
        TICK_MS * speed
    } else {
        TICK_MS
    }
}

/// Probability helper: clamp any value into `[0, 1]`, mapping NaN to 0.
pub fn clamp_chance(chance: f64) -> f64 {
    if chance.is_nan() {
        0.0
    } else {
        chance.clamp(0.0, 1.0)
    }
}
