//! Dev-mode parameter source.
//!
//! Read-only to the simulation. The host decides where the values come from
//! (the headless binary reads them as JSON from `DELVE_DEV`).

use serde::{Deserialize, Serialize};

/// Developer overrides applied at class selection and on rewards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevParams {
    /// Replaces the class's base attack damage.
    pub attack_override: Option<i32>,
    /// Replaces the class's base defense.
    pub defense_override: Option<i32>,
    /// Replaces the starting gold.
    pub gold_override: Option<u32>,
    /// Floor the run starts on.
    pub starting_floor: u32,
    /// Multiplier on every XP reward.
    pub xp_multiplier: f64,
}

impl Default for DevParams {
    fn default() -> Self {
        Self {
            attack_override: None,
            defense_override: None,
            gold_override: None,
            starting_floor: 1,
            xp_multiplier: 1.0,
        }
    }
}

impl DevParams {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Starting floor, never below 1.
    pub fn starting_floor(&self) -> u32 {
        self.starting_floor.max(1)
    }

    /// XP multiplier; non-finite or negative values read as 1.
    pub fn xp_multiplier(&self) -> f64 {
        if self.xp_multiplier.is_finite() && self.xp_multiplier >= 0.0 {
            self.xp_multiplier
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let dev = DevParams::from_json(r#"{"xp_multiplier": 2.5}"#).unwrap();
        assert_eq!(dev.xp_multiplier(), 2.5);
        assert_eq!(dev.starting_floor(), 1);
        assert!(dev.attack_override.is_none());
    }

    #[test]
    fn bad_values_are_clamped() {
        let dev = DevParams {
            starting_floor: 0,
            xp_multiplier: f64::NAN,
            ..Default::default()
        };
        assert_eq!(dev.starting_floor(), 1);
        assert_eq!(dev.xp_multiplier(), 1.0);
    }
}
