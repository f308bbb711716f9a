//! Events emitted by the simulation for animation, combat log and path abilities.

use serde::{Deserialize, Serialize};

use crate::enums::*;

/// Animation event delivered to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationEvent {
    pub id: u64,
    pub tick: u64,
    pub kind: AnimationKind,
    /// Set once a frame snapshot has delivered the event; Cleanup drops consumed events.
    #[serde(default)]
    pub consumed: bool,
}

/// What the presentation layer should animate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AnimationKind {
    Hit {
        attacker: Side,
        target: Side,
        damage: i32,
        is_crit: bool,
        target_died: bool,
    },
    /// Hit fully absorbed by a shield.
    Absorbed { target: Side, amount: i32 },
    Dodge { target: Side },
    Block { target: Side },
    PowerCast { caster: Side, power_id: String },
    Heal { target: Side, amount: i32 },
    StatusApplied { target: Side, kind: StatusKind },
    StatusRemoved { target: Side, kind: StatusKind },
    AbilityProc { ability_id: String },
    Death { side: Side },
    LevelUp { level: u32 },
}

/// Combat log category (drives colouring in the UI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogCategory {
    Damage,
    Heal,
    Status,
    Ability,
    Power,
    Reward,
    System,
}

/// One line of the player-facing combat log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub tick: u64,
    pub category: LogCategory,
    pub message: String,
}

/// Floating combat number above a combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatingEffect {
    pub id: u64,
    pub side: Side,
    pub kind: FloatingKind,
    pub value: i32,
    pub until_tick: u64,
}

/// A combat event recorded for path abilities and resource generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub trigger: Trigger,
    pub payload: TriggerPayload,
}

/// Context carried with a trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerPayload {
    /// Damage dealt or received by the player, if any.
    pub damage: i32,
    pub is_crit: bool,
}
