//! Game state snapshot: the complete visible state handed to the frontend each frame.

use serde::{Deserialize, Serialize};

use crate::components::*;
use crate::enums::*;
use crate::events::{AnimationEvent, FloatingEffect, LogEntry};

/// Point-in-time copy of everything the presentation layer renders.
/// Never holds references into the world.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameStateSnapshot {
    pub tick: u64,
    pub phase: GamePhase,
    pub floor: u32,
    pub room: u32,
    pub rooms_per_floor: u32,
    pub paused: bool,
    pub speed: f64,
    pub combat_stage: CombatStage,
    pub popups: Vec<Popup>,
    pub player: Option<PlayerView>,
    pub enemy: Option<EnemyView>,
    pub animation_events: Vec<AnimationEvent>,
    pub combat_log: Vec<LogEntry>,
    pub floating_effects: Vec<FloatingEffect>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub class_id: String,
    pub health: Health,
    pub resource: Resource,
    pub attack: Attack,
    pub defense: i32,
    pub shield: Option<Shield>,
    pub statuses: Vec<StatusEffect>,
    pub buffs: Vec<Buff>,
    /// Power id with remaining cooldown (ms), in known order.
    pub powers: Vec<PowerView>,
    pub path: Option<Path>,
    pub path_resource: Option<PathResource>,
    pub stance: Option<StanceState>,
    pub progress: Progress,
    pub items: Vec<(String, u32)>,
    /// Attack-timing progress in `[0, 1]`.
    pub attack_progress: f64,
    pub dying: bool,
    pub visuals: Vec<VisualKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerView {
    pub power_id: String,
    pub remaining_ms: f64,
    pub cost: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyView {
    pub def_id: String,
    pub name: String,
    pub tier: EnemyTier,
    pub health: Health,
    pub attack: i32,
    pub defense: i32,
    pub shield: Option<Shield>,
    pub statuses: Vec<StatusEffect>,
    pub enraged: bool,
    pub fortified: bool,
    pub attack_progress: f64,
    pub dying: bool,
    pub visuals: Vec<VisualKind>,
}
