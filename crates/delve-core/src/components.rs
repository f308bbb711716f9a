//! ECS components for hecs entities.
//!
//! Components are plain data structs.
//! Game logic lives in systems, not components.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::EnemyAbility;
use crate::enums::*;

/// Marks the player entity and remembers its class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub class_id: String,
}

/// Marks an enemy entity and carries its catalog-derived identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub def_id: String,
    pub name: String,
    pub tier: EnemyTier,
    pub xp_reward: u32,
    pub gold_reward: u32,
    pub abilities: Vec<EnemyAbility>,
}

/// Session-wide game state. Exactly one entity carries it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub phase: GamePhase,
    pub floor: u32,
    /// 1-based index of the current room; 0 before the first spawn of a floor.
    pub room: u32,
    pub rooms_per_floor: u32,
    pub final_floor: u32,
    pub paused: bool,
    pub speed: f64,
    pub combat_stage: CombatStage,
    /// Pending UI popups, front first.
    pub popups: Vec<Popup>,
}

/// UI popup awaiting player input or dismissal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Popup {
    LevelUp { level: u32 },
    PathSelection { options: Vec<String> },
    AbilityChoice { options: Vec<String> },
    SubpathSelection { options: Vec<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub current: i32,
    pub max: i32,
}

/// Base resource used to pay for powers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub current: i32,
    pub max: i32,
    pub kind: ResourceKind,
    /// Passive regeneration per effective second.
    pub regen_per_sec: f64,
    /// Fractional regeneration carried between ticks.
    #[serde(default)]
    pub regen_carry: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attack {
    pub base_damage: i32,
    /// Probability in `[0, 1]`.
    pub crit_chance: f64,
    pub crit_multiplier: f64,
    /// Damage spread: rolls uniformly in `[1 - variance, 1 + variance]`.
    pub variance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Defense {
    pub value: i32,
}

/// Attack timing accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Speed {
    pub value: f64,
    pub attack_interval_ms: f64,
    pub accumulated_ms: f64,
}

/// Player luck; drives dodge chance against enemy attacks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Fortune {
    pub value: i32,
}

/// One active status effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub kind: StatusKind,
    /// Damage per nominal second (DoT kinds only).
    pub damage_per_sec: f64,
    /// Remaining duration in nominal one-second turns.
    pub remaining_turns: f64,
    /// Kind-specific strength (slow/weaken percent).
    pub magnitude: f64,
    /// Fractional DoT damage carried between ticks.
    #[serde(default)]
    pub accumulator: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusEffects(pub Vec<StatusEffect>);

/// A timed stat multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Buff {
    pub stat: BuffStat,
    pub multiplier: f64,
    pub remaining_ms: f64,
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Buffs(pub Vec<Buff>);

/// Damage absorber; depletes before health.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shield {
    pub value: i32,
    pub remaining_ms: f64,
    pub max_duration_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cooldown {
    pub remaining_ms: f64,
    pub base_ms: f64,
}

/// Power cooldowns keyed by power id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cooldowns(pub BTreeMap<String, Cooldown>);

/// Powers the player can cast, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnownPowers(pub Vec<String>);

/// The player's chosen progression path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub path_id: String,
    pub subpath_id: Option<String>,
    /// Unlocked ability (or enhancement) ids, in unlock order.
    pub abilities: Vec<String>,
    /// Remaining cooldown per ability id, in effective milliseconds.
    pub ability_cooldowns: BTreeMap<String, f64>,
}

/// Resource generated by combat triggers on active paths.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathResource {
    pub kind: PathResourceKind,
    pub current: i32,
    pub max: i32,
    pub generation: BTreeMap<Trigger, i32>,
}

/// Stance bookkeeping for stance-based paths.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StanceState {
    pub available: Vec<String>,
    pub active: String,
    /// Acquired enhancement ids; inert unless their stance is active.
    pub enhancements: Vec<String>,
    pub switch_cooldown_ms: f64,
}

/// Passive effect bookkeeping, split by reset scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassiveEffectState {
    /// Reset on every new enemy.
    pub combat: CombatPassiveState,
    /// Reset on every new floor.
    pub floor: FloorPassiveState,
    /// Never reset within a run.
    pub permanent: PermanentPassiveState,
    /// Aggregated stance parameters. Written only by the passive computation step.
    pub computed: ComputedPassives,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatPassiveState {
    pub damage_stacks: u32,
    pub next_attack_bonus: bool,
    pub regen_carry: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FloorPassiveState {
    pub survive_lethal_used: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PermanentPassiveState {
    /// Max-health bonus currently applied from `max_health_percent`.
    pub applied_max_health_bonus: i32,
}

/// Flat record of every stance parameter after aggregation.
/// Percent fields are whole percents (25.0 = +25%); chances are in `[0, 1]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComputedPassives {
    pub armor_percent: f64,
    pub power_percent: f64,
    pub speed_percent: f64,
    pub damage_reduction_percent: f64,
    pub max_health_percent: f64,
    pub regen_percent: f64,

    pub reflect_percent: f64,
    pub counter_chance: f64,
    pub counter_damage_percent: f64,
    pub lifesteal_percent: f64,
    pub block_chance: f64,
    pub aura_damage_per_sec: f64,
    pub hex_damage_reduction_percent: f64,

    pub low_hp_armor_threshold: f64,
    pub low_hp_armor_bonus: f64,
    pub low_hp_damage_threshold: f64,
    pub low_hp_damage_percent: f64,

    pub survive_lethal: bool,
    /// Cap on a single hit as percent of max health; 0 = uncapped.
    pub max_damage_per_hit_percent: f64,
    pub heal_on_hit_chance: f64,
    pub heal_on_hit_percent: f64,
    pub stack_damage_percent: f64,
    pub max_stacks: u32,
    pub next_attack_bonus_percent: f64,

    pub proc_chance: f64,
    pub proc_bonus_damage: f64,
    pub proc_burn_dps: f64,
    pub proc_burn_duration: f64,

    pub burn_damage_percent: f64,
    /// Burn passes per nominal second; 0 means the default single pass.
    pub burn_tick_rate: f64,
    pub burn_execute_threshold: f64,
    pub burn_execute_bonus_percent: f64,

    /// HP%-gated armor bonus currently in effect (conditional update).
    pub active_armor_bonus: f64,
    /// HP%-gated damage percent currently in effect (conditional update).
    pub active_damage_percent: f64,
}

/// Player progression and wallet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub level: u32,
    pub xp: u32,
    pub xp_to_next: u32,
    pub gold: u32,
}

/// Owned items and their enhancement level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub items: BTreeMap<String, u32>,
}

/// A temporary flat stat boost that reverts on expiry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedBoost {
    pub amount: i32,
    pub remaining_ms: f64,
}

/// Enemy-only timed flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EnemyTimers {
    /// Attack bonus; reverts `Attack::base_damage` on expiry.
    pub enrage: Option<TimedBoost>,
    /// Defense bonus; reverts `Defense::value` on expiry.
    pub fortify: Option<TimedBoost>,
}

/// Death animation marker. At most one per entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dying {
    pub started_at_tick: u64,
    pub duration_ticks: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualMarker {
    pub kind: VisualKind,
    pub until_tick: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualMarkers(pub Vec<VisualMarker>);
