//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

/// Top-level game phase, stored on the game-state entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    #[default]
    Menu,
    ClassSelect,
    Combat,
    FloorComplete,
    Shop,
    Defeat,
    Victory,
}

/// Sub-state of the combat phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum CombatStage {
    /// No enemy engaged yet (waiting for the next spawn).
    #[default]
    Idle,
    /// Enemy is walking in; gameplay systems hold until the timer elapses.
    Entering { remaining_ms: f64 },
    /// Player and enemy are fighting.
    Engaged,
}

/// Which combatant an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Player,
    Enemy,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Player => Side::Enemy,
            Side::Enemy => Side::Player,
        }
    }
}

/// Combat events that path abilities and path resources react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    OnHit,
    OnCrit,
    OnKill,
    OnDamaged,
    OnPowerUse,
    OnDodge,
    OnBlock,
    CombatStart,
    TurnStart,
}

/// Status effect kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Poison,
    Bleed,
    Burn,
    /// Skips attack timing while active.
    Stun,
    /// Slows attack timing by `magnitude` percent.
    Slow,
    /// Reduces outgoing damage by `magnitude` percent.
    Weaken,
    /// Lethal damage restores the bearer to 1 HP instead.
    DeathImmunity,
}

impl StatusKind {
    /// Damage-over-time kinds tick health through the carry-over accumulator.
    pub fn is_damage_over_time(self) -> bool {
        matches!(self, StatusKind::Poison | StatusKind::Bleed | StatusKind::Burn)
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusKind::Poison => "Poison",
            StatusKind::Bleed => "Bleed",
            StatusKind::Burn => "Burn",
            StatusKind::Stun => "Stun",
            StatusKind::Slow => "Slow",
            StatusKind::Weaken => "Weaken",
            StatusKind::DeathImmunity => "Undying",
        }
    }
}

/// Stat targeted by a timed buff multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuffStat {
    Attack,
    Defense,
    Speed,
    CritChance,
}

/// Base resource pool used to cast powers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    #[default]
    Mana,
    Energy,
}

/// Path-specific resource. `Default` means the path has no resource of its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathResourceKind {
    #[default]
    Default,
    Rage,
    Momentum,
    Arcane,
    Faith,
}

/// Enemy strength category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyTier {
    #[default]
    Normal,
    Elite,
    Boss,
}

/// Short-lived visual marker kinds attached to combatants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisualKind {
    HitFlash,
    CritFlash,
    BlockFlash,
    DodgeBlur,
    HealGlow,
}

/// Floating combat number category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FloatingKind {
    Damage,
    Critical,
    Heal,
    DamageOverTime,
    Absorbed,
    Miss,
}
