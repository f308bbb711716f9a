//! Simulation constants and tuning parameters.

// --- Loop ---

/// Fixed simulation step in milliseconds (~62.5 Hz).
pub const TICK_MS: f64 = 16.0;

/// Maximum ticks the accumulator may hold before it is clamped.
/// Bounds the catch-up burst after the host loses focus.
pub const MAX_CATCH_UP_TICKS: u32 = 10;

/// Game speed multipliers accepted by `SetSpeed`.
pub const GAME_SPEEDS: [f64; 3] = [1.0, 2.0, 3.0];

// --- Dungeon layout ---

/// Rooms (enemies) per floor; the last room holds the floor boss.
pub const ROOMS_PER_FLOOR: u32 = 5;

/// Clearing this floor wins the run.
pub const FINAL_FLOOR: u32 = 10;

/// Per-floor enemy health/attack scaling (fraction per floor above 1).
pub const FLOOR_STAT_SCALING: f64 = 0.2;

/// Per-floor flat defense added to enemies.
pub const FLOOR_DEFENSE_STEP: i32 = 1;

/// Per-floor reward scaling (fraction per floor above 1).
pub const FLOOR_REWARD_SCALING: f64 = 0.25;

// --- Flow timing (effective milliseconds) ---

/// Delay between class selection / floor start and the first enemy.
pub const FIRST_SPAWN_DELAY_MS: f64 = 500.0;

/// Delay between an enemy's death and the next enemy spawn.
pub const NEXT_ENEMY_DELAY_MS: f64 = 1200.0;

/// Delay between the player's death and the defeat screen.
pub const DEFEAT_DELAY_MS: f64 = 1500.0;

/// Delay between the last enemy's death and the floor-complete screen.
pub const FLOOR_COMPLETE_DELAY_MS: f64 = 1000.0;

/// Length of the "entering" sub-phase after an enemy spawns.
pub const ENTERING_DURATION_MS: f64 = 600.0;

// --- Death animation (ticks) ---

/// Enemy death animation length.
pub const ENEMY_DEATH_TICKS: u64 = 30;

/// Player death animation length.
pub const PLAYER_DEATH_TICKS: u64 = 90;

// --- Combat ---

/// Speed value that yields a 1.0 speed factor.
pub const BASE_SPEED: f64 = 10.0;

/// Dodge chance granted per point of fortune.
pub const DODGE_CHANCE_PER_FORTUNE: f64 = 0.005;

/// Upper bound on dodge chance.
pub const MAX_DODGE_CHANCE: f64 = 0.25;

/// Duration applied by debuff powers that do not declare one (seconds).
pub const DEFAULT_DEBUFF_DURATION_SECS: f64 = 3.0;

/// Cooldown between stance switches.
pub const STANCE_SWITCH_COOLDOWN_MS: f64 = 3000.0;

/// Upper bound on the stun duration an ability may apply (seconds).
pub const MAX_STUN_SECS: f64 = 3.0;

// --- Progression ---

/// XP required for the first level-up.
pub const BASE_XP_TO_LEVEL: u32 = 100;

/// XP requirement growth per level.
pub const XP_GROWTH: f64 = 1.5;

/// Level at which a path may be chosen.
pub const PATH_UNLOCK_LEVEL: u32 = 2;

/// Level at which a subpath may be chosen.
pub const SUBPATH_UNLOCK_LEVEL: u32 = 5;

/// Number of abilities/enhancements offered per level-up.
pub const ABILITY_CHOICES: usize = 2;

/// Stat gains per level.
pub const LEVEL_UP_MAX_HEALTH: i32 = 10;
pub const LEVEL_UP_ATTACK: i32 = 2;
pub const LEVEL_UP_DEFENSE: i32 = 1;

// --- Presentation bookkeeping (ticks) ---

/// Animation events not consumed by a frame within this many ticks are dropped.
pub const ANIMATION_EVENT_TTL_TICKS: u64 = 120;

/// Lifetime of a floating combat number.
pub const FLOATING_EFFECT_TICKS: u64 = 60;

/// Lifetime of hit/block flash markers.
pub const HIT_FLASH_TICKS: u64 = 8;

/// Combat log entries retained (oldest dropped first).
pub const COMBAT_LOG_CAPACITY: usize = 200;
