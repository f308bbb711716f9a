//! Combat hooks.
//!
//! Hooks read the computed passives and may mutate only the caller's own
//! combat sub-state. Anything that affects another entity is returned for
//! the caller to apply.

use delve_core::components::{CombatPassiveState, ComputedPassives, FloorPassiveState};
use delve_core::types::clamp_chance;
use rand::Rng;

/// Outgoing damage multiplier for the attacker.
///
/// Consumes the pending next-attack bonus if one is armed.
pub fn outgoing_multiplier(c: &ComputedPassives, combat: &mut CombatPassiveState) -> f64 {
    let mut percent = c.power_percent
        + c.active_damage_percent
        + combat.damage_stacks as f64 * c.stack_damage_percent;
    if combat.next_attack_bonus {
        percent += c.next_attack_bonus_percent;
        combat.next_attack_bonus = false;
    }
    (1.0 + percent / 100.0).max(0.0)
}

/// Incoming damage after the defender's passives.
///
/// Subtracts the conditional armor bonus, applies damage reduction, caps a
/// single hit at `max_damage_per_hit_percent` of max health, floors at 1.
pub fn pre_damage(c: &ComputedPassives, damage: i32, max_health: i32) -> i32 {
    let mut amount = damage as f64 - c.active_armor_bonus;
    amount *= (1.0 - c.damage_reduction_percent / 100.0).max(0.0);
    if c.max_damage_per_hit_percent > 0.0 && max_health > 0 {
        let cap = max_health as f64 * c.max_damage_per_hit_percent / 100.0;
        amount = amount.min(cap);
    }
    (amount.round() as i32).max(1)
}

/// Auto-block roll.
pub fn roll_block(c: &ComputedPassives, rng: &mut impl Rng) -> bool {
    c.block_chance > 0.0 && rng.gen_bool(clamp_chance(c.block_chance))
}

/// Result of the on-damaged hook.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OnDamaged {
    /// Damage reflected back at the attacker (0 = none).
    pub reflect: i32,
    /// Counter-attack damage (0 = no counter).
    pub counter: i32,
    /// Heal for the defender (0 = none).
    pub heal: i32,
}

/// Defender reacts to a landed hit of `damage` health damage.
///
/// Rolls counter then heal-on-hit, in that order, only when their chance is set.
pub fn on_damaged(
    c: &ComputedPassives,
    combat: &mut CombatPassiveState,
    damage: i32,
    attack_damage: i32,
    max_health: i32,
    rng: &mut impl Rng,
) -> OnDamaged {
    let mut out = OnDamaged::default();

    if c.reflect_percent > 0.0 && damage > 0 {
        out.reflect = ((damage as f64 * c.reflect_percent / 100.0).round() as i32).max(1);
    }

    if c.counter_chance > 0.0 && rng.gen_bool(clamp_chance(c.counter_chance)) {
        out.counter =
            ((attack_damage.max(0) as f64 * c.counter_damage_percent / 100.0).round() as i32).max(1);
    }

    if c.heal_on_hit_chance > 0.0 && rng.gen_bool(clamp_chance(c.heal_on_hit_chance)) {
        out.heal = ((max_health.max(0) as f64 * c.heal_on_hit_percent / 100.0).round() as i32).max(1);
    }

    if c.stack_damage_percent > 0.0 && combat.damage_stacks < c.max_stacks {
        combat.damage_stacks += 1;
    }

    if c.next_attack_bonus_percent > 0.0 {
        combat.next_attack_bonus = true;
    }

    out
}

/// Lifesteal heal for `damage` dealt.
pub fn lifesteal(c: &ComputedPassives, damage: i32) -> i32 {
    if c.lifesteal_percent <= 0.0 || damage <= 0 {
        return 0;
    }
    (damage as f64 * c.lifesteal_percent / 100.0).round() as i32
}

/// A landed proc: bonus damage plus an optional burn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proc {
    pub bonus_damage: i32,
    pub burn_dps: f64,
    pub burn_duration_secs: f64,
}

/// On-hit proc roll for the attacker.
pub fn roll_proc(c: &ComputedPassives, rng: &mut impl Rng) -> Option<Proc> {
    if c.proc_chance <= 0.0 || !rng.gen_bool(clamp_chance(c.proc_chance)) {
        return None;
    }
    Some(Proc {
        bonus_damage: c.proc_bonus_damage.round().max(0.0) as i32,
        burn_dps: c.proc_burn_dps.max(0.0),
        burn_duration_secs: c.proc_burn_duration.max(0.0),
    })
}

/// Survive-lethal check. Returns the health to restore to, once per floor.
///
/// The caller marks the floor usage.
pub fn survive_lethal(c: &ComputedPassives, floor: &FloorPassiveState) -> Option<i32> {
    if c.survive_lethal && !floor.survive_lethal_used {
        Some(1)
    } else {
        None
    }
}

/// Outgoing damage reduction from the defender's hex aura, as a multiplier.
pub fn hex_multiplier(c: &ComputedPassives) -> f64 {
    (1.0 - c.hex_damage_reduction_percent / 100.0).clamp(0.0, 1.0)
}
