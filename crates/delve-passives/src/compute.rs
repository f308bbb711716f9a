//! Passive aggregation.
//!
//! `compute` runs only when the active stance or the set of acquired
//! enhancements changes. `update_conditional` runs every combat tick and only
//! re-derives the HP%-gated bonuses from the thresholds already aggregated.

use delve_core::catalog::{Catalog, StanceEffect};
use delve_core::components::{ComputedPassives, StanceState};
use tracing::debug;

/// Aggregate the active stance plus every acquired enhancement owned by it.
///
/// Enhancements owned by other stances are inert. Unknown ids contribute nothing.
pub fn compute(catalog: &Catalog, stance: &StanceState) -> ComputedPassives {
    let mut computed = ComputedPassives::default();

    let Some(active) = catalog.stance(&stance.active) else {
        debug!(stance = %stance.active, "unknown active stance, passives inert");
        return computed;
    };
    for effect in &active.effects {
        apply_effect(&mut computed, effect);
    }

    for id in &stance.enhancements {
        let Some(enhancement) = catalog.enhancement(id) else {
            continue;
        };
        if enhancement.stance_id != active.id {
            continue;
        }
        for effect in &enhancement.effects {
            apply_effect(&mut computed, effect);
        }
    }

    computed
}

/// Fold one effect into the record. Additive unless the field is a threshold,
/// cap, or duration, which replace.
pub fn apply_effect(c: &mut ComputedPassives, effect: &StanceEffect) {
    match *effect {
        StanceEffect::ArmorPercent { value } => c.armor_percent += value,
        StanceEffect::PowerPercent { value } => c.power_percent += value,
        StanceEffect::SpeedPercent { value } => c.speed_percent += value,
        StanceEffect::DamageReductionPercent { value } => c.damage_reduction_percent += value,
        StanceEffect::MaxHealthPercent { value } => c.max_health_percent += value,
        StanceEffect::RegenPercent { value } => c.regen_percent += value,
        StanceEffect::Reflect { percent } => c.reflect_percent += percent,
        StanceEffect::Counter {
            chance,
            damage_percent,
        } => {
            c.counter_chance += chance;
            c.counter_damage_percent += damage_percent;
        }
        StanceEffect::Lifesteal { percent } => c.lifesteal_percent += percent,
        StanceEffect::AutoBlock { chance } => c.block_chance += chance,
        StanceEffect::DamageAura { damage_per_sec } => c.aura_damage_per_sec += damage_per_sec,
        StanceEffect::HexAura { reduction_percent } => {
            c.hex_damage_reduction_percent += reduction_percent
        }
        StanceEffect::LowHpArmor { threshold, bonus } => {
            c.low_hp_armor_threshold = threshold;
            c.low_hp_armor_bonus += bonus;
        }
        StanceEffect::LowHpDamage { threshold, bonus } => {
            c.low_hp_damage_threshold = threshold;
            c.low_hp_damage_percent += bonus;
        }
        StanceEffect::SurviveLethal => c.survive_lethal = true,
        StanceEffect::MaxDamagePerHit { percent } => c.max_damage_per_hit_percent = percent,
        StanceEffect::HealOnHit { chance, percent } => {
            c.heal_on_hit_chance += chance;
            c.heal_on_hit_percent = percent;
        }
        StanceEffect::DamageStacks {
            per_stack,
            max_stacks,
        } => {
            c.stack_damage_percent += per_stack;
            c.max_stacks = max_stacks;
        }
        StanceEffect::NextAttackBonus { percent } => c.next_attack_bonus_percent += percent,
        StanceEffect::ProcBurn {
            chance,
            bonus_damage,
            burn_dps,
            duration_secs,
        } => {
            c.proc_chance += chance;
            c.proc_bonus_damage += bonus_damage;
            c.proc_burn_dps += burn_dps;
            c.proc_burn_duration = duration_secs;
        }
        StanceEffect::BurnAmplify { percent } => c.burn_damage_percent += percent,
        StanceEffect::BurnTickRate { rate } => c.burn_tick_rate = rate,
        StanceEffect::BurnExecute {
            threshold,
            bonus_percent,
        } => {
            c.burn_execute_threshold = threshold;
            c.burn_execute_bonus_percent += bonus_percent;
        }
    }
}

/// Re-derive HP%-gated bonuses from the current health ratio.
///
/// Thresholds are percent of max health; a zero threshold disables the bonus.
pub fn update_conditional(c: &mut ComputedPassives, current: i32, max: i32) {
    let hp_percent = health_percent(current, max);

    c.active_armor_bonus = if c.low_hp_armor_threshold > 0.0 && hp_percent < c.low_hp_armor_threshold
    {
        c.low_hp_armor_bonus
    } else {
        0.0
    };

    c.active_damage_percent =
        if c.low_hp_damage_threshold > 0.0 && hp_percent < c.low_hp_damage_threshold {
            c.low_hp_damage_percent
        } else {
            0.0
        };
}

/// Health as percent of max. A non-positive max reads as 0%.
pub fn health_percent(current: i32, max: i32) -> f64 {
    if max <= 0 {
        return 0.0;
    }
    (current.max(0) as f64 / max as f64) * 100.0
}

/// Defense after the stance armor modifier. Never negative.
pub fn effective_defense(c: &ComputedPassives, base: i32) -> f64 {
    (base as f64 * (1.0 + c.armor_percent / 100.0)).max(0.0)
}

/// Attack-timing factor contributed by the stance speed modifier.
pub fn speed_factor(c: &ComputedPassives) -> f64 {
    (1.0 + c.speed_percent / 100.0).max(0.1)
}

/// Max health bonus granted by `max_health_percent` on top of `base_max`.
pub fn max_health_bonus(c: &ComputedPassives, base_max: i32) -> i32 {
    (base_max.max(0) as f64 * c.max_health_percent / 100.0).round() as i32
}

/// Health regenerated per effective second.
pub fn regen_per_sec(c: &ComputedPassives, max: i32) -> f64 {
    (max.max(0) as f64 * c.regen_percent / 100.0).max(0.0)
}

/// Burn damage multiplier for a target at `target_hp_percent`.
///
/// The execute bonus composes multiplicatively with the amplify modifier.
pub fn burn_multiplier(c: &ComputedPassives, target_hp_percent: f64) -> f64 {
    let base = (1.0 + c.burn_damage_percent / 100.0).max(0.0);
    if c.burn_execute_threshold > 0.0 && target_hp_percent < c.burn_execute_threshold {
        base * (1.0 + c.burn_execute_bonus_percent / 100.0)
    } else {
        base
    }
}

/// Burn passes per nominal second. Zero or negative means the default single pass.
pub fn burn_tick_rate(c: &ComputedPassives) -> f64 {
    if c.burn_tick_rate > 0.0 && c.burn_tick_rate.is_finite() {
        c.burn_tick_rate
    } else {
        1.0
    }
}
