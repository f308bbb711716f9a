//! Status effect system: damage over time, effect durations, buffs, shields,
//! enemy timed flags and the stance switch cooldown.

use hecs::Entity;

use delve_core::components::*;
use delve_core::enums::*;
use delve_core::events::{AnimationKind, LogCategory, TriggerPayload};

use delve_passives::compute;

use crate::context::SimContext;
use crate::store;
use crate::vitals;

pub fn run(ctx: &mut SimContext) {
    for entity in store::collect::<&StatusEffects>(&ctx.world) {
        if store::is_dying(&ctx.world, entity) {
            continue;
        }
        tick_statuses(ctx, entity);
    }
    tick_buffs(ctx);
    tick_shields(ctx);
    tick_enemy_timers(ctx);
    tick_stance_cooldown(ctx);
}

/// Add `rate × dt_secs` once per pass to the effect's carry and return the
/// whole damage to apply. `passes` may be fractional: whole passes first,
/// then one partial pass over the same accumulator.
pub fn accumulate(effect: &mut StatusEffect, rate: f64, passes: f64, dt_secs: f64) -> i32 {
    if rate <= 0.0 || dt_secs <= 0.0 {
        return 0;
    }
    let passes = passes.max(0.0);
    let whole = passes.floor() as u32;
    let fraction = passes - whole as f64;
    for _ in 0..whole {
        effect.accumulator += rate * dt_secs;
    }
    if fraction > 0.0 {
        effect.accumulator += rate * dt_secs * fraction;
    }
    let damage = effect.accumulator.floor();
    effect.accumulator -= damage;
    damage as i32
}

fn tick_statuses(ctx: &mut SimContext, entity: Entity) {
    let dt_secs = ctx.dt_secs();
    let side = ctx.side_of(entity);

    // Burn specialties come from the player's passives when the enemy burns.
    let (burn_multiplier, burn_passes) = match (side, ctx.player) {
        (Some(Side::Enemy), Some(player)) => {
            let passives = store::computed_passives(&ctx.world, player);
            let hp_percent = store::health(&ctx.world, entity)
                .map(|h| compute::health_percent(h.current, h.max))
                .unwrap_or(0.0);
            (
                compute::burn_multiplier(&passives, hp_percent),
                compute::burn_tick_rate(&passives),
            )
        }
        _ => (1.0, 1.0),
    };

    let mut damage = 0;
    let mut expired = Vec::new();
    {
        let Ok(mut statuses) = ctx.world.get::<&mut StatusEffects>(entity) else {
            return;
        };
        for effect in statuses.0.iter_mut() {
            if effect.kind.is_damage_over_time() {
                let (rate, passes) = if effect.kind == StatusKind::Burn {
                    (effect.damage_per_sec * burn_multiplier, burn_passes)
                } else {
                    (effect.damage_per_sec, 1.0)
                };
                damage += accumulate(effect, rate, passes, dt_secs);
            }
            effect.remaining_turns -= dt_secs;
            if effect.remaining_turns <= 0.0 {
                expired.push(effect.kind);
            }
        }
        statuses.0.retain(|e| e.remaining_turns > 0.0);
    }

    if damage > 0 {
        let outcome = vitals::apply_direct_damage(&mut ctx.world, entity, damage);
        if let Some(side) = side {
            ctx.float(side, FloatingKind::DamageOverTime, outcome.to_health);
        }
        if outcome.killed && side == Some(Side::Enemy) {
            let name = ctx.name_of(entity);
            ctx.log(LogCategory::Damage, format!("{name} succumbs to its wounds."));
            ctx.record(
                Trigger::OnKill,
                TriggerPayload {
                    damage: outcome.to_health,
                    is_crit: false,
                },
            );
        }
    }

    for kind in expired {
        let name = ctx.name_of(entity);
        ctx.log(
            LogCategory::Status,
            format!("{} wears off {}.", kind.label(), possessive(side, &name)),
        );
        if let Some(side) = side {
            ctx.emit(AnimationKind::StatusRemoved { target: side, kind });
        }
    }
}

fn possessive(side: Option<Side>, name: &str) -> String {
    match side {
        Some(Side::Player) => "you".to_string(),
        _ => name.to_string(),
    }
}

fn tick_buffs(ctx: &mut SimContext) {
    let dt = ctx.dt_ms;
    for (_entity, (buffs, dying)) in ctx.world.query_mut::<(&mut Buffs, Option<&Dying>)>() {
        if dying.is_some() {
            continue;
        }
        for buff in buffs.0.iter_mut() {
            buff.remaining_ms -= dt;
        }
        buffs.0.retain(|b| b.remaining_ms > 0.0);
    }
}

fn tick_shields(ctx: &mut SimContext) {
    let dt = ctx.dt_ms;
    ctx.despawn_buffer.clear();
    for (entity, shield) in ctx.world.query_mut::<&mut Shield>() {
        shield.remaining_ms -= dt;
        if shield.remaining_ms <= 0.0 || shield.value <= 0 {
            ctx.despawn_buffer.push(entity);
        }
    }
    for entity in ctx.despawn_buffer.drain(..) {
        let _ = ctx.world.remove_one::<Shield>(entity);
    }
}

/// Enrage and fortify count down and revert their stat bonus on expiry.
fn tick_enemy_timers(ctx: &mut SimContext) {
    let dt = ctx.dt_ms;
    let mut reverted = Vec::new();
    for (entity, (timers, attack, defense)) in
        ctx.world
            .query_mut::<(&mut EnemyTimers, &mut Attack, &mut Defense)>()
    {
        if let Some(enrage) = timers.enrage.as_mut() {
            enrage.remaining_ms -= dt;
            if enrage.remaining_ms <= 0.0 {
                attack.base_damage = (attack.base_damage - enrage.amount).max(0);
                timers.enrage = None;
                reverted.push((entity, "calms down"));
            }
        }
        if let Some(fortify) = timers.fortify.as_mut() {
            fortify.remaining_ms -= dt;
            if fortify.remaining_ms <= 0.0 {
                defense.value = (defense.value - fortify.amount).max(0);
                timers.fortify = None;
                reverted.push((entity, "lowers its guard"));
            }
        }
    }
    for (entity, what) in reverted {
        let name = ctx.name_of(entity);
        ctx.log(LogCategory::Status, format!("{name} {what}."));
    }
}

fn tick_stance_cooldown(ctx: &mut SimContext) {
    let dt = ctx.dt_ms;
    for (_entity, stance) in ctx.world.query_mut::<&mut StanceState>() {
        stance.switch_cooldown_ms = (stance.switch_cooldown_ms - dt).max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poison(rate: f64) -> StatusEffect {
        StatusEffect {
            kind: StatusKind::Poison,
            damage_per_sec: rate,
            remaining_turns: 10.0,
            magnitude: 0.0,
            accumulator: 0.0,
        }
    }

    #[test]
    fn accumulator_carries_fraction() {
        let mut e = poison(10.0);
        // 16ms at 10/s = 0.16 per tick; first whole point after 7 ticks.
        let total: i32 = (0..6).map(|_| accumulate(&mut e, 10.0, 1.0, 0.016)).sum();
        assert_eq!(total, 0);
        assert_eq!(accumulate(&mut e, 10.0, 1.0, 0.016), 1);
    }

    #[test]
    fn fractional_passes_reuse_accumulator() {
        let mut a = poison(10.0);
        let mut b = poison(10.0);
        let double = accumulate(&mut a, 10.0, 2.0, 1.0);
        let single = accumulate(&mut b, 10.0, 1.0, 1.0);
        assert_eq!(double, 20);
        assert_eq!(single, 10);

        let mut c = poison(10.0);
        assert_eq!(accumulate(&mut c, 10.0, 1.5, 1.0), 15);
    }
}
