//! Path ability system: evaluates unlocked abilities against the triggers
//! recorded this tick, then clears the trigger list.

use hecs::Entity;
use rand::Rng;
use tracing::debug;

use delve_core::catalog::{AbilityCondition, AbilityEffect, PathAbilityDef};
use delve_core::components::*;
use delve_core::constants::MAX_STUN_SECS;
use delve_core::enums::*;
use delve_core::events::{AnimationKind, LogCategory, TriggerEvent};

use delve_passives::compute;

use crate::context::SimContext;
use crate::store;
use crate::vitals;

pub fn run(ctx: &mut SimContext) {
    let triggers = std::mem::take(&mut ctx.triggers);
    if let Some(player) = ctx.player {
        tick_cooldowns(ctx, player);
        if store::is_alive(&ctx.world, player) {
            evaluate(ctx, player, &triggers);
        }
    }
    // Anything recorded while evaluating is dropped as well.
    ctx.triggers.clear();
}

fn tick_cooldowns(ctx: &mut SimContext, player: Entity) {
    let dt = ctx.dt_ms;
    if let Ok(mut path) = ctx.world.get::<&mut Path>(player) {
        for remaining in path.ability_cooldowns.values_mut() {
            *remaining = (*remaining - dt).max(0.0);
        }
    }
}

fn evaluate(ctx: &mut SimContext, player: Entity, triggers: &[TriggerEvent]) {
    let Some(unlocked) = ctx
        .world
        .get::<&Path>(player)
        .ok()
        .map(|p| p.abilities.clone())
    else {
        return;
    };

    for event in triggers {
        for id in &unlocked {
            let Some(def) = ctx.catalog.path_ability(id).cloned() else {
                continue;
            };
            if def.trigger != event.trigger {
                continue;
            }
            if on_cooldown(ctx, player, &def.id) {
                continue;
            }
            if def.chance < 1.0 && !ctx.rng.gen_bool(def.chance.clamp(0.0, 1.0)) {
                continue;
            }
            if !condition_met(ctx, player, def.condition) {
                continue;
            }
            if apply(ctx, player, &def) {
                ctx.emit(AnimationKind::AbilityProc {
                    ability_id: def.id.clone(),
                });
                if def.cooldown_ms > 0.0 {
                    if let Ok(mut path) = ctx.world.get::<&mut Path>(player) {
                        path.ability_cooldowns.insert(def.id.clone(), def.cooldown_ms);
                    }
                }
                debug!(ability = %def.id, trigger = ?event.trigger, "path ability fired");
            }
        }
    }
}

fn on_cooldown(ctx: &SimContext, player: Entity, id: &str) -> bool {
    ctx.world
        .get::<&Path>(player)
        .map(|p| p.ability_cooldowns.get(id).is_some_and(|r| *r > 0.0))
        .unwrap_or(false)
}

fn condition_met(ctx: &SimContext, player: Entity, condition: Option<AbilityCondition>) -> bool {
    let hp_percent = |e: Entity| {
        store::health(&ctx.world, e)
            .map(|h| compute::health_percent(h.current, h.max))
            .unwrap_or(100.0)
    };
    match condition {
        None => true,
        Some(AbilityCondition::HpBelow { percent }) => hp_percent(player) < percent,
        Some(AbilityCondition::EnemyHpBelow { percent }) => match living_enemy(ctx) {
            Some(enemy) => hp_percent(enemy) < percent,
            None => false,
        },
    }
}

fn living_enemy(ctx: &SimContext) -> Option<Entity> {
    ctx.enemy.filter(|e| store::is_alive(&ctx.world, *e))
}

/// Apply one ability effect. Returns false when it had nothing to act on,
/// in which case no cooldown starts.
fn apply(ctx: &mut SimContext, player: Entity, def: &PathAbilityDef) -> bool {
    match def.effect {
        AbilityEffect::Heal { percent } => {
            let max = store::health(&ctx.world, player).map(|h| h.max).unwrap_or(0);
            let amount = ((max as f64 * percent / 100.0).round() as i32).max(1);
            let healed = vitals::heal(&mut ctx.world, player, amount);
            ctx.float(Side::Player, FloatingKind::Heal, healed);
            ctx.mark(player, VisualKind::HealGlow);
            ctx.log(LogCategory::Ability, format!("{} heals you for {healed}.", def.name));
            true
        }
        AbilityEffect::Buff {
            stat,
            multiplier,
            duration_ms,
        } => {
            vitals::add_buff(
                &mut ctx.world,
                player,
                Buff {
                    stat,
                    multiplier,
                    remaining_ms: duration_ms,
                    source: def.id.clone(),
                },
            );
            ctx.log(LogCategory::Ability, format!("{} activates!", def.name));
            true
        }
        AbilityEffect::EnemyStatus {
            status,
            damage_per_sec,
            magnitude,
            duration_secs,
        } => afflict(ctx, def, status, damage_per_sec, magnitude, duration_secs),
        AbilityEffect::Stun { duration_secs } => afflict(
            ctx,
            def,
            StatusKind::Stun,
            0.0,
            0.0,
            duration_secs.min(MAX_STUN_SECS),
        ),
        AbilityEffect::Slow {
            percent,
            duration_secs,
        } => afflict(ctx, def, StatusKind::Slow, 0.0, percent, duration_secs),
        AbilityEffect::SelfStatus {
            status,
            duration_secs,
        } => {
            vitals::add_status(
                &mut ctx.world,
                player,
                StatusEffect {
                    kind: status,
                    damage_per_sec: 0.0,
                    remaining_turns: duration_secs,
                    magnitude: 0.0,
                    accumulator: 0.0,
                },
            );
            ctx.emit(AnimationKind::StatusApplied {
                target: Side::Player,
                kind: status,
            });
            ctx.log(LogCategory::Ability, format!("{} activates!", def.name));
            true
        }
        AbilityEffect::Shield {
            percent,
            duration_ms,
        } => {
            let max = store::health(&ctx.world, player).map(|h| h.max).unwrap_or(0);
            let value = ((max as f64 * percent / 100.0).round() as i32).max(1);
            vitals::grant_shield(&mut ctx.world, player, value, duration_ms);
            ctx.log(
                LogCategory::Ability,
                format!("{} shields you for {value}.", def.name),
            );
            true
        }
        AbilityEffect::RestoreResource { amount } => {
            restore_resource(ctx, player, amount);
            ctx.log(
                LogCategory::Ability,
                format!("{} restores {amount} resource.", def.name),
            );
            true
        }
        AbilityEffect::Damage {
            base,
            attack_scaling,
        } => {
            let Some(enemy) = living_enemy(ctx) else {
                return false;
            };
            let attack = store::read::<Attack>(&ctx.world, player)
                .map(|a| a.base_damage)
                .unwrap_or(0);
            let damage = ((base as f64 + attack as f64 * attack_scaling).round() as i32).max(1);
            let outcome = vitals::apply_damage(&mut ctx.world, enemy, damage);
            ctx.float(Side::Enemy, FloatingKind::Damage, outcome.to_health);
            ctx.mark(enemy, VisualKind::HitFlash);
            let name = ctx.name_of(enemy);
            ctx.log(
                LogCategory::Ability,
                format!("{} strikes {name} for {damage}.", def.name),
            );
            if outcome.killed {
                ctx.pending_attacks.retain(|a| a.attacker != enemy);
            }
            true
        }
    }
}

fn afflict(
    ctx: &mut SimContext,
    def: &PathAbilityDef,
    kind: StatusKind,
    damage_per_sec: f64,
    magnitude: f64,
    duration_secs: f64,
) -> bool {
    let Some(enemy) = living_enemy(ctx) else {
        return false;
    };
    if duration_secs <= 0.0 {
        return false;
    }
    vitals::add_status(
        &mut ctx.world,
        enemy,
        StatusEffect {
            kind,
            damage_per_sec,
            remaining_turns: duration_secs,
            magnitude,
            accumulator: 0.0,
        },
    );
    ctx.emit(AnimationKind::StatusApplied {
        target: Side::Enemy,
        kind,
    });
    let name = ctx.name_of(enemy);
    ctx.log(
        LogCategory::Ability,
        format!("{}: {name} suffers {}.", def.name, kind.label()),
    );
    true
}

/// Restore the path resource, or the base resource when the path has none.
fn restore_resource(ctx: &mut SimContext, player: Entity, amount: i32) {
    let uses_path = ctx
        .world
        .get::<&PathResource>(player)
        .map(|r| r.kind != PathResourceKind::Default)
        .unwrap_or(false);
    if uses_path {
        if let Ok(mut r) = ctx.world.get::<&mut PathResource>(player) {
            r.current = (r.current + amount).clamp(0, r.max.max(0));
        }
    } else if let Ok(mut r) = ctx.world.get::<&mut Resource>(player) {
        r.current = (r.current + amount).clamp(0, r.max.max(0));
    }
}
