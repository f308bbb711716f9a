//! Power system: ticks power cooldowns and base-resource regeneration, then
//! resolves the casts queued this tick.

use hecs::Entity;
use rand::Rng;
use tracing::debug;

use delve_core::catalog::{PowerDef, PowerEffect};
use delve_core::components::*;
use delve_core::constants::*;
use delve_core::enums::*;
use delve_core::events::{AnimationKind, LogCategory, TriggerPayload};

use delve_passives::compute;

use crate::context::{PendingCast, SimContext};
use crate::store;
use crate::vitals;

pub fn run(ctx: &mut SimContext) {
    tick_cooldowns(ctx);
    regenerate(ctx);

    let casts = std::mem::take(&mut ctx.pending_casts);
    for cast in casts {
        resolve(ctx, &cast);
    }
}

fn tick_cooldowns(ctx: &mut SimContext) {
    let dt = ctx.dt_ms;
    for (_entity, cooldowns) in ctx.world.query_mut::<&mut Cooldowns>() {
        for cooldown in cooldowns.0.values_mut() {
            cooldown.remaining_ms = (cooldown.remaining_ms - dt).max(0.0);
        }
    }
}

fn regenerate(ctx: &mut SimContext) {
    let dt_secs = ctx.dt_secs();
    for (_entity, (resource, dying)) in ctx.world.query_mut::<(&mut Resource, Option<&Dying>)>() {
        if dying.is_some() {
            continue;
        }
        if resource.current >= resource.max || resource.regen_per_sec <= 0.0 {
            resource.regen_carry = 0.0;
            continue;
        }
        resource.regen_carry += resource.regen_per_sec * dt_secs;
        let whole = resource.regen_carry.floor() as i32;
        resource.regen_carry -= whole as f64;
        resource.current = (resource.current + whole).clamp(0, resource.max.max(0));
    }
}

/// Which pool pays for powers: the path resource when it is not `Default`.
fn pays_from_path_resource(ctx: &SimContext, caster: Entity) -> bool {
    ctx.world
        .get::<&PathResource>(caster)
        .map(|r| r.kind != PathResourceKind::Default)
        .unwrap_or(false)
}

fn available_resource(ctx: &SimContext, caster: Entity) -> i32 {
    if pays_from_path_resource(ctx, caster) {
        ctx.world
            .get::<&PathResource>(caster)
            .map(|r| r.current)
            .unwrap_or(0)
    } else {
        ctx.world
            .get::<&Resource>(caster)
            .map(|r| r.current)
            .unwrap_or(0)
    }
}

fn spend(ctx: &mut SimContext, caster: Entity, cost: i32) {
    let cost = cost.max(0);
    if pays_from_path_resource(ctx, caster) {
        if let Ok(mut r) = ctx.world.get::<&mut PathResource>(caster) {
            r.current = (r.current - cost).clamp(0, r.max.max(0));
        }
    } else if let Ok(mut r) = ctx.world.get::<&mut Resource>(caster) {
        r.current = (r.current - cost).clamp(0, r.max.max(0));
    }
}

fn resolve(ctx: &mut SimContext, cast: &PendingCast) {
    let caster = cast.caster;
    if !store::is_alive(&ctx.world, caster) {
        return;
    }
    let Some(side) = ctx.side_of(caster) else {
        return;
    };
    let Some(power) = ctx.catalog.power(&cast.power_id).cloned() else {
        ctx.log(LogCategory::Power, format!("Unknown power '{}'.", cast.power_id));
        return;
    };

    let on_cooldown = ctx
        .world
        .get::<&Cooldowns>(caster)
        .map(|c| c.0.get(&power.id).is_some_and(|cd| cd.remaining_ms > 0.0))
        .unwrap_or(false);
    if on_cooldown {
        debug!(power = %power.id, "cast dropped: on cooldown");
        return;
    }
    if available_resource(ctx, caster) < power.cost {
        ctx.log(LogCategory::Power, format!("Not enough resource for {}.", power.name));
        return;
    }

    let needs_target = matches!(
        power.effect,
        PowerEffect::Damage { .. } | PowerEffect::Debuff { .. }
    );
    let target = ctx
        .entity(side.opponent())
        .filter(|t| store::is_alive(&ctx.world, *t));
    if needs_target && target.is_none() {
        ctx.log(LogCategory::Power, format!("{} has no target.", power.name));
        return;
    }

    spend(ctx, caster, power.cost);
    apply_effect(ctx, caster, side, target, &power);

    ctx.emit(AnimationKind::PowerCast {
        caster: side,
        power_id: power.id.clone(),
    });
    if let Ok(mut cooldowns) = ctx.world.get::<&mut Cooldowns>(caster) {
        cooldowns.0.insert(
            power.id.clone(),
            Cooldown {
                remaining_ms: power.cooldown_ms.max(0.0),
                base_ms: power.cooldown_ms.max(0.0),
            },
        );
    }
    if side == Side::Player {
        ctx.record(Trigger::OnPowerUse, TriggerPayload::default());
    }
}

fn apply_effect(
    ctx: &mut SimContext,
    caster: Entity,
    side: Side,
    target: Option<Entity>,
    power: &PowerDef,
) {
    match power.effect {
        PowerEffect::Damage {
            base,
            attack_scaling,
        } => {
            let Some(target) = target else { return };
            let attack = store::read::<Attack>(&ctx.world, caster);
            let attack_damage = attack.map(|a| a.base_damage).unwrap_or(0) as f64
                * vitals::buff_multiplier(&ctx.world, caster, BuffStat::Attack);
            let variance = attack.map(|a| a.variance.clamp(0.0, 0.9)).unwrap_or(0.0);
            let spread = if variance > 0.0 {
                ctx.rng.gen_range(1.0 - variance..=1.0 + variance)
            } else {
                1.0
            };
            let raw = (base as f64 + attack_damage * attack_scaling) * spread;

            let defense = store::read::<Defense>(&ctx.world, target)
                .map(|d| d.value)
                .unwrap_or(0);
            let defense = compute::effective_defense(
                &store::computed_passives(&ctx.world, target),
                defense,
            ) * vitals::buff_multiplier(&ctx.world, target, BuffStat::Defense);
            let damage = ((raw - defense).round() as i32).max(1);
            hit(ctx, side, target, damage, &power.name);
        }
        PowerEffect::Heal { amount, percent } => {
            let max = store::health(&ctx.world, caster).map(|h| h.max).unwrap_or(0);
            let total = amount.max(0) + (max as f64 * percent / 100.0).round() as i32;
            let healed = vitals::heal(&mut ctx.world, caster, total);
            ctx.emit(AnimationKind::Heal {
                target: side,
                amount: healed,
            });
            ctx.float(side, FloatingKind::Heal, healed);
            ctx.mark(caster, VisualKind::HealGlow);
            ctx.log(
                LogCategory::Power,
                format!("{} restores {healed} health.", power.name),
            );
        }
        PowerEffect::Buff {
            stat,
            multiplier,
            duration_ms,
        } => {
            vitals::add_buff(
                &mut ctx.world,
                caster,
                Buff {
                    stat,
                    multiplier,
                    remaining_ms: duration_ms,
                    source: power.id.clone(),
                },
            );
            ctx.log(LogCategory::Power, format!("{} empowers you.", power.name));
        }
        PowerEffect::Debuff {
            damage,
            status,
            magnitude,
            duration_secs,
        } => {
            let Some(target) = target else { return };
            hit(ctx, side, target, damage.max(1), &power.name);
            if !store::is_alive(&ctx.world, target) {
                return;
            }
            let mut secs = duration_secs.unwrap_or(DEFAULT_DEBUFF_DURATION_SECS);
            if status == StatusKind::Stun {
                secs = secs.min(MAX_STUN_SECS);
            }
            vitals::add_status(
                &mut ctx.world,
                target,
                StatusEffect {
                    kind: status,
                    damage_per_sec: 0.0,
                    remaining_turns: secs,
                    magnitude,
                    accumulator: 0.0,
                },
            );
            ctx.emit(AnimationKind::StatusApplied {
                target: side.opponent(),
                kind: status,
            });
            let name = ctx.name_of(target);
            ctx.log(
                LogCategory::Status,
                format!("{name} is afflicted with {}.", status.label()),
            );
        }
    }
}

fn hit(ctx: &mut SimContext, side: Side, target: Entity, damage: i32, power_name: &str) {
    let outcome = vitals::apply_damage(&mut ctx.world, target, damage);
    let target_side = side.opponent();
    if outcome.absorbed > 0 {
        ctx.float(target_side, FloatingKind::Absorbed, outcome.absorbed);
    }
    ctx.float(target_side, FloatingKind::Damage, outcome.to_health);
    ctx.mark(target, VisualKind::HitFlash);
    let name = ctx.name_of(target);
    ctx.log(
        LogCategory::Power,
        format!("{power_name} hits {name} for {damage}."),
    );
    if outcome.killed {
        ctx.pending_attacks.retain(|a| a.attacker != target);
        if side == Side::Player {
            ctx.record(
                Trigger::OnKill,
                TriggerPayload {
                    damage,
                    is_crit: false,
                },
            );
        }
    }
}
