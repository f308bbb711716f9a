//! Combat resolution system: resolves every pending attack queued this tick.
//!
//! Per attack: liveness check, dodge, auto-block, damage pipeline, shield,
//! health, kill bookkeeping, presentation output, triggers and role-based
//! follow-ups (lifesteal, procs, reflect, counter, heal-on-hit).

use std::collections::VecDeque;

use hecs::Entity;
use rand::Rng;
use tracing::debug;

use delve_core::components::*;
use delve_core::constants::*;
use delve_core::enums::*;
use delve_core::events::{AnimationKind, LogCategory, TriggerPayload};

use delve_passives::{compute, hooks};

use crate::context::{PendingAttack, SimContext};
use crate::store;
use crate::vitals;

/// How a resolved attack ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Attacker or target was not alive.
    Skipped,
    Dodged,
    Blocked,
    Landed {
        /// Final damage after all reductions (≥ 1).
        damage: i32,
        absorbed: i32,
        to_health: i32,
        killed: bool,
    },
}

pub fn run(ctx: &mut SimContext) {
    let mut queue: VecDeque<PendingAttack> = std::mem::take(&mut ctx.pending_attacks).into();
    while let Some(attack) = queue.pop_front() {
        let target = ctx.entity(attack.side.opponent());
        let resolution = match target {
            Some(target) => resolve(ctx, &attack, target),
            None => Resolution::Skipped,
        };
        if let (Resolution::Landed { killed: true, .. }, Some(target)) = (resolution, target) {
            queue.retain(|a| a.attacker != target);
        }
        // Follow-ups can kill the attacker (reflect, counter).
        if !store::is_alive(&ctx.world, attack.attacker) {
            queue.retain(|a| a.attacker != attack.attacker);
        }
    }
}

/// Resolve one attack against `target`.
pub fn resolve(ctx: &mut SimContext, attack: &PendingAttack, target: Entity) -> Resolution {
    let attacker = attack.attacker;
    if !store::is_alive(&ctx.world, attacker) || !store::is_alive(&ctx.world, target) {
        return Resolution::Skipped;
    }
    let target_side = attack.side.opponent();
    let attacker_name = ctx.name_of(attacker);
    let target_name = ctx.name_of(target);

    // Dodge: enemy attacks against the player only.
    if attack.side == Side::Enemy {
        let fortune = store::read::<Fortune>(&ctx.world, target)
            .map(|f| f.value)
            .unwrap_or(0);
        let chance = (fortune.max(0) as f64 * DODGE_CHANCE_PER_FORTUNE).min(MAX_DODGE_CHANCE);
        if chance > 0.0 && ctx.rng.gen_bool(chance) {
            ctx.log(LogCategory::Damage, format!("You dodge {attacker_name}'s attack."));
            ctx.emit(AnimationKind::Dodge { target: target_side });
            ctx.float(target_side, FloatingKind::Miss, 0);
            ctx.mark(target, VisualKind::DodgeBlur);
            ctx.record(Trigger::OnDodge, TriggerPayload::default());
            return Resolution::Dodged;
        }
    }

    // Stance auto-block.
    let target_passives = store::computed_passives(&ctx.world, target);
    if hooks::roll_block(&target_passives, &mut ctx.rng) {
        ctx.log(
            LogCategory::Damage,
            format!("{target_name} block{} the attack.", verb_s(target_side)),
        );
        ctx.emit(AnimationKind::Block { target: target_side });
        ctx.float(target_side, FloatingKind::Absorbed, 0);
        ctx.mark(target, VisualKind::BlockFlash);
        if target_side == Side::Player {
            ctx.record(Trigger::OnBlock, TriggerPayload::default());
        }
        return Resolution::Blocked;
    }

    let damage = damage_pipeline(ctx, attack, target, &target_passives);
    let outcome = vitals::apply_damage(&mut ctx.world, target, damage);

    // Presentation.
    if outcome.to_health == 0 && outcome.absorbed > 0 {
        ctx.emit(AnimationKind::Absorbed {
            target: target_side,
            amount: outcome.absorbed,
        });
    } else {
        ctx.emit(AnimationKind::Hit {
            attacker: attack.side,
            target: target_side,
            damage,
            is_crit: attack.is_crit,
            target_died: outcome.killed,
        });
    }
    if outcome.absorbed > 0 {
        ctx.float(target_side, FloatingKind::Absorbed, outcome.absorbed);
    }
    if outcome.to_health > 0 {
        let kind = if attack.is_crit {
            FloatingKind::Critical
        } else {
            FloatingKind::Damage
        };
        ctx.float(target_side, kind, outcome.to_health);
    }
    ctx.mark(
        target,
        if attack.is_crit {
            VisualKind::CritFlash
        } else {
            VisualKind::HitFlash
        },
    );
    let crit = if attack.is_crit { " Critical hit!" } else { "" };
    let absorbed = if outcome.absorbed > 0 {
        format!(" ({} absorbed)", outcome.absorbed)
    } else {
        String::new()
    };
    ctx.log(
        LogCategory::Damage,
        format!(
            "{attacker_name} hit{} {} for {damage}{absorbed}.{crit}",
            verb_s(attack.side),
            object_name(target_side, &target_name),
        ),
    );

    // Triggers, from the player's point of view.
    let payload = TriggerPayload {
        damage,
        is_crit: attack.is_crit,
    };
    match attack.side {
        Side::Player => {
            ctx.record(Trigger::OnHit, payload);
            if attack.is_crit {
                ctx.record(Trigger::OnCrit, payload);
            }
            if outcome.killed {
                ctx.record(Trigger::OnKill, payload);
            }
        }
        Side::Enemy => ctx.record(Trigger::OnDamaged, payload),
    }

    // Role-based follow-ups.
    match attack.side {
        Side::Player => player_follow_ups(ctx, attacker, target, outcome.to_health),
        Side::Enemy => {
            if let Some((dps, secs)) = attack.poison {
                poison_target(ctx, target, dps, secs, &attacker_name);
            }
            defender_follow_ups(ctx, target, attacker, damage);
        }
    }

    debug!(side = ?attack.side, damage, absorbed = outcome.absorbed, killed = outcome.killed, "attack resolved");
    Resolution::Landed {
        damage,
        absorbed: outcome.absorbed,
        to_health: outcome.to_health,
        killed: outcome.killed,
    }
}

/// Base damage → attacker outgoing multiplier → minus effective defense →
/// floor 1 → defender pre-damage hook → hex aura / weaken → floor 1.
fn damage_pipeline(
    ctx: &mut SimContext,
    attack: &PendingAttack,
    target: Entity,
    target_passives: &ComputedPassives,
) -> i32 {
    let attacker = attack.attacker;

    let multiplier = match ctx.world.get::<&mut PassiveEffectState>(attacker) {
        Ok(mut passives) => {
            let passives = &mut *passives;
            hooks::outgoing_multiplier(&passives.computed, &mut passives.combat)
        }
        Err(_) => 1.0,
    };
    let outgoing = attack.damage.max(0) as f64 * multiplier;

    let base_defense = store::read::<Defense>(&ctx.world, target)
        .map(|d| d.value)
        .unwrap_or(0);
    let defense = compute::effective_defense(target_passives, base_defense)
        * vitals::buff_multiplier(&ctx.world, target, BuffStat::Defense);

    let mut damage = ((outgoing - defense).round() as i32).max(1);

    let max_health = store::health(&ctx.world, target).map(|h| h.max).unwrap_or(0);
    damage = hooks::pre_damage(target_passives, damage, max_health);

    let mut reduction = 1.0;
    if attack.side == Side::Enemy {
        reduction *= hooks::hex_multiplier(target_passives);
    }
    let weaken = store::status_magnitude(&ctx.world, attacker, StatusKind::Weaken);
    reduction *= (1.0 - weaken / 100.0).clamp(0.0, 1.0);
    if reduction < 1.0 {
        damage = ((damage as f64 * reduction).round() as i32).max(1);
    }
    damage
}

/// Lifesteal, then the on-hit proc (bonus damage plus burn).
fn player_follow_ups(ctx: &mut SimContext, player: Entity, enemy: Entity, dealt: i32) {
    let passives = store::computed_passives(&ctx.world, player);

    let steal = hooks::lifesteal(&passives, dealt);
    if steal > 0 {
        let healed = vitals::heal(&mut ctx.world, player, steal);
        if healed > 0 {
            ctx.float(Side::Player, FloatingKind::Heal, healed);
            ctx.log(LogCategory::Heal, format!("You drain {healed} health."));
        }
    }

    let Some(proc) = hooks::roll_proc(&passives, &mut ctx.rng) else {
        return;
    };
    if !store::is_alive(&ctx.world, enemy) {
        return;
    }
    if proc.bonus_damage > 0 {
        strike_enemy(ctx, enemy, proc.bonus_damage, "Flames lick");
    }
    if proc.burn_dps > 0.0 && proc.burn_duration_secs > 0.0 && store::is_alive(&ctx.world, enemy) {
        vitals::add_status(
            &mut ctx.world,
            enemy,
            StatusEffect {
                kind: StatusKind::Burn,
                damage_per_sec: proc.burn_dps,
                remaining_turns: proc.burn_duration_secs,
                magnitude: 0.0,
                accumulator: 0.0,
            },
        );
        ctx.emit(AnimationKind::StatusApplied {
            target: Side::Enemy,
            kind: StatusKind::Burn,
        });
        let name = ctx.name_of(enemy);
        ctx.log(LogCategory::Status, format!("{name} catches fire."));
    }
}

/// The player was hit: reflect, counter-attack, heal-on-hit.
fn defender_follow_ups(ctx: &mut SimContext, player: Entity, enemy: Entity, damage: i32) {
    if !store::is_alive(&ctx.world, player) {
        return;
    }
    let attack_damage = store::read::<Attack>(&ctx.world, player)
        .map(|a| a.base_damage)
        .unwrap_or(0);
    let max_health = store::health(&ctx.world, player).map(|h| h.max).unwrap_or(0);

    let result = {
        let Ok(mut passives) = ctx.world.get::<&mut PassiveEffectState>(player) else {
            return;
        };
        let passives = &mut *passives;
        hooks::on_damaged(
            &passives.computed,
            &mut passives.combat,
            damage,
            attack_damage,
            max_health,
            &mut ctx.rng,
        )
    };

    if result.reflect > 0 && store::is_alive(&ctx.world, enemy) {
        strike_enemy(ctx, enemy, result.reflect, "Thorns pierce");
    }
    if result.counter > 0 && store::is_alive(&ctx.world, enemy) {
        strike_enemy(ctx, enemy, result.counter, "You counter-attack");
    }
    if result.heal > 0 {
        let healed = vitals::heal(&mut ctx.world, player, result.heal);
        if healed > 0 {
            ctx.float(Side::Player, FloatingKind::Heal, healed);
            ctx.mark(player, VisualKind::HealGlow);
            ctx.log(LogCategory::Heal, format!("You recover {healed} health."));
        }
    }
}

/// Secondary player damage to the enemy. Bypasses defense; shields still absorb.
fn strike_enemy(ctx: &mut SimContext, enemy: Entity, amount: i32, verb: &str) {
    let outcome = vitals::apply_damage(&mut ctx.world, enemy, amount.max(1));
    let name = ctx.name_of(enemy);
    ctx.float(Side::Enemy, FloatingKind::Damage, outcome.to_health);
    ctx.log(
        LogCategory::Damage,
        format!("{verb} {name} for {}.", outcome.to_health + outcome.absorbed),
    );
    if outcome.killed {
        ctx.record(
            Trigger::OnKill,
            TriggerPayload {
                damage: outcome.to_health,
                is_crit: false,
            },
        );
    }
}

fn poison_target(ctx: &mut SimContext, target: Entity, dps: f64, secs: f64, source: &str) {
    if dps <= 0.0 || secs <= 0.0 || !store::is_alive(&ctx.world, target) {
        return;
    }
    vitals::add_status(
        &mut ctx.world,
        target,
        StatusEffect {
            kind: StatusKind::Poison,
            damage_per_sec: dps,
            remaining_turns: secs,
            magnitude: 0.0,
            accumulator: 0.0,
        },
    );
    ctx.emit(AnimationKind::StatusApplied {
        target: Side::Player,
        kind: StatusKind::Poison,
    });
    ctx.log(LogCategory::Status, format!("{source}'s strike poisons you."));
}

fn verb_s(side: Side) -> &'static str {
    match side {
        Side::Player => "",
        Side::Enemy => "s",
    }
}

fn object_name(side: Side, name: &str) -> String {
    match side {
        Side::Player => "you".to_string(),
        Side::Enemy => name.to_string(),
    }
}
