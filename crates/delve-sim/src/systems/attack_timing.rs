//! Attack timing system: accumulates effective time per combatant and
//! enqueues a pending attack whenever the attack interval is crossed.

use hecs::Entity;
use rand::Rng;
use tracing::trace;

use delve_core::catalog::EnemyAbilityEffect;
use delve_core::components::*;
use delve_core::constants::*;
use delve_core::enums::*;
use delve_core::events::{AnimationKind, LogCategory, TriggerPayload};

use delve_passives::compute;

use crate::context::{PendingAttack, SimContext};
use crate::store;
use crate::vitals;

pub fn run(ctx: &mut SimContext) {
    for side in [Side::Player, Side::Enemy] {
        if let Some(entity) = ctx.entity(side) {
            advance(ctx, entity, side);
        }
    }
}

/// Attack-timing multiplier from speed value, stance, buffs and slow.
pub fn speed_factor(ctx: &SimContext, entity: Entity, speed_value: f64) -> f64 {
    let base = (speed_value / BASE_SPEED).max(0.0);
    let stance = compute::speed_factor(&store::computed_passives(&ctx.world, entity));
    let buffs = vitals::buff_multiplier(&ctx.world, entity, BuffStat::Speed);
    let slow = 1.0 - store::status_magnitude(&ctx.world, entity, StatusKind::Slow) / 100.0;
    base * stance * buffs * slow.clamp(0.0, 1.0)
}

fn advance(ctx: &mut SimContext, entity: Entity, side: Side) {
    if !store::is_alive(&ctx.world, entity) {
        return;
    }
    if store::has_status(&ctx.world, entity, StatusKind::Stun) {
        return;
    }
    let Some(speed) = store::read::<Speed>(&ctx.world, entity) else {
        return;
    };

    let factor = speed_factor(ctx, entity, speed.value);
    let mut accumulated = speed.accumulated_ms + ctx.dt_ms * factor;
    let ready = accumulated >= speed.attack_interval_ms;
    if ready {
        accumulated = (accumulated - speed.attack_interval_ms).min(speed.attack_interval_ms);
    }
    if let Ok(mut s) = ctx.world.get::<&mut Speed>(entity) {
        s.accumulated_ms = accumulated.max(0.0);
    }
    if !ready {
        return;
    }

    let poison = match side {
        Side::Enemy => roll_enemy_ability(ctx, entity),
        Side::Player => None,
    };

    let Some(attack) = store::read::<Attack>(&ctx.world, entity) else {
        return;
    };
    let (damage, is_crit) = roll_damage(ctx, entity, &attack);
    trace!(?side, damage, is_crit, "attack ready");

    ctx.pending_attacks.push(PendingAttack {
        attacker: entity,
        side,
        damage,
        is_crit,
        poison,
    });

    if side == Side::Player {
        ctx.record(Trigger::TurnStart, TriggerPayload::default());
    }
}

/// Variance- and crit-rolled damage with attack and crit buffs applied.
/// Rolls variance first, then crit.
pub fn roll_damage(ctx: &mut SimContext, entity: Entity, attack: &Attack) -> (i32, bool) {
    let attack_mult = vitals::buff_multiplier(&ctx.world, entity, BuffStat::Attack);
    let crit_mult = vitals::buff_multiplier(&ctx.world, entity, BuffStat::CritChance);

    let variance = attack.variance.clamp(0.0, 0.9);
    let spread = if variance > 0.0 {
        ctx.rng.gen_range(1.0 - variance..=1.0 + variance)
    } else {
        1.0
    };
    let crit_chance = (attack.crit_chance * crit_mult).clamp(0.0, 1.0);
    let is_crit = crit_chance > 0.0 && ctx.rng.gen_bool(crit_chance);

    let mut damage = attack.base_damage.max(0) as f64 * attack_mult * spread;
    if is_crit {
        damage *= attack.crit_multiplier.max(1.0);
    }
    (damage.round() as i32, is_crit)
}

/// Roll the enemy's abilities in list order; the first success fires.
/// Returns the poison carried by this attack, if any.
fn roll_enemy_ability(ctx: &mut SimContext, enemy: Entity) -> Option<(f64, f64)> {
    let abilities = ctx
        .world
        .get::<&Enemy>(enemy)
        .map(|e| e.abilities.clone())
        .unwrap_or_default();
    let name = ctx.name_of(enemy);

    for ability in abilities {
        let chance = ability.chance.clamp(0.0, 1.0);
        if chance <= 0.0 || !ctx.rng.gen_bool(chance) {
            continue;
        }
        match ability.effect {
            EnemyAbilityEffect::Enrage {
                attack_bonus,
                duration_ms,
            } => {
                let applied = {
                    let Ok((attack, timers)) = ctx
                        .world
                        .query_one_mut::<(&mut Attack, &mut EnemyTimers)>(enemy)
                    else {
                        return None;
                    };
                    if timers.enrage.is_some() {
                        false
                    } else {
                        attack.base_damage += attack_bonus;
                        timers.enrage = Some(TimedBoost {
                            amount: attack_bonus,
                            remaining_ms: duration_ms,
                        });
                        true
                    }
                };
                if applied {
                    ctx.log(LogCategory::Status, format!("{name} becomes enraged!"));
                }
            }
            EnemyAbilityEffect::Fortify {
                defense_bonus,
                duration_ms,
            } => {
                let applied = {
                    let Ok((defense, timers)) = ctx
                        .world
                        .query_one_mut::<(&mut Defense, &mut EnemyTimers)>(enemy)
                    else {
                        return None;
                    };
                    if timers.fortify.is_some() {
                        false
                    } else {
                        defense.value += defense_bonus;
                        timers.fortify = Some(TimedBoost {
                            amount: defense_bonus,
                            remaining_ms: duration_ms,
                        });
                        true
                    }
                };
                if applied {
                    ctx.log(LogCategory::Status, format!("{name} fortifies itself."));
                }
            }
            EnemyAbilityEffect::Heal { percent } => {
                let max = store::health(&ctx.world, enemy).map(|h| h.max).unwrap_or(0);
                let amount = (max as f64 * percent / 100.0).round() as i32;
                let healed = vitals::heal(&mut ctx.world, enemy, amount);
                if healed > 0 {
                    ctx.emit(AnimationKind::Heal {
                        target: Side::Enemy,
                        amount: healed,
                    });
                    ctx.float(Side::Enemy, FloatingKind::Heal, healed);
                    ctx.log(LogCategory::Heal, format!("{name} heals for {healed}."));
                }
            }
            EnemyAbilityEffect::PoisonStrike {
                damage_per_sec,
                duration_secs,
            } => {
                return Some((damage_per_sec, duration_secs));
            }
        }
        return None;
    }
    None
}
