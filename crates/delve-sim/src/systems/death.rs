//! Death system: runs after every damage source so each kill is handled
//! exactly once.
//!
//! Order per entity at 0 HP without a death marker: death-immunity status,
//! then the survive-lethal passive, else mark it dying.
//!
//! The player is checked first. An enemy that falls while the player is
//! dying pays no rewards and schedules nothing: the pending defeat owns the
//! room flow.

use hecs::Entity;
use tracing::info;

use delve_core::components::*;
use delve_core::constants::*;
use delve_core::enums::*;
use delve_core::events::{AnimationKind, LogCategory};

use delve_passives::hooks;

use crate::context::SimContext;
use crate::progression;
use crate::store;
use crate::vitals;

pub fn run(ctx: &mut SimContext) {
    for side in [Side::Player, Side::Enemy] {
        let Some(entity) = ctx.entity(side) else {
            continue;
        };
        if !needs_check(ctx, entity) {
            continue;
        }
        if try_survive(ctx, entity, side) {
            continue;
        }
        mark_dying(ctx, entity, side);
        match side {
            Side::Enemy => on_enemy_death(ctx, entity),
            Side::Player => on_player_death(ctx),
        }
    }
}

fn needs_check(ctx: &SimContext, entity: Entity) -> bool {
    let at_zero = store::health(&ctx.world, entity)
        .map(|h| h.current <= 0)
        .unwrap_or(false);
    at_zero && !store::is_dying(&ctx.world, entity)
}

/// Death immunity, then survive-lethal. Either restores 1 HP.
fn try_survive(ctx: &mut SimContext, entity: Entity, side: Side) -> bool {
    if store::has_status(&ctx.world, entity, StatusKind::DeathImmunity) {
        vitals::set_health(&mut ctx.world, entity, 1);
        let name = ctx.name_of(entity);
        ctx.log(LogCategory::Status, format!("{name} refuse{} to fall!", s(side)));
        return true;
    }

    let restore = ctx
        .world
        .get::<&PassiveEffectState>(entity)
        .ok()
        .and_then(|p| hooks::survive_lethal(&p.computed, &p.floor));
    if let Some(hp) = restore {
        vitals::set_health(&mut ctx.world, entity, hp);
        if let Ok(mut passives) = ctx.world.get::<&mut PassiveEffectState>(entity) {
            passives.floor.survive_lethal_used = true;
        }
        ctx.log(LogCategory::Status, "You cling to life!");
        info!("survive-lethal consumed for this floor");
        return true;
    }
    false
}

fn mark_dying(ctx: &mut SimContext, entity: Entity, side: Side) {
    let duration_ticks = match side {
        Side::Player => PLAYER_DEATH_TICKS,
        Side::Enemy => ENEMY_DEATH_TICKS,
    };
    let _ = ctx.world.insert_one(
        entity,
        Dying {
            started_at_tick: ctx.time.tick,
            duration_ticks,
        },
    );
    ctx.pending_attacks.retain(|a| a.attacker != entity);
    ctx.pending_casts.retain(|c| c.caster != entity);
    if let Ok(mut speed) = ctx.world.get::<&mut Speed>(entity) {
        speed.accumulated_ms = 0.0;
    }
    ctx.emit(AnimationKind::Death { side });
}

fn on_player_death(ctx: &mut SimContext) {
    ctx.schedule.clear();
    ctx.schedule.schedule_transition(GamePhase::Defeat, DEFEAT_DELAY_MS);
    ctx.log(LogCategory::System, "You have been slain.");
    info!(tick = ctx.time.tick, "player died");
}

fn on_enemy_death(ctx: &mut SimContext, enemy: Entity) {
    let Some(defeated) = store::read::<Enemy>(&ctx.world, enemy) else {
        return;
    };
    if player_fallen(ctx) {
        ctx.log(
            LogCategory::System,
            format!("{} falls with you.", defeated.name),
        );
        info!(enemy = %defeated.def_id, "enemy died after the player, no rewards");
        return;
    }
    let xp = (defeated.xp_reward as f64 * ctx.dev.xp_multiplier()).round() as u32;
    let gold = defeated.gold_reward;

    ctx.log(
        LogCategory::Reward,
        format!("{} is defeated! +{xp} XP, +{gold} gold.", defeated.name),
    );
    info!(enemy = %defeated.def_id, xp, gold, "enemy defeated");

    if let Some(player) = ctx.player {
        if let Ok(mut progress) = ctx.world.get::<&mut Progress>(player) {
            progress.gold = progress.gold.saturating_add(gold);
        }
        progression::grant_xp(ctx, player, xp);
    }

    let Some(gs) = ctx.game_state() else {
        return;
    };
    if gs.room >= gs.rooms_per_floor {
        let target = if gs.floor >= gs.final_floor {
            GamePhase::Victory
        } else {
            GamePhase::FloorComplete
        };
        ctx.schedule.schedule_transition(target, FLOOR_COMPLETE_DELAY_MS);
    } else {
        ctx.schedule.schedule_spawn(NEXT_ENEMY_DELAY_MS);
    }
}

fn player_fallen(ctx: &SimContext) -> bool {
    match ctx.player {
        Some(player) => {
            store::is_dying(&ctx.world, player)
                || store::health(&ctx.world, player).is_some_and(|h| h.current <= 0)
        }
        None => true,
    }
}

fn s(side: Side) -> &'static str {
    match side {
        Side::Player => "",
        Side::Enemy => "s",
    }
}
