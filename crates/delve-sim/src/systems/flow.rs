//! Flow system: scheduled phase transitions, enemy spawns and the
//! "entering" sub-phase.
//!
//! Transitions are processed in any phase; spawns and the entering timer
//! only during combat.

use rand::Rng;
use tracing::{info, warn};

use delve_core::components::*;
use delve_core::constants::*;
use delve_core::enums::*;
use delve_core::events::{LogCategory, TriggerPayload};

use crate::context::SimContext;
use crate::world_setup;

pub fn run(ctx: &mut SimContext) {
    let dt = ctx.dt_ms;

    for target in ctx.schedule.advance_transitions(dt) {
        transition(ctx, target);
    }

    if ctx.phase() != GamePhase::Combat {
        return;
    }

    let due = ctx.schedule.advance_spawns(dt);
    for _ in 0..due {
        spawn_next_enemy(ctx);
    }

    tick_entering(ctx, dt);
}

fn transition(ctx: &mut SimContext, target: GamePhase) {
    let Some(gs) = ctx.game_state() else {
        return;
    };
    ctx.set_phase(target);
    info!(from = ?gs.phase, to = ?target, floor = gs.floor, "phase transition");

    match target {
        GamePhase::Defeat => {
            ctx.log(
                LogCategory::System,
                format!("Defeated on floor {}, room {}.", gs.floor, gs.room),
            );
        }
        GamePhase::FloorComplete | GamePhase::Victory => {
            leave_room(ctx);
            if target == GamePhase::Victory {
                ctx.log(LogCategory::System, "The dungeon is conquered. Victory!");
            } else {
                ctx.log(LogCategory::System, format!("Floor {} cleared!", gs.floor));
            }
        }
        GamePhase::Menu
        | GamePhase::ClassSelect
        | GamePhase::Combat
        | GamePhase::Shop => {}
    }
}

/// Remove the current enemy and idle the combat stage.
pub fn leave_room(ctx: &mut SimContext) {
    if let Some(enemy) = ctx.enemy.take() {
        let _ = ctx.world.despawn(enemy);
    }
    ctx.pending_attacks.clear();
    ctx.pending_casts.clear();
    if let Some(mut gs) = ctx.game_state_mut() {
        gs.combat_stage = CombatStage::Idle;
    }
}

/// Advance to the next room and spawn its enemy; the last room holds a boss.
pub fn spawn_next_enemy(ctx: &mut SimContext) {
    let Some(gs) = ctx.game_state() else {
        return;
    };
    let room = gs.room + 1;
    if room > gs.rooms_per_floor {
        let target = if gs.floor >= gs.final_floor {
            GamePhase::Victory
        } else {
            GamePhase::FloorComplete
        };
        transition(ctx, target);
        return;
    }

    let boss = room == gs.rooms_per_floor;
    let catalog = ctx.catalog.clone();
    let candidates = catalog.enemies_for(gs.floor, boss);
    if candidates.is_empty() {
        warn!(floor = gs.floor, "no enemy candidates");
        return;
    }
    let def = candidates[ctx.rng.gen_range(0..candidates.len())];

    if let Some(old) = ctx.enemy.take() {
        let _ = ctx.world.despawn(old);
    }
    let enemy = world_setup::spawn_enemy(&mut ctx.world, def, gs.floor);
    ctx.enemy = Some(enemy);

    if let Some(mut state) = ctx.game_state_mut() {
        state.room = room;
        state.combat_stage = CombatStage::Entering {
            remaining_ms: ENTERING_DURATION_MS,
        };
    }
    if let Some(player) = ctx.player {
        if let Ok(mut passives) = ctx.world.get::<&mut PassiveEffectState>(player) {
            passives.combat = CombatPassiveState::default();
        }
        if let Ok(mut speed) = ctx.world.get::<&mut Speed>(player) {
            speed.accumulated_ms = 0.0;
        }
    }

    let label = if boss { "The floor guardian" } else { "A foe" };
    ctx.log(
        LogCategory::System,
        format!(
            "{label}, {}, appears! (Floor {}, room {}/{})",
            def.name, gs.floor, room, gs.rooms_per_floor
        ),
    );
    info!(enemy = %def.id, floor = gs.floor, room, boss, "enemy spawned");
}

fn tick_entering(ctx: &mut SimContext, dt: f64) {
    let engaged = {
        let Some(mut gs) = ctx.game_state_mut() else {
            return;
        };
        match gs.combat_stage {
            CombatStage::Entering { remaining_ms } => {
                let left = remaining_ms - dt;
                if left <= 0.0 {
                    gs.combat_stage = CombatStage::Engaged;
                    true
                } else {
                    gs.combat_stage = CombatStage::Entering { remaining_ms: left };
                    false
                }
            }
            CombatStage::Idle | CombatStage::Engaged => false,
        }
    };
    if engaged {
        ctx.record(Trigger::CombatStart, TriggerPayload::default());
        if let Some(enemy) = ctx.enemy {
            let name = ctx.name_of(enemy);
            ctx.log(LogCategory::System, format!("{name} engages!"));
        }
    }
}
