//! Snapshot system: copies the visible state out of the context into a
//! `GameStateSnapshot`.
//!
//! This system is read-only. Marking delivered animation events consumed is
//! the engine's job.

use hecs::Entity;

use delve_core::components::*;
use delve_core::state::*;

use crate::context::SimContext;
use crate::store;

/// Build a complete snapshot. Only animation events not yet delivered are included.
pub fn build_snapshot(ctx: &SimContext) -> GameStateSnapshot {
    let gs = ctx.game_state().unwrap_or_else(|| GameState {
        phase: Default::default(),
        floor: 1,
        room: 0,
        rooms_per_floor: 0,
        final_floor: 0,
        paused: false,
        speed: 1.0,
        combat_stage: Default::default(),
        popups: Vec::new(),
    });

    GameStateSnapshot {
        tick: ctx.time.tick,
        phase: gs.phase,
        floor: gs.floor,
        room: gs.room,
        rooms_per_floor: gs.rooms_per_floor,
        paused: gs.paused,
        speed: gs.speed,
        combat_stage: gs.combat_stage,
        popups: gs.popups,
        player: ctx.player.and_then(|p| build_player(ctx, p)),
        enemy: ctx.enemy.and_then(|e| build_enemy(ctx, e)),
        animation_events: ctx
            .animations
            .iter()
            .filter(|e| !e.consumed)
            .cloned()
            .collect(),
        combat_log: ctx.log.iter().cloned().collect(),
        floating_effects: ctx.floating.clone(),
    }
}

fn attack_progress(speed: Option<Speed>) -> f64 {
    speed
        .filter(|s| s.attack_interval_ms > 0.0)
        .map(|s| (s.accumulated_ms / s.attack_interval_ms).clamp(0.0, 1.0))
        .unwrap_or(0.0)
}

fn visuals(ctx: &SimContext, entity: Entity) -> Vec<delve_core::enums::VisualKind> {
    store::read::<VisualMarkers>(&ctx.world, entity)
        .map(|m| m.0.iter().map(|v| v.kind).collect())
        .unwrap_or_default()
}

fn build_player(ctx: &SimContext, entity: Entity) -> Option<PlayerView> {
    let world = &ctx.world;
    let player = store::read::<Player>(world, entity)?;
    let health = store::health(world, entity)?;
    let cooldowns = store::read::<Cooldowns>(world, entity).unwrap_or_default();
    let powers = store::read::<KnownPowers>(world, entity)
        .unwrap_or_default()
        .0
        .into_iter()
        .map(|power_id| PowerView {
            remaining_ms: cooldowns
                .0
                .get(&power_id)
                .map(|c| c.remaining_ms)
                .unwrap_or(0.0),
            cost: ctx.catalog.power(&power_id).map(|p| p.cost).unwrap_or(0),
            power_id,
        })
        .collect();

    Some(PlayerView {
        class_id: player.class_id,
        health,
        resource: store::read::<Resource>(world, entity)?,
        attack: store::read::<Attack>(world, entity)?,
        defense: store::read::<Defense>(world, entity).map(|d| d.value).unwrap_or(0),
        shield: store::read::<Shield>(world, entity),
        statuses: store::read::<StatusEffects>(world, entity)
            .unwrap_or_default()
            .0,
        buffs: store::read::<Buffs>(world, entity).unwrap_or_default().0,
        powers,
        path: store::read::<Path>(world, entity),
        path_resource: store::read::<PathResource>(world, entity),
        stance: store::read::<StanceState>(world, entity),
        progress: store::read::<Progress>(world, entity)?,
        items: store::read::<Inventory>(world, entity)
            .unwrap_or_default()
            .items
            .into_iter()
            .collect(),
        attack_progress: attack_progress(store::read::<Speed>(world, entity)),
        dying: store::is_dying(world, entity),
        visuals: visuals(ctx, entity),
    })
}

fn build_enemy(ctx: &SimContext, entity: Entity) -> Option<EnemyView> {
    let world = &ctx.world;
    let enemy = store::read::<Enemy>(world, entity)?;
    let timers = store::read::<EnemyTimers>(world, entity).unwrap_or_default();
    Some(EnemyView {
        def_id: enemy.def_id,
        name: enemy.name,
        tier: enemy.tier,
        health: store::health(world, entity)?,
        attack: store::read::<Attack>(world, entity)
            .map(|a| a.base_damage)
            .unwrap_or(0),
        defense: store::read::<Defense>(world, entity).map(|d| d.value).unwrap_or(0),
        shield: store::read::<Shield>(world, entity),
        statuses: store::read::<StatusEffects>(world, entity)
            .unwrap_or_default()
            .0,
        enraged: timers.enrage.is_some(),
        fortified: timers.fortify.is_some(),
        attack_progress: attack_progress(store::read::<Speed>(world, entity)),
        dying: store::is_dying(world, entity),
        visuals: visuals(ctx, entity),
    })
}
