//! Cleanup system: always last. Drops delivered or stale presentation
//! output, despawns finished death animations and clears stray one-tick
//! queues.

use delve_core::components::{Dying, VisualMarkers};
use delve_core::constants::ANIMATION_EVENT_TTL_TICKS;

use crate::context::SimContext;

pub fn run(ctx: &mut SimContext) {
    let now = ctx.time.tick;

    ctx.animations
        .retain(|e| !e.consumed && e.tick + ANIMATION_EVENT_TTL_TICKS > now);
    ctx.floating.retain(|f| f.until_tick > now);

    // Finished death animations. The player entity is never removed.
    ctx.despawn_buffer.clear();
    for (entity, dying) in ctx.world.query_mut::<&Dying>() {
        if Some(entity) == ctx.player {
            continue;
        }
        if now >= dying.started_at_tick + dying.duration_ticks {
            ctx.despawn_buffer.push(entity);
        }
    }
    for entity in ctx.despawn_buffer.drain(..) {
        let _ = ctx.world.despawn(entity);
        if ctx.enemy == Some(entity) {
            ctx.enemy = None;
        }
    }

    ctx.pending_attacks.clear();
    ctx.pending_casts.clear();

    for (_entity, markers) in ctx.world.query_mut::<&mut VisualMarkers>() {
        markers.0.retain(|m| m.until_tick > now);
    }
}
