//! Stance bookkeeping on the player entity: passive recomputation and
//! the max-health bonus that follows it.

use hecs::{Entity, World};
use tracing::debug;

use delve_core::catalog::Catalog;
use delve_core::components::*;

use delve_passives::compute;

/// Re-aggregate the player's passives after a stance switch or a new
/// enhancement, then re-derive the HP%-gated bonuses and re-apply the
/// max-health bonus. Combat, floor and permanent counters are preserved.
pub fn recompute_passives(world: &mut World, catalog: &Catalog, entity: Entity) {
    let Some(stance) = world.get::<&StanceState>(entity).ok().map(|s| (*s).clone()) else {
        return;
    };
    let mut computed = compute::compute(catalog, &stance);

    let Ok((health, passives)) =
        world.query_one_mut::<(&mut Health, &mut PassiveEffectState)>(entity)
    else {
        return;
    };

    let base_max = health.max - passives.permanent.applied_max_health_bonus;
    let bonus = compute::max_health_bonus(&computed, base_max);
    health.max = (base_max + bonus).max(1);
    health.current = health.current.clamp(0, health.max);
    passives.permanent.applied_max_health_bonus = bonus;

    compute::update_conditional(&mut computed, health.current, health.max);
    passives.computed = computed;

    debug!(stance = %stance.active, enhancements = stance.enhancements.len(), "passives recomputed");
}
