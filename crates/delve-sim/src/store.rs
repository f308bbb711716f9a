//! Entity store helpers on top of `hecs::World`.
//!
//! A missing component means "absent from this step": every lookup here
//! returns `Option`/`bool` and never panics.

use hecs::{Entity, Query, World};

use delve_core::components::*;
use delve_core::enums::StatusKind;

/// Copy the ids matching `Q` so the caller can mutate while walking them.
pub fn collect<Q: Query>(world: &World) -> Vec<Entity> {
    world.query::<Q>().iter().map(|(e, _)| e).collect()
}

/// Copy a component out of an entity.
pub fn read<T: hecs::Component + Clone>(world: &World, entity: Entity) -> Option<T> {
    world.get::<&T>(entity).ok().map(|c| (*c).clone())
}

pub fn is_dying(world: &World, entity: Entity) -> bool {
    world.get::<&Dying>(entity).is_ok()
}

/// `health > 0` and no death marker.
pub fn is_alive(world: &World, entity: Entity) -> bool {
    let healthy = world
        .get::<&Health>(entity)
        .map(|h| h.current > 0)
        .unwrap_or(false);
    healthy && !is_dying(world, entity)
}

pub fn health(world: &World, entity: Entity) -> Option<Health> {
    world.get::<&Health>(entity).ok().map(|h| *h)
}

pub fn has_status(world: &World, entity: Entity, kind: StatusKind) -> bool {
    world
        .get::<&StatusEffects>(entity)
        .map(|s| s.0.iter().any(|e| e.kind == kind))
        .unwrap_or(false)
}

/// Strongest active magnitude of a status kind, 0 if absent.
pub fn status_magnitude(world: &World, entity: Entity, kind: StatusKind) -> f64 {
    world
        .get::<&StatusEffects>(entity)
        .map(|s| {
            s.0.iter()
                .filter(|e| e.kind == kind)
                .map(|e| e.magnitude)
                .fold(0.0, f64::max)
        })
        .unwrap_or(0.0)
}

/// Computed passives of an entity, default (inert) when it has none.
pub fn computed_passives(world: &World, entity: Entity) -> ComputedPassives {
    world
        .get::<&PassiveEffectState>(entity)
        .map(|p| p.computed.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn liveness_requires_health_and_no_dying() {
        let mut world = World::new();
        let alive = world.spawn((Health { current: 5, max: 10 },));
        let dead = world.spawn((Health { current: 0, max: 10 },));
        let dying = world.spawn((
            Health { current: 5, max: 10 },
            Dying {
                started_at_tick: 0,
                duration_ticks: 30,
            },
        ));
        let bare = world.spawn((Defense { value: 1 },));

        assert!(is_alive(&world, alive));
        assert!(!is_alive(&world, dead));
        assert!(!is_alive(&world, dying));
        assert!(!is_alive(&world, bare));
    }

    #[test]
    fn collect_tracks_component_membership() {
        let mut world = World::new();
        let a = world.spawn((Health { current: 1, max: 1 },));
        let b = world.spawn((Health { current: 1, max: 1 }, StatusEffects::default()));
        assert_eq!(collect::<&StatusEffects>(&world), vec![b]);

        world.insert_one(a, StatusEffects::default()).unwrap();
        let mut ids = collect::<&StatusEffects>(&world);
        ids.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(ids, expected);

        world.remove_one::<StatusEffects>(b).unwrap();
        assert_eq!(collect::<&StatusEffects>(&world), vec![a]);
    }
}
