//! Entity spawn factories for the player and enemies.

use hecs::{Entity, EntityBuilder, World};

use delve_core::catalog::{ClassDef, EnemyDef};
use delve_core::components::*;
use delve_core::config::DevParams;
use delve_core::constants::*;

/// Crit multiplier and damage spread for every enemy.
const ENEMY_CRIT_MULTIPLIER: f64 = 1.5;
const ENEMY_VARIANCE: f64 = 0.1;

/// Create the player from a class definition, or re-initialise `existing`
/// in place so the entity id survives across runs.
pub fn setup_player(
    world: &mut World,
    class: &ClassDef,
    dev: &DevParams,
    existing: Option<Entity>,
) -> Entity {
    let mut builder = player_builder(class, dev);
    if let Some(entity) = existing.filter(|e| world.contains(*e)) {
        strip_run_components(world, entity);
        if world.insert(entity, builder.build()).is_ok() {
            return entity;
        }
    }
    world.spawn(builder.build())
}

fn player_builder(class: &ClassDef, dev: &DevParams) -> EntityBuilder {
    let health = class.health.max(1);
    let mut builder = EntityBuilder::new();
    builder
        .add(Player {
            class_id: class.id.clone(),
        })
        .add(Health {
            current: health,
            max: health,
        })
        .add(Resource {
            current: class.resource_max.max(0),
            max: class.resource_max.max(0),
            kind: class.resource_kind,
            regen_per_sec: class.resource_regen.max(0.0),
            regen_carry: 0.0,
        })
        .add(Attack {
            base_damage: dev.attack_override.unwrap_or(class.attack).max(0),
            crit_chance: class.crit_chance.clamp(0.0, 1.0),
            crit_multiplier: class.crit_multiplier.max(1.0),
            variance: class.variance.clamp(0.0, 0.9),
        })
        .add(Defense {
            value: dev.defense_override.unwrap_or(class.defense).max(0),
        })
        .add(Speed {
            value: class.speed.max(1.0),
            attack_interval_ms: class.attack_interval_ms.max(TICK_MS),
            accumulated_ms: 0.0,
        })
        .add(Fortune {
            value: class.fortune.max(0),
        })
        .add(StatusEffects::default())
        .add(Buffs::default())
        .add(Cooldowns::default())
        .add(KnownPowers(class.powers.clone()))
        .add(PassiveEffectState::default())
        .add(Progress {
            level: 1,
            xp: 0,
            xp_to_next: BASE_XP_TO_LEVEL,
            gold: dev.gold_override.unwrap_or(class.gold),
        })
        .add(Inventory::default())
        .add(VisualMarkers::default());
    builder
}

/// Remove components that only exist once a run has progressed.
fn strip_run_components(world: &mut World, entity: Entity) {
    let _ = world.remove_one::<Path>(entity);
    let _ = world.remove_one::<PathResource>(entity);
    let _ = world.remove_one::<StanceState>(entity);
    let _ = world.remove_one::<Shield>(entity);
    let _ = world.remove_one::<Dying>(entity);
}

/// Full restore between attempts: health, resources, statuses, buffs,
/// shield, cooldowns and per-combat/per-floor passive counters.
/// Level, items, path choices and computed passives are kept.
pub fn restore_player(world: &mut World, entity: Entity) {
    let _ = world.remove_one::<Dying>(entity);
    let _ = world.remove_one::<Shield>(entity);

    if let Ok(mut health) = world.get::<&mut Health>(entity) {
        health.current = health.max.max(1);
    }
    if let Ok(mut resource) = world.get::<&mut Resource>(entity) {
        resource.current = resource.max;
        resource.regen_carry = 0.0;
    }
    if let Ok(mut statuses) = world.get::<&mut StatusEffects>(entity) {
        statuses.0.clear();
    }
    if let Ok(mut buffs) = world.get::<&mut Buffs>(entity) {
        buffs.0.clear();
    }
    if let Ok(mut cooldowns) = world.get::<&mut Cooldowns>(entity) {
        cooldowns.0.clear();
    }
    if let Ok(mut speed) = world.get::<&mut Speed>(entity) {
        speed.accumulated_ms = 0.0;
    }
    if let Ok(mut path) = world.get::<&mut Path>(entity) {
        path.ability_cooldowns.clear();
    }
    if let Ok(mut resource) = world.get::<&mut PathResource>(entity) {
        resource.current = 0;
    }
    if let Ok(mut stance) = world.get::<&mut StanceState>(entity) {
        stance.switch_cooldown_ms = 0.0;
    }
    if let Ok(mut passives) = world.get::<&mut PassiveEffectState>(entity) {
        passives.combat = CombatPassiveState::default();
        passives.floor = FloorPassiveState::default();
    }
    if let Ok(mut markers) = world.get::<&mut VisualMarkers>(entity) {
        markers.0.clear();
    }
}

/// Stat multiplier for enemies on `floor` (1.0 on floor 1).
pub fn floor_scale(floor: u32) -> f64 {
    1.0 + FLOOR_STAT_SCALING * floor.saturating_sub(1) as f64
}

/// Reward multiplier for enemies on `floor` (1.0 on floor 1).
pub fn reward_scale(floor: u32) -> f64 {
    1.0 + FLOOR_REWARD_SCALING * floor.saturating_sub(1) as f64
}

/// Spawn an enemy from its definition, scaled for `floor`.
pub fn spawn_enemy(world: &mut World, def: &EnemyDef, floor: u32) -> Entity {
    let scale = floor_scale(floor);
    let rewards = reward_scale(floor);
    let health = ((def.health as f64 * scale).round() as i32).max(1);
    let defense = def.defense + FLOOR_DEFENSE_STEP * floor.saturating_sub(1) as i32;

    let mut builder = EntityBuilder::new();
    builder
        .add(Enemy {
            def_id: def.id.clone(),
            name: def.name.clone(),
            tier: def.tier,
            xp_reward: (def.xp as f64 * rewards).round() as u32,
            gold_reward: (def.gold as f64 * rewards).round() as u32,
            abilities: def.abilities.clone(),
        })
        .add(Health {
            current: health,
            max: health,
        })
        .add(Attack {
            base_damage: ((def.attack as f64 * scale).round() as i32).max(0),
            crit_chance: def.crit_chance.clamp(0.0, 1.0),
            crit_multiplier: ENEMY_CRIT_MULTIPLIER,
            variance: ENEMY_VARIANCE,
        })
        .add(Defense {
            value: defense.max(0),
        })
        .add(Speed {
            value: def.speed.max(1.0),
            attack_interval_ms: def.attack_interval_ms.max(TICK_MS),
            accumulated_ms: 0.0,
        })
        .add(StatusEffects::default())
        .add(Buffs::default())
        .add(EnemyTimers::default())
        .add(VisualMarkers::default());
    world.spawn(builder.build())
}
