//! Health, shield, status and buff helpers shared by the systems.

use hecs::{Entity, World};

use delve_core::catalog::StatBonus;
use delve_core::components::*;
use delve_core::enums::*;

/// Result of routing damage through shield then health.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DamageOutcome {
    /// Absorbed by the shield.
    pub absorbed: i32,
    /// Removed from health.
    pub to_health: i32,
    /// Health reached 0 with this hit.
    pub killed: bool,
}

/// Apply `amount` damage: the shield absorbs first, the remainder hits health,
/// health clamps at 0. An emptied shield is removed.
pub fn apply_damage(world: &mut World, target: Entity, amount: i32) -> DamageOutcome {
    let mut outcome = DamageOutcome::default();
    let mut remaining = amount.max(0);

    let mut shield_gone = false;
    if let Ok(mut shield) = world.get::<&mut Shield>(target) {
        let absorbed = remaining.min(shield.value.max(0));
        shield.value -= absorbed;
        remaining -= absorbed;
        outcome.absorbed = absorbed;
        shield_gone = shield.value <= 0;
    }
    if shield_gone {
        let _ = world.remove_one::<Shield>(target);
    }

    if remaining > 0 {
        outcome.to_health = damage_health(world, target, remaining, &mut outcome.killed);
    }
    outcome
}

/// Damage health directly, bypassing shields (damage over time, auras).
pub fn apply_direct_damage(world: &mut World, target: Entity, amount: i32) -> DamageOutcome {
    let mut outcome = DamageOutcome::default();
    if amount > 0 {
        outcome.to_health = damage_health(world, target, amount, &mut outcome.killed);
    }
    outcome
}

fn damage_health(world: &mut World, target: Entity, amount: i32, killed: &mut bool) -> i32 {
    let Ok(mut health) = world.get::<&mut Health>(target) else {
        return 0;
    };
    let before = health.current;
    health.current = (health.current - amount).clamp(0, health.max.max(0));
    *killed = before > 0 && health.current == 0;
    before - health.current
}

/// Heal up to max health. Returns the amount actually restored.
pub fn heal(world: &mut World, target: Entity, amount: i32) -> i32 {
    if amount <= 0 {
        return 0;
    }
    let Ok(mut health) = world.get::<&mut Health>(target) else {
        return 0;
    };
    let before = health.current;
    health.current = (health.current + amount).clamp(0, health.max.max(0));
    health.current - before
}

pub fn set_health(world: &mut World, target: Entity, value: i32) {
    if let Ok(mut health) = world.get::<&mut Health>(target) {
        health.current = value.clamp(0, health.max.max(0));
    }
}

/// Add a status. An existing effect of the same kind is refreshed to the
/// longer duration and the stronger rate/magnitude; its carry is kept.
pub fn add_status(world: &mut World, target: Entity, effect: StatusEffect) {
    if effect.remaining_turns <= 0.0 {
        return;
    }
    if world.get::<&StatusEffects>(target).is_err() {
        let _ = world.insert_one(target, StatusEffects::default());
    }
    if let Ok(mut statuses) = world.get::<&mut StatusEffects>(target) {
        if let Some(existing) = statuses.0.iter_mut().find(|s| s.kind == effect.kind) {
            existing.remaining_turns = existing.remaining_turns.max(effect.remaining_turns);
            existing.damage_per_sec = existing.damage_per_sec.max(effect.damage_per_sec);
            existing.magnitude = existing.magnitude.max(effect.magnitude);
        } else {
            statuses.0.push(effect);
        }
    }
}

pub fn remove_status(world: &mut World, target: Entity, kind: StatusKind) -> bool {
    match world.get::<&mut StatusEffects>(target) {
        Ok(mut statuses) => {
            let before = statuses.0.len();
            statuses.0.retain(|s| s.kind != kind);
            statuses.0.len() != before
        }
        Err(_) => false,
    }
}

/// Add a timed buff. A buff from the same source is replaced.
pub fn add_buff(world: &mut World, target: Entity, buff: Buff) {
    if buff.remaining_ms <= 0.0 {
        return;
    }
    if world.get::<&Buffs>(target).is_err() {
        let _ = world.insert_one(target, Buffs::default());
    }
    if let Ok(mut buffs) = world.get::<&mut Buffs>(target) {
        buffs.0.retain(|b| b.source != buff.source);
        buffs.0.push(buff);
    }
}

/// Product of all active multipliers on `stat`; 1 without buffs.
pub fn buff_multiplier(world: &World, entity: Entity, stat: BuffStat) -> f64 {
    world
        .get::<&Buffs>(entity)
        .map(|b| {
            b.0.iter()
                .filter(|b| b.stat == stat)
                .map(|b| b.multiplier.max(0.0))
                .product::<f64>()
        })
        .unwrap_or(1.0)
}

/// Grant a shield. A stronger existing shield is kept; durations refresh.
pub fn grant_shield(world: &mut World, target: Entity, value: i32, duration_ms: f64) {
    if value <= 0 || duration_ms <= 0.0 {
        return;
    }
    if let Ok(mut shield) = world.get::<&mut Shield>(target) {
        shield.value = shield.value.max(value);
        shield.remaining_ms = duration_ms;
        shield.max_duration_ms = duration_ms;
        return;
    }
    let _ = world.insert_one(
        target,
        Shield {
            value,
            remaining_ms: duration_ms,
            max_duration_ms: duration_ms,
        },
    );
}

/// Apply a flat stat bonus (subpaths, items, enhancements of items).
pub fn apply_stat_bonus(world: &mut World, target: Entity, bonus: &StatBonus) {
    if let Ok(mut health) = world.get::<&mut Health>(target) {
        health.max = (health.max + bonus.max_health).max(1);
        health.current = (health.current + bonus.max_health.max(0)).clamp(0, health.max);
    }
    if let Ok(mut attack) = world.get::<&mut Attack>(target) {
        attack.base_damage = (attack.base_damage + bonus.attack).max(0);
        attack.crit_chance = (attack.crit_chance + bonus.crit_chance).clamp(0.0, 1.0);
    }
    if let Ok(mut defense) = world.get::<&mut Defense>(target) {
        defense.value = (defense.value + bonus.defense).max(0);
    }
    if let Ok(mut speed) = world.get::<&mut Speed>(target) {
        speed.value = (speed.value + bonus.speed).max(1.0);
    }
    if let Ok(mut fortune) = world.get::<&mut Fortune>(target) {
        fortune.value = (fortune.value + bonus.fortune).max(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(world: &mut World, hp: i32, shield: Option<i32>) -> Entity {
        let e = world.spawn((Health { current: hp, max: hp },));
        if let Some(value) = shield {
            world
                .insert_one(
                    e,
                    Shield {
                        value,
                        remaining_ms: 5000.0,
                        max_duration_ms: 5000.0,
                    },
                )
                .unwrap();
        }
        e
    }

    #[test]
    fn shield_partially_absorbs() {
        let mut world = World::new();
        let e = target(&mut world, 100, Some(10));
        let out = apply_damage(&mut world, e, 15);
        assert_eq!(out.absorbed, 10);
        assert_eq!(out.to_health, 5);
        assert_eq!(world.get::<&Health>(e).unwrap().current, 95);
        assert!(world.get::<&Shield>(e).is_err());
    }

    #[test]
    fn shield_fully_absorbs() {
        let mut world = World::new();
        let e = target(&mut world, 100, Some(20));
        let out = apply_damage(&mut world, e, 15);
        assert_eq!(out, DamageOutcome { absorbed: 15, to_health: 0, killed: false });
        assert_eq!(world.get::<&Shield>(e).unwrap().value, 5);
        assert_eq!(world.get::<&Health>(e).unwrap().current, 100);
    }

    #[test]
    fn health_clamps_at_zero_and_kills_once() {
        let mut world = World::new();
        let e = target(&mut world, 10, None);
        let out = apply_damage(&mut world, e, 25);
        assert!(out.killed);
        assert_eq!(out.to_health, 10);
        assert_eq!(world.get::<&Health>(e).unwrap().current, 0);
        let again = apply_damage(&mut world, e, 5);
        assert!(!again.killed);
        assert_eq!(again.to_health, 0);
    }

    #[test]
    fn heal_caps_at_max() {
        let mut world = World::new();
        let e = world.spawn((Health { current: 90, max: 100 },));
        assert_eq!(heal(&mut world, e, 25), 10);
        assert_eq!(world.get::<&Health>(e).unwrap().current, 100);
    }

    #[test]
    fn status_refresh_keeps_single_entry() {
        let mut world = World::new();
        let e = world.spawn((Health { current: 10, max: 10 },));
        let burn = |secs: f64, dps: f64| StatusEffect {
            kind: StatusKind::Burn,
            damage_per_sec: dps,
            remaining_turns: secs,
            magnitude: 0.0,
            accumulator: 0.0,
        };
        add_status(&mut world, e, burn(3.0, 2.0));
        add_status(&mut world, e, burn(1.0, 5.0));
        let statuses = world.get::<&StatusEffects>(e).unwrap();
        assert_eq!(statuses.0.len(), 1);
        assert_eq!(statuses.0[0].remaining_turns, 3.0);
        assert_eq!(statuses.0[0].damage_per_sec, 5.0);
    }

    #[test]
    fn buff_multipliers_stack_multiplicatively() {
        let mut world = World::new();
        let e = world.spawn((Health { current: 10, max: 10 },));
        for (source, m) in [("a", 1.5), ("b", 2.0)] {
            add_buff(
                &mut world,
                e,
                Buff {
                    stat: BuffStat::Attack,
                    multiplier: m,
                    remaining_ms: 1000.0,
                    source: source.into(),
                },
            );
        }
        assert_eq!(buff_multiplier(&world, e, BuffStat::Attack), 3.0);
        assert_eq!(buff_multiplier(&world, e, BuffStat::Defense), 1.0);
    }
}
