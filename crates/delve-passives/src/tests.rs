#[cfg(test)]
mod tests {
    use delve_core::catalog::{Catalog, StanceEffect};
    use delve_core::components::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::compute::*;
    use crate::hooks::*;

    fn stance(active: &str, enhancements: &[&str]) -> StanceState {
        StanceState {
            available: vec!["fortress".into(), "avenger".into()],
            active: active.into(),
            enhancements: enhancements.iter().map(|s| s.to_string()).collect(),
            switch_cooldown_ms: 0.0,
        }
    }

    #[test]
    fn test_stance_base_effects() {
        let catalog = Catalog::builtin().unwrap();
        let c = compute(&catalog, &stance("fortress", &[]));
        assert_eq!(c.armor_percent, 30.0);
        assert_eq!(c.damage_reduction_percent, 10.0);
        assert_eq!(c.speed_percent, -10.0);
        assert_eq!(c.reflect_percent, 0.0);
    }

    #[test]
    fn test_enhancements_additive_for_matching_stance() {
        let catalog = Catalog::builtin().unwrap();
        let c = compute(&catalog, &stance("fortress", &["iron_skin", "immortal_guardian"]));
        assert_eq!(c.armor_percent, 50.0);
        assert_eq!(c.damage_reduction_percent, 20.0);
        assert!(c.survive_lethal);
    }

    #[test]
    fn test_other_stance_enhancements_inert() {
        let catalog = Catalog::builtin().unwrap();
        let c = compute(&catalog, &stance("fortress", &["thorns", "vengeful_strike"]));
        assert_eq!(c.reflect_percent, 0.0);
        assert_eq!(c.next_attack_bonus_percent, 0.0);

        let c = compute(&catalog, &stance("avenger", &["thorns", "iron_skin"]));
        assert_eq!(c.reflect_percent, 25.0);
        assert_eq!(c.armor_percent, 0.0);
    }

    #[test]
    fn test_unknown_stance_is_inert() {
        let catalog = Catalog::builtin().unwrap();
        let c = compute(&catalog, &stance("nope", &["iron_skin"]));
        assert_eq!(c, ComputedPassives::default());
    }

    #[test]
    fn test_replace_fields() {
        let mut c = ComputedPassives::default();
        apply_effect(&mut c, &StanceEffect::MaxDamagePerHit { percent: 30.0 });
        apply_effect(&mut c, &StanceEffect::MaxDamagePerHit { percent: 20.0 });
        assert_eq!(c.max_damage_per_hit_percent, 20.0);

        apply_effect(&mut c, &StanceEffect::LowHpArmor { threshold: 30.0, bonus: 5.0 });
        apply_effect(&mut c, &StanceEffect::LowHpArmor { threshold: 40.0, bonus: 3.0 });
        assert_eq!(c.low_hp_armor_threshold, 40.0);
        assert_eq!(c.low_hp_armor_bonus, 8.0);

        apply_effect(&mut c, &StanceEffect::DamageStacks { per_stack: 5.0, max_stacks: 5 });
        apply_effect(&mut c, &StanceEffect::DamageStacks { per_stack: 2.0, max_stacks: 3 });
        assert_eq!(c.stack_damage_percent, 7.0);
        assert_eq!(c.max_stacks, 3);
    }

    #[test]
    fn test_conditional_update() {
        let mut c = ComputedPassives {
            low_hp_armor_threshold: 30.0,
            low_hp_armor_bonus: 5.0,
            low_hp_damage_threshold: 50.0,
            low_hp_damage_percent: 25.0,
            ..Default::default()
        };
        update_conditional(&mut c, 80, 100);
        assert_eq!(c.active_armor_bonus, 0.0);
        assert_eq!(c.active_damage_percent, 0.0);

        update_conditional(&mut c, 40, 100);
        assert_eq!(c.active_armor_bonus, 0.0);
        assert_eq!(c.active_damage_percent, 25.0);

        update_conditional(&mut c, 10, 100);
        assert_eq!(c.active_armor_bonus, 5.0);

        // Thresholds themselves are untouched.
        assert_eq!(c.low_hp_armor_threshold, 30.0);
    }

    #[test]
    fn test_health_percent_zero_max() {
        assert_eq!(health_percent(5, 0), 0.0);
        assert_eq!(health_percent(-5, 10), 0.0);
        assert_eq!(health_percent(5, 10), 50.0);
    }

    #[test]
    fn test_pre_damage_pipeline() {
        let c = ComputedPassives {
            active_armor_bonus: 2.0,
            damage_reduction_percent: 50.0,
            ..Default::default()
        };
        // (12 - 2) * 0.5
        assert_eq!(pre_damage(&c, 12, 100), 5);

        let capped = ComputedPassives {
            max_damage_per_hit_percent: 20.0,
            ..Default::default()
        };
        assert_eq!(pre_damage(&capped, 80, 100), 20);
        assert_eq!(pre_damage(&capped, 10, 100), 10);
    }

    #[test]
    fn test_outgoing_multiplier_consumes_next_attack() {
        let c = ComputedPassives {
            power_percent: 10.0,
            stack_damage_percent: 5.0,
            next_attack_bonus_percent: 50.0,
            ..Default::default()
        };
        let mut combat = CombatPassiveState {
            damage_stacks: 2,
            next_attack_bonus: true,
            regen_carry: 0.0,
        };
        let m = outgoing_multiplier(&c, &mut combat);
        assert!((m - 1.7).abs() < 1e-9);
        assert!(!combat.next_attack_bonus);
        let m = outgoing_multiplier(&c, &mut combat);
        assert!((m - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_on_damaged_reflect_and_stacks() {
        let c = ComputedPassives {
            reflect_percent: 10.0,
            stack_damage_percent: 5.0,
            max_stacks: 2,
            next_attack_bonus_percent: 50.0,
            ..Default::default()
        };
        let mut combat = CombatPassiveState::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        // Small hits still reflect at least 1.
        let out = on_damaged(&c, &mut combat, 3, 10, 100, &mut rng);
        assert_eq!(out.reflect, 1);
        assert_eq!(out.counter, 0);
        assert_eq!(out.heal, 0);
        assert!(combat.next_attack_bonus);

        on_damaged(&c, &mut combat, 3, 10, 100, &mut rng);
        on_damaged(&c, &mut combat, 3, 10, 100, &mut rng);
        assert_eq!(combat.damage_stacks, 2);
    }

    #[test]
    fn test_on_damaged_certain_rolls() {
        let c = ComputedPassives {
            counter_chance: 1.0,
            counter_damage_percent: 50.0,
            heal_on_hit_chance: 1.0,
            heal_on_hit_percent: 5.0,
            ..Default::default()
        };
        let mut combat = CombatPassiveState::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let out = on_damaged(&c, &mut combat, 10, 12, 120, &mut rng);
        assert_eq!(out.counter, 6);
        assert_eq!(out.heal, 6);
        assert_eq!(out.reflect, 0);
    }

    #[test]
    fn test_survive_lethal_once_per_floor() {
        let c = ComputedPassives {
            survive_lethal: true,
            ..Default::default()
        };
        let mut floor = FloorPassiveState::default();
        assert_eq!(survive_lethal(&c, &floor), Some(1));
        floor.survive_lethal_used = true;
        assert_eq!(survive_lethal(&c, &floor), None);
        assert_eq!(survive_lethal(&ComputedPassives::default(), &FloorPassiveState::default()), None);
    }

    #[test]
    fn test_burn_multiplier_composes() {
        let c = ComputedPassives {
            burn_damage_percent: 50.0,
            burn_execute_threshold: 30.0,
            burn_execute_bonus_percent: 100.0,
            ..Default::default()
        };
        assert!((burn_multiplier(&c, 80.0) - 1.5).abs() < 1e-9);
        assert!((burn_multiplier(&c, 20.0) - 3.0).abs() < 1e-9);
        assert_eq!(burn_tick_rate(&c), 1.0);
    }

    #[test]
    fn test_proc_roll() {
        let c = ComputedPassives {
            proc_chance: 1.0,
            proc_bonus_damage: 3.0,
            proc_burn_dps: 3.0,
            proc_burn_duration: 3.0,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let p = roll_proc(&c, &mut rng).unwrap();
        assert_eq!(p.bonus_damage, 3);
        assert!(roll_proc(&ComputedPassives::default(), &mut rng).is_none());
    }

    #[test]
    fn test_lifesteal() {
        let c = ComputedPassives {
            lifesteal_percent: 10.0,
            ..Default::default()
        };
        assert_eq!(lifesteal(&c, 25), 3);
        assert_eq!(lifesteal(&c, 0), 0);
        assert_eq!(lifesteal(&ComputedPassives::default(), 50), 0);
    }

    proptest! {
        #[test]
        fn prop_pre_damage_at_least_one(
            damage in -50i32..500,
            armor in 0.0f64..50.0,
            dr in 0.0f64..150.0,
            cap in 0.0f64..100.0,
            max in 0i32..1000,
        ) {
            let c = ComputedPassives {
                active_armor_bonus: armor,
                damage_reduction_percent: dr,
                max_damage_per_hit_percent: cap,
                ..Default::default()
            };
            prop_assert!(pre_damage(&c, damage, max) >= 1);
        }

        #[test]
        fn prop_stacks_never_exceed_max(hits in 0usize..40, max_stacks in 0u32..10, seed in any::<u64>()) {
            let c = ComputedPassives {
                stack_damage_percent: 5.0,
                max_stacks,
                ..Default::default()
            };
            let mut combat = CombatPassiveState::default();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            for _ in 0..hits {
                on_damaged(&c, &mut combat, 5, 10, 100, &mut rng);
            }
            prop_assert!(combat.damage_stacks <= max_stacks);
        }
    }
}
