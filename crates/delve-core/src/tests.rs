#[cfg(test)]
mod tests {
    use crate::catalog::*;
    use crate::commands::PlayerCommand;
    use crate::constants::*;
    use crate::enums::*;
    use crate::error::CatalogError;
    use crate::state::GameStateSnapshot;
    use crate::types::{clamp_chance, effective_delta_ms, SimTime};

    const MINIMAL: &str = r#"{
        "classes": [{
            "id": "knight", "name": "Knight", "health": 100, "resource_kind": "energy",
            "resource_max": 40, "resource_regen": 2.0, "attack": 10, "crit_chance": 0.1,
            "crit_multiplier": 1.5, "variance": 0.0, "defense": 3, "speed": 10.0,
            "attack_interval_ms": 1000.0, "fortune": 0, "gold": 0,
            "powers": ["bash"], "paths": []
        }],
        "powers": [{ "id": "bash", "name": "Bash", "cost": 5, "cooldown_ms": 1000.0,
                     "effect": { "kind": "damage", "base": 5, "attack_scaling": 1.0 } }],
        "paths": [],
        "enemies": [{ "id": "slime", "name": "Slime", "tier": "normal", "health": 20,
                      "attack": 3, "defense": 0, "speed": 10.0, "attack_interval_ms": 1000.0,
                      "xp": 5, "gold": 1, "min_floor": 1, "max_floor": 10 }]
    }"#;

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = Catalog::builtin().expect("builtin catalog must validate");
        assert!(catalog.class("warrior").is_some());
        assert!(catalog.class("mage").is_some());
        assert_eq!(catalog.paths.len(), 4);
        assert!(catalog.stance("fortress").is_some());
        assert!(catalog.enhancement("immortal_guardian").is_some());
        assert!(catalog.item("iron_sword").is_some());
    }

    #[test]
    fn test_builtin_paths_belong_to_their_class() {
        let catalog = Catalog::builtin().unwrap();
        for class in catalog.classes.values() {
            for path_id in &class.paths {
                assert_eq!(catalog.path(path_id).unwrap().class_id, class.id);
            }
        }
    }

    #[test]
    fn test_active_paths_carry_a_resource() {
        let catalog = Catalog::builtin().unwrap();
        let berserker = catalog.path("berserker").unwrap();
        assert_eq!(berserker.kind, PathKind::Active);
        let resource = berserker.resource.as_ref().unwrap();
        assert_eq!(resource.kind, PathResourceKind::Rage);
        assert_eq!(resource.generation.get(&Trigger::OnDamaged), Some(&8));
        assert_eq!(resource.generation.get(&Trigger::OnDodge), None);
    }

    #[test]
    fn test_minimal_catalog() {
        let catalog = Catalog::from_json(MINIMAL).unwrap();
        assert_eq!(catalog.classes.len(), 1);
        assert!(catalog.items.is_empty());
        assert_eq!(
            catalog.power("bash").unwrap().effect,
            PowerEffect::Damage { base: 5, attack_scaling: 1.0 }
        );
    }

    #[test]
    fn test_dangling_power_rejected() {
        let json = MINIMAL.replace(r#""powers": ["bash"]"#, r#""powers": ["smash"]"#);
        match Catalog::from_json(&json) {
            Err(CatalogError::UnknownReference { table, id, .. }) => {
                assert_eq!(table, "power");
                assert_eq!(id, "smash");
            }
            other => panic!("expected unknown reference, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let json = MINIMAL.replace(
            r#""paths": [],"#,
            r#""paths": [],
            "items": [
                { "id": "ring", "name": "Ring", "cost": 1, "enhance_cost": 1, "max_level": 1, "bonus": {} },
                { "id": "ring", "name": "Ring", "cost": 1, "enhance_cost": 1, "max_level": 1, "bonus": {} }
            ],"#,
        );
        assert!(matches!(
            Catalog::from_json(&json),
            Err(CatalogError::DuplicateId { table: "item", .. })
        ));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(
            Catalog::from_json("{ not json"),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn test_enemies_for_floor_and_boss() {
        let catalog = Catalog::builtin().unwrap();
        let bosses = catalog.enemies_for(1, true);
        assert_eq!(bosses.len(), 1);
        assert_eq!(bosses[0].id, "goblin_king");
        assert_eq!(catalog.enemies_for(8, true)[0].id, "lich");

        let normals = catalog.enemies_for(1, false);
        assert!(normals.iter().all(|e| e.tier != EnemyTier::Boss));
        assert!(normals.iter().any(|e| e.id == "rat"));
        assert!(normals.iter().all(|e| e.id != "troll"));
    }

    #[test]
    fn test_enemies_for_falls_back_outside_range() {
        let catalog = Catalog::from_json(MINIMAL).unwrap();
        // No bosses at all: the whole table is eligible.
        let bosses = catalog.enemies_for(50, true);
        assert_eq!(bosses.len(), 1);
        assert_eq!(bosses[0].id, "slime");
    }

    #[test]
    fn test_player_command_serde_tag() {
        let cmd = PlayerCommand::ActivatePower {
            power_id: "fireball".into(),
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains(r#""type":"ActivatePower""#));
        let back: PlayerCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cmd);

        let unit: PlayerCommand = serde_json::from_str(r#"{"type":"TogglePause"}"#).unwrap();
        assert_eq!(unit, PlayerCommand::TogglePause);
    }

    #[test]
    fn test_commands_allowed_while_paused() {
        assert!(PlayerCommand::TogglePause.allowed_while_paused());
        assert!(PlayerCommand::PurchaseItem {
            item_id: "iron_sword".into()
        }
        .allowed_while_paused());
        assert!(!PlayerCommand::ActivatePower {
            power_id: "fireball".into()
        }
        .allowed_while_paused());
        assert!(!PlayerCommand::SwitchStance {
            stance_id: "hex".into()
        }
        .allowed_while_paused());
    }

    #[test]
    fn test_effective_delta() {
        assert_eq!(effective_delta_ms(1.0), TICK_MS);
        assert_eq!(effective_delta_ms(3.0), TICK_MS * 3.0);
        assert_eq!(effective_delta_ms(0.0), TICK_MS);
        assert_eq!(effective_delta_ms(f64::NAN), TICK_MS);
    }

    #[test]
    fn test_clamp_chance() {
        assert_eq!(clamp_chance(-0.5), 0.0);
        assert_eq!(clamp_chance(1.5), 1.0);
        assert_eq!(clamp_chance(f64::NAN), 0.0);
        assert_eq!(clamp_chance(0.3), 0.3);
    }

    #[test]
    fn test_sim_time_advance() {
        let mut t = SimTime::default();
        t.advance(TICK_MS * 2.0);
        t.advance(-5.0);
        assert_eq!(t.tick, 2);
        assert_eq!(t.elapsed_ms, 32.0);
    }

    #[test]
    fn test_trigger_names() {
        assert_eq!(serde_json::to_string(&Trigger::OnPowerUse).unwrap(), r#""on_power_use""#);
        assert_eq!(serde_json::to_string(&Trigger::CombatStart).unwrap(), r#""combat_start""#);
    }

    #[test]
    fn test_side_opponent() {
        assert_eq!(Side::Player.opponent(), Side::Enemy);
        assert_eq!(Side::Enemy.opponent(), Side::Player);
    }

    #[test]
    fn test_default_snapshot_serializes() {
        let snap = GameStateSnapshot::default();
        let json = serde_json::to_string(&snap).unwrap();
        let back: GameStateSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.phase, GamePhase::Menu);
        assert!(back.player.is_none());
    }
}
