//! Autoplay: a simple policy that plays a run from the main menu.
//!
//! The policy only reads snapshots and the static catalog and answers with
//! player commands, exactly like a human frontend would.

use tracing::info;

use delve_core::catalog::Catalog;
use delve_core::commands::PlayerCommand;
use delve_core::components::Popup;
use delve_core::enums::{CombatStage, GamePhase, PathResourceKind};
use delve_core::state::{GameStateSnapshot, PlayerView};
use delve_sim::engine::{SimConfig, SimulationEngine};
use delve_sim::game_loop::GameLoop;

/// Decides the next commands from the latest snapshot.
#[derive(Debug, Clone)]
pub struct AutoplayPolicy {
    pub class_id: String,
    /// Retries allowed before the run is abandoned.
    pub max_retries: u32,
    retries: u32,
}

impl AutoplayPolicy {
    pub fn new(class_id: impl Into<String>, max_retries: u32) -> Self {
        Self {
            class_id: class_id.into(),
            max_retries,
            retries: 0,
        }
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Commands for this frame. Popups are answered before anything else.
    pub fn decide(&mut self, snapshot: &GameStateSnapshot, catalog: &Catalog) -> Vec<PlayerCommand> {
        if let Some(popup) = snapshot.popups.first() {
            return vec![answer_popup(popup)];
        }

        match snapshot.phase {
            GamePhase::Menu => vec![PlayerCommand::StartGame],
            GamePhase::ClassSelect => vec![PlayerCommand::SelectClass {
                class_id: self.class_id.clone(),
            }],
            GamePhase::Combat => cast_ready_powers(snapshot),
            GamePhase::FloorComplete => vec![PlayerCommand::GoToShop],
            GamePhase::Shop => vec![shop(snapshot, catalog)],
            GamePhase::Defeat => {
                if self.retries < self.max_retries {
                    self.retries += 1;
                    vec![PlayerCommand::Retry]
                } else {
                    vec![PlayerCommand::Abandon]
                }
            }
            GamePhase::Victory => Vec::new(),
        }
    }
}

fn answer_popup(popup: &Popup) -> PlayerCommand {
    match popup {
        Popup::PathSelection { options } => match options.first() {
            Some(id) => PlayerCommand::SelectPath { path_id: id.clone() },
            None => PlayerCommand::DismissPopup,
        },
        Popup::AbilityChoice { options } => match options.first() {
            Some(id) => PlayerCommand::SelectAbility {
                ability_id: id.clone(),
            },
            None => PlayerCommand::DismissPopup,
        },
        Popup::SubpathSelection { options } => match options.first() {
            Some(id) => PlayerCommand::SelectSubpath {
                subpath_id: id.clone(),
            },
            None => PlayerCommand::DismissPopup,
        },
        Popup::LevelUp { .. } => PlayerCommand::DismissPopup,
    }
}

fn spendable(player: &PlayerView) -> i32 {
    match &player.path_resource {
        Some(r) if r.kind != PathResourceKind::Default => r.current,
        _ => player.resource.current,
    }
}

/// Every power that is off cooldown and affordable, in known order.
fn cast_ready_powers(snapshot: &GameStateSnapshot) -> Vec<PlayerCommand> {
    if snapshot.combat_stage != CombatStage::Engaged || snapshot.paused {
        return Vec::new();
    }
    let (Some(player), Some(enemy)) = (&snapshot.player, &snapshot.enemy) else {
        return Vec::new();
    };
    if player.dying || enemy.dying {
        return Vec::new();
    }

    let mut budget = spendable(player);
    let mut commands = Vec::new();
    for power in &player.powers {
        if power.remaining_ms > 0.0 || power.cost > budget {
            continue;
        }
        budget -= power.cost;
        commands.push(PlayerCommand::ActivatePower {
            power_id: power.power_id.clone(),
        });
    }
    commands
}

/// Buy the cheapest affordable item not owned yet, else enhance, else leave.
fn shop(snapshot: &GameStateSnapshot, catalog: &Catalog) -> PlayerCommand {
    let Some(player) = &snapshot.player else {
        return PlayerCommand::LeaveShop;
    };
    let gold = player.progress.gold;
    let level_of = |id: &str| {
        player
            .items
            .iter()
            .find(|(owned, _)| owned == id)
            .map(|(_, level)| *level)
    };

    let mut items: Vec<_> = catalog.items.values().collect();
    items.sort_by_key(|item| item.cost);

    if let Some(item) = items
        .iter()
        .find(|item| level_of(&item.id).is_none() && item.cost <= gold)
    {
        return PlayerCommand::PurchaseItem {
            item_id: item.id.clone(),
        };
    }
    let upgrade = items.iter().find(|item| {
        level_of(&item.id)
            .is_some_and(|level| level < item.max_level && item.enhance_cost * level <= gold)
    });
    match upgrade {
        Some(item) => PlayerCommand::EnhanceItem {
            item_id: item.id.clone(),
        },
        None => PlayerCommand::LeaveShop,
    }
}

/// Outcome of an unattended run.
#[derive(Debug, Clone)]
pub struct AutoplayReport {
    pub frames: u64,
    pub ticks: u64,
    pub phase: GamePhase,
    pub floor: u32,
    pub level: u32,
    pub gold: u32,
    pub retries: u32,
}

/// Play a run with synthetic frame deltas until victory, the run is
/// abandoned, or `max_frames` elapse.
pub fn run(
    config: SimConfig,
    class_id: &str,
    max_retries: u32,
    max_frames: u64,
    frame_ms: f64,
) -> Result<AutoplayReport, delve_core::error::CatalogError> {
    let engine = SimulationEngine::new(config)?;
    let catalog = engine.context().catalog.clone();
    let mut game_loop = GameLoop::new(engine);
    let mut policy = AutoplayPolicy::new(class_id, max_retries);
    game_loop.start();

    let mut frames = 0;
    let mut last_floor = 0;
    let mut snapshot = game_loop.engine().snapshot();
    let mut started = false;
    while frames < max_frames {
        let commands = policy.decide(&snapshot, &catalog);
        for command in commands {
            game_loop.send(command);
        }
        let Some(next) = game_loop.frame(frame_ms) else {
            break;
        };
        snapshot = next;
        frames += 1;

        if snapshot.phase != GamePhase::Menu {
            started = true;
        }
        if snapshot.floor != last_floor && snapshot.phase == GamePhase::Combat {
            last_floor = snapshot.floor;
            let level = snapshot.player.as_ref().map(|p| p.progress.level).unwrap_or(1);
            info!(floor = last_floor, level, frames, "autoplay reached floor");
        }
        if snapshot.phase == GamePhase::Victory || (started && snapshot.phase == GamePhase::Menu) {
            break;
        }
    }
    game_loop.stop();

    let progress = snapshot.player.as_ref().map(|p| p.progress);
    Ok(AutoplayReport {
        frames,
        ticks: snapshot.tick,
        phase: snapshot.phase,
        floor: snapshot.floor,
        level: progress.map(|p| p.level).unwrap_or(1),
        gold: progress.map(|p| p.gold).unwrap_or(0),
        retries: policy.retries(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::builtin().unwrap()
    }

    #[test]
    fn test_policy_walks_the_menus() {
        let catalog = catalog();
        let mut policy = AutoplayPolicy::new("mage", 0);
        let mut snapshot = GameStateSnapshot::default();
        assert!(matches!(
            policy.decide(&snapshot, &catalog)[..],
            [PlayerCommand::StartGame]
        ));

        snapshot.phase = GamePhase::ClassSelect;
        match &policy.decide(&snapshot, &catalog)[..] {
            [PlayerCommand::SelectClass { class_id }] => assert_eq!(class_id, "mage"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_policy_answers_popups_first() {
        let catalog = catalog();
        let mut policy = AutoplayPolicy::new("warrior", 0);
        let snapshot = GameStateSnapshot {
            phase: GamePhase::Combat,
            popups: vec![Popup::PathSelection {
                options: vec!["guardian".into(), "berserker".into()],
            }],
            ..Default::default()
        };
        match &policy.decide(&snapshot, &catalog)[..] {
            [PlayerCommand::SelectPath { path_id }] => assert_eq!(path_id, "guardian"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_policy_retries_then_abandons() {
        let catalog = catalog();
        let mut policy = AutoplayPolicy::new("warrior", 1);
        let snapshot = GameStateSnapshot {
            phase: GamePhase::Defeat,
            ..Default::default()
        };
        assert!(matches!(
            policy.decide(&snapshot, &catalog)[..],
            [PlayerCommand::Retry]
        ));
        assert!(matches!(
            policy.decide(&snapshot, &catalog)[..],
            [PlayerCommand::Abandon]
        ));
    }

    #[test]
    fn test_autoplay_makes_progress() {
        let report = run(SimConfig::default(), "warrior", 3, 20_000, 16.0).unwrap();
        assert!(report.ticks > 0);
        assert!(report.phase != GamePhase::Menu || report.retries > 0);
        assert!(report.level >= 1);
    }
}
