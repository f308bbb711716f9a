//! Player command handlers. One function per command; each either applies
//! the command completely or rejects it without mutating anything.

use hecs::Entity;
use tracing::info;

use delve_core::catalog::PathKind;
use delve_core::commands::PlayerCommand;
use delve_core::components::*;
use delve_core::constants::*;
use delve_core::enums::*;
use delve_core::error::CommandRejection;
use delve_core::events::LogCategory;
use delve_core::types::effective_delta_ms;

use delve_passives::compute;

use crate::context::{PendingCast, SimContext};
use crate::progression;
use crate::stance;
use crate::store;
use crate::systems::flow;
use crate::vitals;
use crate::world_setup;

type Handled = Result<(), CommandRejection>;

/// Dispatch a command to its handler.
pub fn handle(ctx: &mut SimContext, command: PlayerCommand) -> Handled {
    if ctx.is_paused() && !command.allowed_while_paused() {
        return Err(CommandRejection::Paused);
    }
    match command {
        PlayerCommand::StartGame => start_game(ctx),
        PlayerCommand::SelectClass { class_id } => select_class(ctx, &class_id),
        PlayerCommand::SelectPath { path_id } => select_path(ctx, &path_id),
        PlayerCommand::SelectAbility { ability_id } => select_ability(ctx, &ability_id),
        PlayerCommand::SelectSubpath { subpath_id } => select_subpath(ctx, &subpath_id),
        PlayerCommand::ActivatePower { power_id } => activate_power(ctx, &power_id),
        PlayerCommand::SwitchStance { stance_id } => switch_stance(ctx, &stance_id),
        PlayerCommand::PurchaseItem { item_id } => purchase_item(ctx, &item_id),
        PlayerCommand::EnhanceItem { item_id } => enhance_item(ctx, &item_id),
        PlayerCommand::SetSpeed { speed } => set_speed(ctx, speed),
        PlayerCommand::TogglePause => toggle_pause(ctx),
        PlayerCommand::DismissPopup => dismiss_popup(ctx),
        PlayerCommand::AdvanceFloor => advance_floor(ctx),
        PlayerCommand::Retry => retry(ctx),
        PlayerCommand::GoToShop => go_to_shop(ctx),
        PlayerCommand::LeaveShop => leave_shop(ctx),
        PlayerCommand::Abandon => abandon(ctx),
    }
}

fn require_phase(ctx: &SimContext, allowed: &[GamePhase]) -> Handled {
    let phase = ctx.phase();
    if allowed.contains(&phase) {
        Ok(())
    } else {
        Err(CommandRejection::WrongPhase(phase))
    }
}

fn require_player(ctx: &SimContext) -> Result<Entity, CommandRejection> {
    ctx.player
        .filter(|p| ctx.world.contains(*p))
        .ok_or(CommandRejection::NoPlayer)
}

fn level_of(ctx: &SimContext, player: Entity) -> u32 {
    store::read::<Progress>(&ctx.world, player)
        .map(|p| p.level)
        .unwrap_or(1)
}

fn gold_of(ctx: &SimContext, player: Entity) -> u32 {
    store::read::<Progress>(&ctx.world, player)
        .map(|p| p.gold)
        .unwrap_or(0)
}

fn remove_popup(ctx: &mut SimContext, matches: impl Fn(&Popup) -> bool) {
    if let Some(mut gs) = ctx.game_state_mut() {
        gs.popups.retain(|p| !matches(p));
    }
}

// --- Run lifecycle ---

fn start_game(ctx: &mut SimContext) -> Handled {
    require_phase(ctx, &[GamePhase::Menu])?;
    ctx.set_phase(GamePhase::ClassSelect);
    info!("class selection");
    Ok(())
}

fn select_class(ctx: &mut SimContext, class_id: &str) -> Handled {
    require_phase(ctx, &[GamePhase::ClassSelect])?;
    let catalog = ctx.catalog.clone();
    let class = catalog
        .class(class_id)
        .ok_or_else(|| CommandRejection::UnknownId(class_id.to_string()))?;

    if let Some(enemy) = ctx.enemy.take() {
        let _ = ctx.world.despawn(enemy);
    }
    let player = world_setup::setup_player(&mut ctx.world, class, &ctx.dev, ctx.player);
    ctx.player = Some(player);

    let floor = ctx.dev.starting_floor();
    if let Some(mut gs) = ctx.game_state_mut() {
        gs.phase = GamePhase::Combat;
        gs.floor = floor;
        gs.room = 0;
        gs.combat_stage = CombatStage::Idle;
        gs.popups.clear();
    }
    ctx.triggers.clear();
    ctx.pending_attacks.clear();
    ctx.pending_casts.clear();
    ctx.schedule.clear();
    ctx.schedule.schedule_spawn(FIRST_SPAWN_DELAY_MS);

    ctx.log(
        LogCategory::System,
        format!("You descend into the dungeon as a {}.", class.name),
    );
    info!(class = %class.id, floor, "run started");
    Ok(())
}

/// Restore the player and restart combat at room 0 of `floor`.
fn begin_floor(ctx: &mut SimContext, floor: u32) -> Handled {
    let player = require_player(ctx)?;
    world_setup::restore_player(&mut ctx.world, player);
    if let Ok((health, passives)) =
        ctx.world
            .query_one_mut::<(&Health, &mut PassiveEffectState)>(player)
    {
        compute::update_conditional(&mut passives.computed, health.current, health.max);
    }
    flow::leave_room(ctx);
    ctx.triggers.clear();
    ctx.schedule.clear();
    if let Some(mut gs) = ctx.game_state_mut() {
        gs.phase = GamePhase::Combat;
        gs.floor = floor;
        gs.room = 0;
    }
    ctx.schedule.schedule_spawn(FIRST_SPAWN_DELAY_MS);
    ctx.log(LogCategory::System, format!("Floor {floor} begins."));
    info!(floor, "floor started");
    Ok(())
}

fn current_floor(ctx: &SimContext) -> u32 {
    ctx.game_state().map(|gs| gs.floor).unwrap_or(1)
}

fn advance_floor(ctx: &mut SimContext) -> Handled {
    require_phase(ctx, &[GamePhase::FloorComplete])?;
    begin_floor(ctx, current_floor(ctx) + 1)
}

fn retry(ctx: &mut SimContext) -> Handled {
    require_phase(ctx, &[GamePhase::Defeat])?;
    begin_floor(ctx, current_floor(ctx))
}

fn go_to_shop(ctx: &mut SimContext) -> Handled {
    require_phase(ctx, &[GamePhase::FloorComplete])?;
    ctx.set_phase(GamePhase::Shop);
    info!(floor = current_floor(ctx), "entered shop");
    Ok(())
}

fn leave_shop(ctx: &mut SimContext) -> Handled {
    require_phase(ctx, &[GamePhase::Shop])?;
    begin_floor(ctx, current_floor(ctx) + 1)
}

fn abandon(ctx: &mut SimContext) -> Handled {
    require_phase(
        ctx,
        &[
            GamePhase::Defeat,
            GamePhase::FloorComplete,
            GamePhase::Shop,
            GamePhase::Victory,
        ],
    )?;
    flow::leave_room(ctx);
    ctx.schedule.clear();
    ctx.triggers.clear();
    if let Some(mut gs) = ctx.game_state_mut() {
        gs.phase = GamePhase::Menu;
        gs.popups.clear();
    }
    info!("run abandoned");
    Ok(())
}

// --- Progression choices ---

fn select_path(ctx: &mut SimContext, path_id: &str) -> Handled {
    let player = require_player(ctx)?;
    if level_of(ctx, player) < PATH_UNLOCK_LEVEL {
        return Err(CommandRejection::Requirement("level too low for a path"));
    }
    if store::read::<Path>(&ctx.world, player).is_some() {
        return Err(CommandRejection::Requirement("path already chosen"));
    }
    let catalog = ctx.catalog.clone();
    let path = catalog
        .path(path_id)
        .ok_or_else(|| CommandRejection::UnknownId(path_id.to_string()))?;
    let class_id = store::read::<Player>(&ctx.world, player)
        .map(|p| p.class_id)
        .unwrap_or_default();
    if path.class_id != class_id {
        return Err(CommandRejection::NotOffered(path_id.to_string()));
    }

    let _ = ctx.world.insert_one(
        player,
        Path {
            path_id: path.id.clone(),
            ..Path::default()
        },
    );
    match path.kind {
        PathKind::Active => {
            let resource = path
                .resource
                .as_ref()
                .map(|r| PathResource {
                    kind: r.kind,
                    current: 0,
                    max: r.max.max(0),
                    generation: r.generation.clone(),
                })
                .unwrap_or_default();
            let _ = ctx.world.insert_one(player, resource);
        }
        PathKind::Stance => {
            let state = StanceState {
                available: path.stances.clone(),
                active: path.stances.first().cloned().unwrap_or_default(),
                enhancements: Vec::new(),
                switch_cooldown_ms: 0.0,
            };
            let _ = ctx.world.insert_one(player, state);
            stance::recompute_passives(&mut ctx.world, &catalog, player);
        }
    }

    remove_popup(ctx, |p| matches!(p, Popup::PathSelection { .. }));
    ctx.log(LogCategory::Ability, format!("You walk the path of the {}.", path.name));
    info!(path = %path.id, kind = ?path.kind, "path selected");

    progression::offer_progression(ctx, player);
    Ok(())
}

fn select_ability(ctx: &mut SimContext, ability_id: &str) -> Handled {
    let player = require_player(ctx)?;
    let offered = ctx
        .game_state()
        .map(|gs| {
            gs.popups.iter().any(|p| match p {
                Popup::AbilityChoice { options } => options.iter().any(|o| o == ability_id),
                _ => false,
            })
        })
        .unwrap_or(false);
    if !offered {
        return Err(CommandRejection::NotOffered(ability_id.to_string()));
    }
    let path = store::read::<Path>(&ctx.world, player)
        .ok_or(CommandRejection::Requirement("no path chosen"))?;
    let catalog = ctx.catalog.clone();
    let kind = catalog
        .path(&path.path_id)
        .map(|p| p.kind)
        .ok_or_else(|| CommandRejection::UnknownId(path.path_id.clone()))?;

    let name = match kind {
        PathKind::Active => {
            let def = catalog
                .path_ability(ability_id)
                .ok_or_else(|| CommandRejection::UnknownId(ability_id.to_string()))?;
            if let Ok(mut path) = ctx.world.get::<&mut Path>(player) {
                if !path.abilities.iter().any(|a| a == ability_id) {
                    path.abilities.push(def.id.clone());
                }
            }
            def.name.clone()
        }
        PathKind::Stance => {
            let def = catalog
                .enhancement(ability_id)
                .ok_or_else(|| CommandRejection::UnknownId(ability_id.to_string()))?;
            if let Ok(mut stance) = ctx.world.get::<&mut StanceState>(player) {
                if !stance.enhancements.iter().any(|e| e == ability_id) {
                    stance.enhancements.push(def.id.clone());
                }
            }
            stance::recompute_passives(&mut ctx.world, &catalog, player);
            def.name.clone()
        }
    };

    remove_popup(ctx, |p| matches!(p, Popup::AbilityChoice { .. }));
    ctx.log(LogCategory::Ability, format!("Learned {name}."));
    info!(ability = %ability_id, "ability acquired");
    Ok(())
}

fn select_subpath(ctx: &mut SimContext, subpath_id: &str) -> Handled {
    let player = require_player(ctx)?;
    if level_of(ctx, player) < SUBPATH_UNLOCK_LEVEL {
        return Err(CommandRejection::Requirement("level too low for a subpath"));
    }
    let path = store::read::<Path>(&ctx.world, player)
        .ok_or(CommandRejection::Requirement("no path chosen"))?;
    if path.subpath_id.is_some() {
        return Err(CommandRejection::Requirement("subpath already chosen"));
    }
    let catalog = ctx.catalog.clone();
    let subpath = catalog
        .path(&path.path_id)
        .and_then(|p| p.subpath(subpath_id))
        .ok_or_else(|| CommandRejection::UnknownId(subpath_id.to_string()))?;

    if let Ok(mut path) = ctx.world.get::<&mut Path>(player) {
        path.subpath_id = Some(subpath.id.clone());
    }
    vitals::apply_stat_bonus(&mut ctx.world, player, &subpath.bonus);

    remove_popup(ctx, |p| matches!(p, Popup::SubpathSelection { .. }));
    ctx.log(LogCategory::Ability, format!("You specialise as a {}.", subpath.name));
    info!(subpath = %subpath.id, "subpath selected");
    Ok(())
}

// --- Combat actions ---

fn activate_power(ctx: &mut SimContext, power_id: &str) -> Handled {
    require_phase(ctx, &[GamePhase::Combat])?;
    let player = require_player(ctx)?;
    if !store::is_alive(&ctx.world, player) {
        return Err(CommandRejection::PlayerDown);
    }
    let known = store::read::<KnownPowers>(&ctx.world, player)
        .map(|k| k.0.iter().any(|p| p == power_id))
        .unwrap_or(false);
    if !known || ctx.catalog.power(power_id).is_none() {
        return Err(CommandRejection::UnknownId(power_id.to_string()));
    }
    let cooling = store::read::<Cooldowns>(&ctx.world, player)
        .and_then(|c| c.0.get(power_id).map(|cd| cd.remaining_ms > 0.0))
        .unwrap_or(false);
    let queued = ctx
        .pending_casts
        .iter()
        .any(|c| c.caster == player && c.power_id == power_id);
    if cooling || queued {
        return Err(CommandRejection::OnCooldown(power_id.to_string()));
    }

    ctx.pending_casts.push(PendingCast {
        caster: player,
        power_id: power_id.to_string(),
    });
    Ok(())
}

fn switch_stance(ctx: &mut SimContext, stance_id: &str) -> Handled {
    let player = require_player(ctx)?;
    let state = store::read::<StanceState>(&ctx.world, player)
        .ok_or(CommandRejection::Requirement("no stance path"))?;
    if !state.available.iter().any(|s| s == stance_id) {
        return Err(CommandRejection::NotOffered(stance_id.to_string()));
    }
    if state.active == stance_id {
        return Err(CommandRejection::Requirement("stance already active"));
    }
    if state.switch_cooldown_ms > 0.0 {
        return Err(CommandRejection::OnCooldown(stance_id.to_string()));
    }

    if let Ok(mut s) = ctx.world.get::<&mut StanceState>(player) {
        s.active = stance_id.to_string();
        s.switch_cooldown_ms = STANCE_SWITCH_COOLDOWN_MS;
    }
    let catalog = ctx.catalog.clone();
    stance::recompute_passives(&mut ctx.world, &catalog, player);

    let name = catalog
        .stance(stance_id)
        .map(|s| s.name.clone())
        .unwrap_or_else(|| stance_id.to_string());
    ctx.log(LogCategory::Ability, format!("You shift into {name}."));
    Ok(())
}

// --- Shop ---

fn pay(ctx: &mut SimContext, player: Entity, cost: u32) -> Handled {
    let have = gold_of(ctx, player);
    if have < cost {
        return Err(CommandRejection::InsufficientFunds { need: cost, have });
    }
    if let Ok(mut progress) = ctx.world.get::<&mut Progress>(player) {
        progress.gold -= cost;
    }
    Ok(())
}

fn purchase_item(ctx: &mut SimContext, item_id: &str) -> Handled {
    require_phase(ctx, &[GamePhase::Shop])?;
    let player = require_player(ctx)?;
    let catalog = ctx.catalog.clone();
    let item = catalog
        .item(item_id)
        .ok_or_else(|| CommandRejection::UnknownId(item_id.to_string()))?;
    let owned = store::read::<Inventory>(&ctx.world, player)
        .map(|inv| inv.items.contains_key(item_id))
        .unwrap_or(false);
    if owned {
        return Err(CommandRejection::Requirement("item already owned"));
    }

    pay(ctx, player, item.cost)?;
    if let Ok(mut inv) = ctx.world.get::<&mut Inventory>(player) {
        inv.items.insert(item.id.clone(), 1);
    }
    vitals::apply_stat_bonus(&mut ctx.world, player, &item.bonus);

    ctx.log(
        LogCategory::Reward,
        format!("Purchased {} for {} gold.", item.name, item.cost),
    );
    info!(item = %item.id, cost = item.cost, "item purchased");
    Ok(())
}

fn enhance_item(ctx: &mut SimContext, item_id: &str) -> Handled {
    require_phase(ctx, &[GamePhase::Shop])?;
    let player = require_player(ctx)?;
    let catalog = ctx.catalog.clone();
    let item = catalog
        .item(item_id)
        .ok_or_else(|| CommandRejection::UnknownId(item_id.to_string()))?;
    let level = store::read::<Inventory>(&ctx.world, player)
        .and_then(|inv| inv.items.get(item_id).copied())
        .ok_or(CommandRejection::Requirement("item not owned"))?;
    if level >= item.max_level {
        return Err(CommandRejection::Requirement("item at max level"));
    }

    let cost = item.enhance_cost.saturating_mul(level);
    pay(ctx, player, cost)?;
    if let Ok(mut inv) = ctx.world.get::<&mut Inventory>(player) {
        inv.items.insert(item.id.clone(), level + 1);
    }
    vitals::apply_stat_bonus(&mut ctx.world, player, &item.bonus);

    ctx.log(
        LogCategory::Reward,
        format!("Enhanced {} to +{} for {cost} gold.", item.name, level + 1),
    );
    info!(item = %item.id, level = level + 1, cost, "item enhanced");
    Ok(())
}

// --- UI ---

fn set_speed(ctx: &mut SimContext, speed: f64) -> Handled {
    if !GAME_SPEEDS.contains(&speed) {
        return Err(CommandRejection::InvalidValue(format!("speed {speed}")));
    }
    if let Some(mut gs) = ctx.game_state_mut() {
        gs.speed = speed;
    }
    ctx.dt_ms = effective_delta_ms(speed);
    Ok(())
}

fn toggle_pause(ctx: &mut SimContext) -> Handled {
    let paused = {
        let Some(mut gs) = ctx.game_state_mut() else {
            return Ok(());
        };
        gs.paused = !gs.paused;
        gs.paused
    };
    info!(paused, "pause toggled");
    Ok(())
}

fn dismiss_popup(ctx: &mut SimContext) -> Handled {
    let Some(mut gs) = ctx.game_state_mut() else {
        return Ok(());
    };
    if gs.popups.is_empty() {
        return Err(CommandRejection::Requirement("no popup to dismiss"));
    }
    gs.popups.remove(0);
    Ok(())
}
