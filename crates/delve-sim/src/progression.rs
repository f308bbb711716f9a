//! XP, level-ups and progression popups.

use hecs::Entity;
use rand::seq::SliceRandom;
use tracing::info;

use delve_core::catalog::PathKind;
use delve_core::components::*;
use delve_core::constants::*;
use delve_core::events::{AnimationKind, LogCategory};

use crate::context::SimContext;

/// XP required to go from `level` to `level + 1`.
pub fn xp_to_next(level: u32) -> u32 {
    let exponent = level.saturating_sub(1).min(60) as i32;
    (BASE_XP_TO_LEVEL as f64 * XP_GROWTH.powi(exponent)).round() as u32
}

/// Grant XP to the player, resolving any number of level-ups.
pub fn grant_xp(ctx: &mut SimContext, player: Entity, xp: u32) {
    let mut levels_gained = Vec::new();
    {
        let Ok(mut progress) = ctx.world.get::<&mut Progress>(player) else {
            return;
        };
        progress.xp = progress.xp.saturating_add(xp);
        while progress.xp_to_next > 0 && progress.xp >= progress.xp_to_next {
            progress.xp -= progress.xp_to_next;
            progress.level += 1;
            progress.xp_to_next = xp_to_next(progress.level);
            levels_gained.push(progress.level);
        }
    }

    for level in levels_gained {
        level_up(ctx, player, level);
    }
}

fn level_up(ctx: &mut SimContext, player: Entity, level: u32) {
    if let Ok(mut health) = ctx.world.get::<&mut Health>(player) {
        health.max += LEVEL_UP_MAX_HEALTH;
        health.current = health.max;
    }
    if let Ok(mut attack) = ctx.world.get::<&mut Attack>(player) {
        attack.base_damage += LEVEL_UP_ATTACK;
    }
    if let Ok(mut defense) = ctx.world.get::<&mut Defense>(player) {
        defense.value += LEVEL_UP_DEFENSE;
    }

    ctx.push_popup(Popup::LevelUp { level });
    ctx.emit(AnimationKind::LevelUp { level });
    ctx.log(LogCategory::Reward, format!("Level up! You are now level {level}."));
    info!(level, "player levelled up");

    offer_progression(ctx, player);
}

/// Push whatever selection popups the player is now entitled to:
/// path selection, ability choice, subpath selection.
pub fn offer_progression(ctx: &mut SimContext, player: Entity) {
    let Some(level) = ctx.world.get::<&Progress>(player).ok().map(|p| p.level) else {
        return;
    };
    let path = ctx.world.get::<&Path>(player).ok().map(|p| (*p).clone());

    match path {
        None => {
            if level >= PATH_UNLOCK_LEVEL && !has_popup(ctx, PopupKind::Path) {
                let class_id = ctx
                    .world
                    .get::<&Player>(player)
                    .map(|p| p.class_id.clone())
                    .unwrap_or_default();
                let options = ctx
                    .catalog
                    .class(&class_id)
                    .map(|c| c.paths.clone())
                    .unwrap_or_default();
                if !options.is_empty() {
                    ctx.push_popup(Popup::PathSelection { options });
                }
            }
        }
        Some(path) => {
            offer_abilities(ctx, player);
            if level >= SUBPATH_UNLOCK_LEVEL
                && path.subpath_id.is_none()
                && !has_popup(ctx, PopupKind::Subpath)
            {
                let options: Vec<String> = ctx
                    .catalog
                    .path(&path.path_id)
                    .map(|p| p.subpaths.iter().map(|s| s.id.clone()).collect())
                    .unwrap_or_default();
                if !options.is_empty() {
                    ctx.push_popup(Popup::SubpathSelection { options });
                }
            }
        }
    }
}

/// Offer up to `ABILITY_CHOICES` random not-yet-owned abilities (active path)
/// or enhancements (stance path). No popup when the pool is exhausted.
pub fn offer_abilities(ctx: &mut SimContext, player: Entity) {
    let pool = available_pool(ctx, player);
    if pool.is_empty() {
        return;
    }
    let options: Vec<String> = pool
        .choose_multiple(&mut ctx.rng, ABILITY_CHOICES)
        .cloned()
        .collect();
    ctx.push_popup(Popup::AbilityChoice { options });
}

/// Pool ids the player does not own yet, in catalog order.
pub fn available_pool(ctx: &SimContext, player: Entity) -> Vec<String> {
    let Some(path) = ctx.world.get::<&Path>(player).ok().map(|p| (*p).clone()) else {
        return Vec::new();
    };
    let Some(def) = ctx.catalog.path(&path.path_id) else {
        return Vec::new();
    };

    let mut owned: Vec<String> = path.abilities.clone();
    if def.kind == PathKind::Stance {
        if let Ok(stance) = ctx.world.get::<&StanceState>(player) {
            owned.extend(stance.enhancements.iter().cloned());
        }
    }

    let subpath_pool = path
        .subpath_id
        .as_deref()
        .and_then(|id| def.subpath(id))
        .map(|s| s.abilities.clone())
        .unwrap_or_default();

    def.abilities
        .iter()
        .chain(subpath_pool.iter())
        .filter(|id| !owned.contains(id))
        .cloned()
        .collect()
}

#[derive(Clone, Copy)]
enum PopupKind {
    Path,
    Subpath,
}

fn has_popup(ctx: &SimContext, kind: PopupKind) -> bool {
    ctx.game_state()
        .map(|gs| {
            gs.popups.iter().any(|p| match kind {
                PopupKind::Path => matches!(p, Popup::PathSelection { .. }),
                PopupKind::Subpath => matches!(p, Popup::SubpathSelection { .. }),
            })
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xp_curve_grows() {
        assert_eq!(xp_to_next(1), 100);
        assert_eq!(xp_to_next(2), 150);
        assert_eq!(xp_to_next(3), 225);
        assert_eq!(xp_to_next(0), 100);
    }
}
