//! Passive effect system: per-tick conditional bonuses, health regeneration
//! and continuous aura damage.
//!
//! Aggregation itself happens only on stance switch or enhancement
//! acquisition (see `stance::recompute_passives`).

use delve_core::components::*;
use delve_core::enums::*;
use delve_core::events::{LogCategory, TriggerPayload};

use delve_passives::compute;

use crate::context::SimContext;
use crate::store;
use crate::vitals;

pub fn run(ctx: &mut SimContext) {
    let Some(player) = ctx.player else {
        return;
    };
    if !store::is_alive(&ctx.world, player) {
        return;
    }
    let dt_secs = ctx.dt_secs();

    // Conditional update and regeneration.
    let (aura_per_sec, regen) = {
        let Ok((health, passives)) = ctx
            .world
            .query_one_mut::<(&mut Health, &mut PassiveEffectState)>(player)
        else {
            return;
        };
        compute::update_conditional(&mut passives.computed, health.current, health.max);

        let per_sec = compute::regen_per_sec(&passives.computed, health.max);
        let mut regen = 0;
        if per_sec > 0.0 {
            passives.combat.regen_carry += per_sec * dt_secs;
            regen = passives.combat.regen_carry.floor() as i32;
            passives.combat.regen_carry -= regen as f64;
        }
        (passives.computed.aura_damage_per_sec, regen)
    };

    if regen > 0 {
        vitals::heal(&mut ctx.world, player, regen);
    }

    if aura_per_sec <= 0.0 {
        return;
    }
    let Some(enemy) = ctx.enemy else {
        return;
    };
    if !store::is_alive(&ctx.world, enemy) {
        return;
    }
    let damage = (aura_per_sec * dt_secs).round() as i32;
    if damage <= 0 {
        return;
    }
    let outcome = vitals::apply_direct_damage(&mut ctx.world, enemy, damage);
    if outcome.killed {
        let name = ctx.name_of(enemy);
        ctx.log(LogCategory::Damage, format!("{name} withers away in your aura."));
        ctx.record(
            Trigger::OnKill,
            TriggerPayload {
                damage: outcome.to_health,
                is_crit: false,
            },
        );
    }
}
