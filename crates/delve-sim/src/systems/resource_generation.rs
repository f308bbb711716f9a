//! Resource generation system: converts this tick's triggers into path
//! resource for active (non-default) path resources.

use delve_core::components::PathResource;
use delve_core::enums::PathResourceKind;
use delve_core::events::LogCategory;
use tracing::trace;

use crate::context::SimContext;
use crate::store;

pub fn run(ctx: &mut SimContext) {
    let Some(player) = ctx.player else {
        return;
    };
    if ctx.triggers.is_empty() || !store::is_alive(&ctx.world, player) {
        return;
    }

    let gained = {
        let Ok(mut resource) = ctx.world.get::<&mut PathResource>(player) else {
            return;
        };
        if resource.kind == PathResourceKind::Default {
            return;
        }
        let amount: i32 = ctx
            .triggers
            .iter()
            .filter_map(|t| resource.generation.get(&t.trigger).copied())
            .filter(|amount| *amount != 0)
            .sum();
        if amount == 0 {
            return;
        }
        let before = resource.current;
        resource.current = (resource.current + amount).clamp(0, resource.max.max(0));
        (resource.current - before, resource.kind)
    };

    let (amount, kind) = gained;
    if amount != 0 {
        trace!(amount, ?kind, "path resource generated");
        ctx.log(LogCategory::Ability, format!("{amount:+} {kind:?}"));
    }
}
