//! ECS systems that operate on the simulation context each tick.
//!
//! Systems are functions over `&mut SimContext`. They do not own state:
//! everything lives in components or in the context's queues.

pub mod attack_timing;
pub mod cleanup;
pub mod combat;
pub mod death;
pub mod flow;
pub mod passive_effect;
pub mod path_ability;
pub mod power;
pub mod resource_generation;
pub mod snapshot;
pub mod status_effect;
