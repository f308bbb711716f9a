//! Stance and enhancement passives for DELVE.
//!
//! Aggregates stance effects into a flat parameter record and exposes the
//! read-only combat hooks that consume it. No ECS dependency; operates on
//! plain data so the simulation decides where results are applied.

pub mod compute;
pub mod hooks;

pub use delve_core as core;

#[cfg(test)]
mod tests;
