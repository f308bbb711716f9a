//! Simulation engine for DELVE.
//!
//! Owns the hecs ECS world, runs systems at a fixed tick rate,
//! and produces GameStateSnapshots for the frontend.

pub mod context;
pub mod engine;
pub mod game_loop;
pub mod handlers;
pub mod progression;
pub mod schedule;
pub mod stance;
pub mod store;
pub mod systems;
pub mod vitals;
pub mod world_setup;

pub use delve_core as core;
pub use engine::{SimConfig, SimulationEngine};
pub use game_loop::GameLoop;
