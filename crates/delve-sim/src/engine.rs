//! Simulation engine, the core of the game.
//!
//! `SimulationEngine` owns the simulation context (and through it the hecs
//! world), drains player commands, runs all systems in a fixed order, and
//! produces `GameStateSnapshot`s. Completely headless, enabling
//! deterministic testing.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, trace};

use delve_core::catalog::Catalog;
use delve_core::commands::PlayerCommand;
use delve_core::config::DevParams;
use delve_core::enums::GamePhase;
use delve_core::error::CatalogError;
use delve_core::state::GameStateSnapshot;
use delve_core::types::{effective_delta_ms, SimTime};

use crate::context::SimContext;
use crate::handlers;
use crate::systems;

/// Configuration for starting a new simulation.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// RNG seed for determinism. Same seed = same simulation.
    pub seed: u64,
    /// Initial game speed (1.0 = normal).
    pub speed: f64,
    /// Dev-mode overrides.
    pub dev: DevParams,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            speed: 1.0,
            dev: DevParams::default(),
        }
    }
}

/// The simulation engine. Owns the context and the command queue.
pub struct SimulationEngine {
    ctx: SimContext,
    command_queue: VecDeque<PlayerCommand>,
}

impl SimulationEngine {
    /// Create an engine backed by the built-in catalog.
    pub fn new(config: SimConfig) -> Result<Self, CatalogError> {
        let catalog = Catalog::builtin()?;
        Ok(Self::with_catalog(config, Arc::new(catalog)))
    }

    /// Create an engine backed by an already-loaded catalog.
    pub fn with_catalog(config: SimConfig, catalog: Arc<Catalog>) -> Self {
        Self {
            ctx: SimContext::new(catalog, config.dev, config.seed, config.speed),
            command_queue: VecDeque::new(),
        }
    }

    /// Queue a player command for processing at the next tick boundary.
    pub fn queue_command(&mut self, command: PlayerCommand) {
        self.command_queue.push_back(command);
    }

    /// Queue multiple commands.
    pub fn queue_commands(&mut self, commands: impl IntoIterator<Item = PlayerCommand>) {
        self.command_queue.extend(commands);
    }

    /// Advance the simulation by one fixed step.
    ///
    /// Commands always drain. While paused nothing else happens and the
    /// simulation clock stands still.
    pub fn tick(&mut self) {
        self.process_commands();

        if self.ctx.is_paused() {
            return;
        }

        self.run_systems();
        self.ctx.time.advance(self.ctx.dt_ms);

        let speed = self.ctx.game_state().map(|gs| gs.speed).unwrap_or(1.0);
        self.ctx.dt_ms = effective_delta_ms(speed);
    }

    /// Snapshot for a rendered frame. Animation events included here are
    /// marked consumed and will not be delivered again.
    pub fn frame_snapshot(&mut self) -> GameStateSnapshot {
        let snapshot = systems::snapshot::build_snapshot(&self.ctx);
        for event in &mut self.ctx.animations {
            event.consumed = true;
        }
        snapshot
    }

    /// Read-only snapshot; delivers nothing.
    pub fn snapshot(&self) -> GameStateSnapshot {
        systems::snapshot::build_snapshot(&self.ctx)
    }

    /// Discard the current run and return to the main menu.
    pub fn reset(&mut self) {
        self.command_queue.clear();
        self.ctx.reset();
    }

    /// Get the current game phase.
    pub fn phase(&self) -> GamePhase {
        self.ctx.phase()
    }

    /// Get the current simulation time.
    pub fn time(&self) -> SimTime {
        self.ctx.time
    }

    pub fn is_paused(&self) -> bool {
        self.ctx.is_paused()
    }

    /// Read-only access to the simulation context.
    pub fn context(&self) -> &SimContext {
        &self.ctx
    }

    /// Mutable context access for test setup.
    #[cfg(test)]
    pub fn context_mut(&mut self) -> &mut SimContext {
        &mut self.ctx
    }

    /// Override the effective delta of the next tick.
    #[cfg(test)]
    pub fn set_dt_ms(&mut self, dt_ms: f64) {
        self.ctx.dt_ms = dt_ms;
    }

    /// Process all queued commands.
    fn process_commands(&mut self) {
        while let Some(command) = self.command_queue.pop_front() {
            let name = command.name();
            if let Err(reason) = handlers::handle(&mut self.ctx, command) {
                debug!(command = name, %reason, "command rejected");
            }
        }
    }

    /// Run all systems in order.
    fn run_systems(&mut self) {
        let ctx = &mut self.ctx;
        trace!(tick = ctx.time.tick, dt_ms = ctx.dt_ms, "tick");

        if ctx.combat_engaged() {
            // 1. Passive conditionals, regeneration, aura
            systems::passive_effect::run(ctx);
            // 2. Attack timers
            systems::attack_timing::run(ctx);
            // 3. Combat resolution
            systems::combat::run(ctx);
            // 4. Power cooldowns, regen, casts
            systems::power::run(ctx);
            // 5. Statuses, buffs, shields, enemy timers
            systems::status_effect::run(ctx);
            // 6. Path resource generation
            systems::resource_generation::run(ctx);
            // 7. Path abilities
            systems::path_ability::run(ctx);
            // 8. Death
            systems::death::run(ctx);
        }
        // 9. Scheduled transitions and spawns
        systems::flow::run(ctx);
        // 10. Cleanup
        systems::cleanup::run(ctx);
    }
}
