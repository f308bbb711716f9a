//! Fixed-step game loop driven by rendered frames.
//!
//! The host reports wall-clock time per frame; the loop converts it into a
//! whole number of engine ticks and notifies subscribers once per frame.

use tracing::{debug, info};

use delve_core::commands::PlayerCommand;
use delve_core::constants::{MAX_CATCH_UP_TICKS, TICK_MS};
use delve_core::state::GameStateSnapshot;

use crate::engine::SimulationEngine;

/// Frame callback, invoked after all ticks of a frame.
pub type Subscriber = Box<dyn FnMut(&GameStateSnapshot) + Send>;

pub struct GameLoop {
    engine: SimulationEngine,
    accumulator_ms: f64,
    running: bool,
    subscribers: Vec<Subscriber>,
}

impl GameLoop {
    pub fn new(engine: SimulationEngine) -> Self {
        Self {
            engine,
            accumulator_ms: 0.0,
            running: false,
            subscribers: Vec::new(),
        }
    }

    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.accumulator_ms = 0.0;
        info!("game loop started");
    }

    /// Stop ticking; pending accumulated time is discarded.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.accumulator_ms = 0.0;
        info!("game loop stopped");
    }

    /// Stop the loop and reset the engine to the main menu.
    pub fn reset(&mut self) {
        self.stop();
        self.engine.reset();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn subscribe(&mut self, subscriber: Subscriber) {
        self.subscribers.push(subscriber);
    }

    pub fn send(&mut self, command: PlayerCommand) {
        self.engine.queue_command(command);
    }

    pub fn engine(&self) -> &SimulationEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut SimulationEngine {
        &mut self.engine
    }

    /// Advance by one rendered frame of `wall_delta_ms`.
    ///
    /// Runs as many whole ticks as the accumulator holds (bounded by the
    /// catch-up cap), then takes a frame snapshot and hands it to every
    /// subscriber. Returns `None` when the loop is stopped.
    pub fn frame(&mut self, wall_delta_ms: f64) -> Option<GameStateSnapshot> {
        if !self.running {
            return None;
        }

        let cap = TICK_MS * MAX_CATCH_UP_TICKS as f64;
        self.accumulator_ms = (self.accumulator_ms + wall_delta_ms.max(0.0)).min(cap);

        let mut ticks = 0u32;
        while self.accumulator_ms >= TICK_MS {
            self.engine.tick();
            self.accumulator_ms -= TICK_MS;
            ticks += 1;
        }
        if ticks > 1 {
            debug!(ticks, "frame catch-up");
        }

        let snapshot = self.engine.frame_snapshot();
        for subscriber in &mut self.subscribers {
            subscriber(&snapshot);
        }
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SimConfig;
    use std::sync::{Arc, Mutex};

    fn running_loop() -> GameLoop {
        let engine = SimulationEngine::new(SimConfig::default()).unwrap();
        let mut game_loop = GameLoop::new(engine);
        game_loop.start();
        game_loop
    }

    #[test]
    fn stopped_loop_does_not_tick() {
        let engine = SimulationEngine::new(SimConfig::default()).unwrap();
        let mut game_loop = GameLoop::new(engine);
        assert!(game_loop.frame(100.0).is_none());
        assert_eq!(game_loop.engine().time().tick, 0);
    }

    #[test]
    fn whole_ticks_are_carried_between_frames() {
        let mut game_loop = running_loop();
        game_loop.frame(10.0);
        assert_eq!(game_loop.engine().time().tick, 0);
        game_loop.frame(10.0);
        assert_eq!(game_loop.engine().time().tick, 1);
        game_loop.frame(48.0);
        assert_eq!(game_loop.engine().time().tick, 4);
    }

    #[test]
    fn catch_up_is_capped() {
        let mut game_loop = running_loop();
        game_loop.frame(60_000.0);
        assert_eq!(
            game_loop.engine().time().tick,
            MAX_CATCH_UP_TICKS as u64
        );
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let mut game_loop = running_loop();
        game_loop.start();
        game_loop.frame(TICK_MS);
        assert_eq!(game_loop.engine().time().tick, 1);
        game_loop.stop();
        game_loop.stop();
        assert!(!game_loop.is_running());
        game_loop.start();
        assert!(game_loop.is_running());
    }

    #[test]
    fn subscribers_fire_once_per_frame() {
        let mut game_loop = running_loop();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        game_loop.subscribe(Box::new(move |snapshot| {
            sink.lock().unwrap().push(snapshot.tick);
        }));

        game_loop.frame(TICK_MS * 5.0);
        game_loop.frame(0.0);
        assert_eq!(*calls.lock().unwrap(), vec![5, 5]);
    }
}
