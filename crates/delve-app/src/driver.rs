//! Driver thread: runs the game loop in real time and publishes snapshots.
//!
//! The engine is created inside this thread so it is owned by exactly one
//! thread. Commands arrive via an `mpsc` channel. The latest frame snapshot
//! is stored in shared state for polling.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{error, info};

use delve_core::state::GameStateSnapshot;
use delve_sim::engine::{SimConfig, SimulationEngine};
use delve_sim::game_loop::GameLoop;

use crate::state::DriverCommand;

/// Target duration of one rendered frame (~60 fps).
const FRAME_DURATION: Duration = Duration::from_micros(16_667);

/// Spawns the driver in a new thread.
///
/// Returns the command sender and the thread handle.
pub fn spawn_driver(
    config: SimConfig,
    latest_snapshot: Arc<Mutex<Option<GameStateSnapshot>>>,
) -> std::io::Result<(mpsc::Sender<DriverCommand>, JoinHandle<()>)> {
    let (cmd_tx, cmd_rx) = mpsc::channel::<DriverCommand>();

    let handle = std::thread::Builder::new()
        .name("delve-game-loop".into())
        .spawn(move || match SimulationEngine::new(config) {
            Ok(engine) => run_driver(engine, cmd_rx, &latest_snapshot),
            Err(e) => error!(error = %e, "failed to load catalog"),
        })?;

    Ok((cmd_tx, handle))
}

/// The driver loop. Runs until Shutdown or channel disconnect.
fn run_driver(
    engine: SimulationEngine,
    cmd_rx: mpsc::Receiver<DriverCommand>,
    latest_snapshot: &Mutex<Option<GameStateSnapshot>>,
) {
    let mut game_loop = GameLoop::new(engine);
    game_loop.start();
    info!("driver started");

    let mut last_frame = Instant::now();
    let mut next_frame = last_frame + FRAME_DURATION;

    loop {
        // 1. Drain all pending commands
        loop {
            match cmd_rx.try_recv() {
                Ok(DriverCommand::Player(cmd)) => game_loop.send(cmd),
                Ok(DriverCommand::Shutdown) | Err(mpsc::TryRecvError::Disconnected) => {
                    game_loop.stop();
                    info!("driver stopped");
                    return;
                }
                Err(mpsc::TryRecvError::Empty) => break,
            }
        }

        // 2. Run this frame's ticks
        let now = Instant::now();
        let wall_delta_ms = now.duration_since(last_frame).as_secs_f64() * 1000.0;
        last_frame = now;
        let Some(snapshot) = game_loop.frame(wall_delta_ms) else {
            return;
        };

        // 3. Publish for polling
        if let Ok(mut lock) = latest_snapshot.lock() {
            *lock = Some(snapshot);
        }

        // 4. Sleep until the next frame
        let now = Instant::now();
        if next_frame > now {
            std::thread::sleep(next_frame - now);
            next_frame += FRAME_DURATION;
        } else {
            // Behind schedule; the accumulator cap bounds the catch-up.
            next_frame = now + FRAME_DURATION;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delve_core::commands::PlayerCommand;
    use delve_core::enums::GamePhase;

    #[test]
    fn test_command_channel_round_trip() {
        let (tx, rx) = mpsc::channel::<DriverCommand>();

        tx.send(DriverCommand::Player(PlayerCommand::StartGame))
            .unwrap();
        tx.send(DriverCommand::Player(PlayerCommand::TogglePause))
            .unwrap();
        tx.send(DriverCommand::Shutdown).unwrap();

        let commands: Vec<_> = rx.try_iter().collect();
        assert_eq!(commands.len(), 3);
        assert!(matches!(
            commands[0],
            DriverCommand::Player(PlayerCommand::StartGame)
        ));
        assert!(matches!(
            commands[1],
            DriverCommand::Player(PlayerCommand::TogglePause)
        ));
        assert!(matches!(commands[2], DriverCommand::Shutdown));
    }

    #[test]
    fn test_driver_applies_commands_and_shuts_down() {
        let latest = Arc::new(Mutex::new(None));
        let (tx, handle) = spawn_driver(SimConfig::default(), latest.clone()).unwrap();
        tx.send(DriverCommand::Player(PlayerCommand::StartGame))
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut phase = GamePhase::Menu;
        while Instant::now() < deadline {
            if let Some(snapshot) = latest.lock().unwrap().as_ref() {
                phase = snapshot.phase;
                if phase == GamePhase::ClassSelect {
                    break;
                }
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(phase, GamePhase::ClassSelect);

        tx.send(DriverCommand::Shutdown).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_snapshot_serialization_is_small_at_start() {
        let mut engine = SimulationEngine::new(SimConfig::default()).unwrap();
        engine.queue_command(PlayerCommand::StartGame);
        engine.tick();
        let json = serde_json::to_string(&engine.snapshot()).unwrap();
        assert!(json.len() < 2048, "snapshot was {} bytes", json.len());
    }
}
