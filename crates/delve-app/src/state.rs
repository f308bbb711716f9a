//! Application state shared between the host thread and the driver thread.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use delve_core::commands::PlayerCommand;
use delve_core::state::GameStateSnapshot;

/// Commands sent from the host to the driver thread.
#[derive(Debug)]
pub enum DriverCommand {
    /// A player command to forward to the simulation engine.
    Player(PlayerCommand),
    /// Shut down the driver thread gracefully.
    Shutdown,
}

/// Shared application state.
///
/// - `command_tx` is `None` until the driver is started
/// - `latest_snapshot` is written by the driver after every frame
pub struct AppState {
    pub command_tx: Mutex<Option<mpsc::Sender<DriverCommand>>>,
    pub latest_snapshot: Arc<Mutex<Option<GameStateSnapshot>>>,
    pub running: Mutex<bool>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            command_tx: Mutex::new(None),
            latest_snapshot: Arc::new(Mutex::new(None)),
            running: Mutex::new(false),
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward a player command to the driver.
    pub fn send(&self, command: PlayerCommand) -> Result<(), String> {
        let tx_lock = self.command_tx.lock().map_err(|e| e.to_string())?;
        match tx_lock.as_ref() {
            Some(tx) => tx
                .send(DriverCommand::Player(command))
                .map_err(|e| format!("Failed to send command: {}", e)),
            None => Err("Driver not started".into()),
        }
    }

    /// Latest published snapshot, if any frame has run yet.
    pub fn snapshot(&self) -> Option<GameStateSnapshot> {
        self.latest_snapshot
            .lock()
            .ok()
            .and_then(|lock| lock.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_creation() {
        let state = AppState::new();
        assert!(state.command_tx.lock().unwrap().is_none());
        assert!(state.latest_snapshot.lock().unwrap().is_none());
        assert!(!*state.running.lock().unwrap());
    }

    #[test]
    fn test_send_before_start_fails() {
        let state = AppState::new();
        assert!(state.send(PlayerCommand::StartGame).is_err());
        assert!(state.snapshot().is_none());
    }
}
