//! Player commands sent from the frontend to the simulation.
//!
//! Commands are queued and drained once at the start of the next tick.

use serde::{Deserialize, Serialize};

/// All possible player actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerCommand {
    // --- Run setup ---
    /// Leave the main menu for class selection.
    StartGame,
    /// Create (or re-initialise) the player from a class definition.
    SelectClass { class_id: String },

    // --- Progression ---
    SelectPath { path_id: String },
    /// Pick one of the offered abilities (active path) or enhancements (stance path).
    SelectAbility { ability_id: String },
    SelectSubpath { subpath_id: String },

    // --- Combat ---
    ActivatePower { power_id: String },
    SwitchStance { stance_id: String },

    // --- Shop ---
    PurchaseItem { item_id: String },
    EnhanceItem { item_id: String },

    // --- Simulation control ---
    /// Set game speed (1, 2 or 3).
    SetSpeed { speed: f64 },
    TogglePause,
    /// Dismiss the front popup.
    DismissPopup,

    // --- Room / floor flow ---
    AdvanceFloor,
    Retry,
    GoToShop,
    LeaveShop,
    /// Give up the run and return to the main menu.
    Abandon,
}

impl PlayerCommand {
    /// Whether the command may be handled while the game is paused.
    pub fn allowed_while_paused(&self) -> bool {
        !matches!(
            self,
            PlayerCommand::ActivatePower { .. } | PlayerCommand::SwitchStance { .. }
        )
    }

    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            PlayerCommand::StartGame => "StartGame",
            PlayerCommand::SelectClass { .. } => "SelectClass",
            PlayerCommand::SelectPath { .. } => "SelectPath",
            PlayerCommand::SelectAbility { .. } => "SelectAbility",
            PlayerCommand::SelectSubpath { .. } => "SelectSubpath",
            PlayerCommand::ActivatePower { .. } => "ActivatePower",
            PlayerCommand::SwitchStance { .. } => "SwitchStance",
            PlayerCommand::PurchaseItem { .. } => "PurchaseItem",
            PlayerCommand::EnhanceItem { .. } => "EnhanceItem",
            PlayerCommand::SetSpeed { .. } => "SetSpeed",
            PlayerCommand::TogglePause => "TogglePause",
            PlayerCommand::DismissPopup => "DismissPopup",
            PlayerCommand::AdvanceFloor => "AdvanceFloor",
            PlayerCommand::Retry => "Retry",
            PlayerCommand::GoToShop => "GoToShop",
            PlayerCommand::LeaveShop => "LeaveShop",
            PlayerCommand::Abandon => "Abandon",
        }
    }
}
