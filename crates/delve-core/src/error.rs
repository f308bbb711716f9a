//! Error types.

use thiserror::Error;

use crate::enums::GamePhase;

/// Static catalog failed to load or validate.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog JSON is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate {table} id `{id}`")]
    DuplicateId { table: &'static str, id: String },
    #[error("{table} table is empty")]
    EmptyTable { table: &'static str },
    #[error("{owner} references unknown {table} id `{id}`")]
    UnknownReference {
        owner: String,
        table: &'static str,
        id: String,
    },
}

/// Why a command had no effect. Never surfaced to the player.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandRejection {
    #[error("not valid in phase {0:?}")]
    WrongPhase(GamePhase),
    #[error("game is paused")]
    Paused,
    #[error("no player entity")]
    NoPlayer,
    #[error("player is dead or dying")]
    PlayerDown,
    #[error("unknown id `{0}`")]
    UnknownId(String),
    #[error("`{0}` was not offered")]
    NotOffered(String),
    #[error("requirement not met: {0}")]
    Requirement(&'static str),
    #[error("not enough gold: need {need}, have {have}")]
    InsufficientFunds { need: u32, have: u32 },
    #[error("`{0}` is on cooldown")]
    OnCooldown(String),
    #[error("invalid value: {0}")]
    InvalidValue(String),
}
