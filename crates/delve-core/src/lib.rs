//! Core types and definitions for the DELVE combat simulation.
//!
//! This crate defines the vocabulary shared across all other crates:
//! components, commands, state snapshots, events, catalog data and constants.
//! It has no dependency on the ECS or any runtime framework.

pub mod catalog;
pub mod commands;
pub mod components;
pub mod config;
pub mod constants;
pub mod enums;
pub mod error;
pub mod events;
pub mod state;
pub mod types;

pub use catalog::Catalog;
pub use error::{CatalogError, CommandRejection};

#[cfg(test)]
mod tests;
