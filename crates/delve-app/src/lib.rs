//! DELVE headless application.
//!
//! This crate wires the simulation to a host: a threaded real-time driver
//! fed over a command channel, and an autoplay runner for unattended runs.

pub mod autoplay;
pub mod driver;
pub mod state;

pub use delve_core as core;
