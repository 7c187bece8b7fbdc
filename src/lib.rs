//! confluence: multi-strategy signal-fusion trading engine with a
//! deterministic backtest simulator.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in
//! [`ports`], concrete implementations in [`adapters`]. The live decision
//! loop lives in [`engine`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod engine;
pub mod cli;
