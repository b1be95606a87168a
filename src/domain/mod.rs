//! Simulation core: price ticks, policy state machines, the runner and
//! metrics.

pub mod tick;
pub mod trade;
pub mod state;
pub mod valuation;
pub mod indicator;
pub mod policy;
pub mod runner;
pub mod metrics;
pub mod simulation;
pub mod config_validation;
pub mod error;
