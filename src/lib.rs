pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod quest;
pub mod simulation;
pub mod stats;
pub mod types;
