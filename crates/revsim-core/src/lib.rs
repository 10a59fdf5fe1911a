//! Revsim Core - engine-sound simulation for EVs

pub mod audio;
pub mod config;
pub mod director;
pub mod engine;
pub mod types;

pub use types::*;
