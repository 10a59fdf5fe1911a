//! UI module for the engine simulator

pub mod app;

pub use app::RevsimApp;
