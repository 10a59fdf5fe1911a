//! Engine simulation
//!
//! [`EngineModel`] is the piece the frontend talks to: feed it throttle
//! and time, read back RPM and phase. The gesture and cruise detectors
//! live in their own modules and hold no audio state.

mod cruise;
mod gesture;
mod model;

pub use cruise::CruiseDetector;
pub use gesture::{AccelFlickDetector, DecelDropDetector};
pub use model::EngineModel;
