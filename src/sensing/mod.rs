//! Synthetic sensing: the drift generator and the per-session ticker that drives it.

pub mod controller;
pub mod drift;
pub mod generator;
mod loop_worker;

pub use controller::SensingController;
pub use drift::drift;
pub use generator::{couple_engagement, MetricsGenerator, EMOTION_SWITCH_PROBABILITY};
