//! Utility modules

pub mod display;

pub use display::{Color, ColorOutput, PlanFormatter};
