//! Configuration management for the Hanoi SAT planner

pub mod settings;

pub use settings::{
    Settings, PlannerConfig, EncodingConfig, SolverConfig, OutputConfig,
    FrameAxioms, OutputFormat, CliOverrides, SolverBackend
};
