//! Bounded Tower of Hanoi planning through SAT
//!
//! Encodes "reach the target tower in exactly `horizon` moves" as CNF,
//! solves it with an in-process or external SAT solver and decodes the
//! model back into a validated plan.

pub mod config;
pub mod hanoi;
pub mod plan;
pub mod sat;
pub mod utils;

pub use config::Settings;
pub use plan::{Plan, PlanOutcome, PlanningProblem};

use anyhow::Result;

/// Main entry point for solving one bounded planning problem
pub fn solve_plan(settings: Settings) -> Result<PlanOutcome> {
    let mut problem = PlanningProblem::new(settings)?;
    problem.solve()
}
