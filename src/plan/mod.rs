//! Planning problems, decoded plans and their validation

pub mod problem;
pub mod solution;
pub mod validator;

pub use problem::PlanningProblem;
pub use solution::{Plan, PlanOutcome, PlanSummary};
pub use validator::{PlanValidator, RuleViolation, ValidationResult};
