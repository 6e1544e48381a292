//! SAT encoding and solving for Hanoi planning

pub mod variables;
pub mod constraints;
pub mod encoder;
pub mod decoder;
pub mod solver;
pub mod external_solver;
pub mod solver_factory;

pub use variables::{ActionKey, PredicateKey, StoneStateKey, Variable, VariableManager};
pub use constraints::{Clause, Dimensions, EncodingOptions, KeyClause, Literal};
pub use encoder::{FormulaSize, PlanEncoder};
pub use decoder::{DecodeError, PlanDecoder};
pub use solver::{SatSolver, SolverOutcome, SolverSolution, Valuation};
pub use external_solver::{parse_solver_output, ExternalSolver, SolverOutputError};
pub use solver_factory::UnifiedSatSolver;
