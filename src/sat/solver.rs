//! SAT solver integration using CaDiCaL

use super::constraints::Clause;
use anyhow::Result;
use cadical::Solver;
use log::debug;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Truth values for SAT identifiers, as returned by a solver
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Valuation {
    assignment: HashMap<i32, bool>,
}

impl Valuation {
    /// Build from signed literals: positive means true, negative false.
    /// A `0` terminator is ignored.
    pub fn from_literals(literals: impl IntoIterator<Item = i32>) -> Self {
        let assignment = literals
            .into_iter()
            .filter(|&literal| literal != 0)
            .map(|literal| (literal.abs(), literal > 0))
            .collect();
        Self { assignment }
    }

    pub fn set(&mut self, id: i32, value: bool) {
        self.assignment.insert(id.abs(), value);
    }

    /// Value of an identifier of either sign, without applying the sign
    pub fn value(&self, id: i32) -> Option<bool> {
        self.assignment.get(&id.abs()).copied()
    }

    pub fn len(&self) -> usize {
        self.assignment.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignment.is_empty()
    }

    /// Signed literals in identifier order
    pub fn literals(&self) -> Vec<i32> {
        let mut literals: Vec<i32> = self
            .assignment
            .iter()
            .map(|(&id, &value)| if value { id } else { -id })
            .collect();
        literals.sort_by_key(|literal| literal.abs());
        literals
    }
}

/// Result of SAT solving
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverSolution {
    pub valuation: Valuation,
    pub solve_time: Duration,
}

/// Either a model or a proof that none exists at this horizon
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverOutcome {
    Satisfiable(SolverSolution),
    Unsatisfiable,
}

impl SolverOutcome {
    pub fn is_satisfiable(&self) -> bool {
        matches!(self, SolverOutcome::Satisfiable(_))
    }
}

/// Statistics about the solving process
#[derive(Debug, Clone)]
pub struct SolverStatistics {
    pub variable_count: usize,
    pub clause_count: usize,
    pub solve_time: Duration,
    pub result: SolverResultType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverResultType {
    Satisfiable,
    Unsatisfiable,
    Unknown,
}

/// SAT solver wrapper for CaDiCaL
pub struct SatSolver {
    solver: Solver,
    variable_count: usize,
    clause_count: usize,
    solve_time: Duration,
    result: SolverResultType,
}

impl SatSolver {
    /// Create a new SAT solver instance
    pub fn new() -> Self {
        Self {
            solver: Solver::new(),
            variable_count: 0,
            clause_count: 0,
            solve_time: Duration::ZERO,
            result: SolverResultType::Unknown,
        }
    }

    /// Add a single clause to the solver
    pub fn add_clause(&mut self, clause: &Clause) -> Result<()> {
        if clause.is_empty() {
            anyhow::bail!("Cannot add empty clause (unsatisfiable)");
        }

        for var in &clause.literals {
            let index = var.index() as usize;
            if index > self.variable_count {
                self.variable_count = index;
            }
        }

        self.solver.add_clause(clause.ids());
        self.clause_count += 1;
        Ok(())
    }

    /// Add every clause of a stream
    pub fn add_clauses(&mut self, clauses: impl IntoIterator<Item = Clause>) -> Result<()> {
        for clause in clauses {
            self.add_clause(&clause)?;
        }
        Ok(())
    }

    /// Solve the SAT problem
    pub fn solve(&mut self) -> Result<SolverOutcome> {
        let start_time = Instant::now();
        let result = self.solver.solve();
        self.solve_time = start_time.elapsed();

        debug!(
            "CaDiCaL finished in {:.3}s on {} variables, {} clauses",
            self.solve_time.as_secs_f64(),
            self.variable_count,
            self.clause_count
        );

        match result {
            Some(true) => {
                self.result = SolverResultType::Satisfiable;
                Ok(SolverOutcome::Satisfiable(SolverSolution {
                    valuation: self.extract_valuation(),
                    solve_time: self.solve_time,
                }))
            }
            Some(false) => {
                self.result = SolverResultType::Unsatisfiable;
                Ok(SolverOutcome::Unsatisfiable)
            }
            None => {
                self.result = SolverResultType::Unknown;
                anyhow::bail!("CaDiCaL stopped without an answer")
            }
        }
    }

    /// Extract variable assignment from the solver
    fn extract_valuation(&self) -> Valuation {
        let mut valuation = Valuation::default();
        for var in 1..=self.variable_count as i32 {
            if let Some(value) = self.solver.value(var) {
                valuation.set(var, value);
            }
        }
        valuation
    }

    /// Get solver statistics
    pub fn statistics(&self) -> SolverStatistics {
        SolverStatistics {
            variable_count: self.variable_count,
            clause_count: self.clause_count,
            solve_time: self.solve_time,
            result: self.result,
        }
    }

    /// Get the number of variables
    pub fn variable_count(&self) -> usize {
        self.variable_count
    }

    /// Get the number of clauses
    pub fn clause_count(&self) -> usize {
        self.clause_count
    }
}

impl Default for SatSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SolverStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SAT Solver Statistics:")?;
        writeln!(f, "  Variables: {}", self.variable_count)?;
        writeln!(f, "  Clauses: {}", self.clause_count)?;
        writeln!(f, "  Solve time: {:.3}s", self.solve_time.as_secs_f64())?;
        writeln!(f, "  Result: {:?}", self.result)?;
        Ok(())
    }
}
