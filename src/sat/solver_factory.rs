//! Factory for creating SAT solver instances based on configuration

use super::encoder::PlanEncoder;
use super::external_solver::ExternalSolver;
use super::solver::{SatSolver, SolverOutcome};
use crate::config::{Settings, SolverBackend};
use anyhow::{Context, Result};
use log::info;
use std::fs::File;
use std::path::PathBuf;

/// Unified SAT solver interface that can use different backends
pub enum UnifiedSatSolver {
    Cadical(SatSolver),
    External {
        solver: ExternalSolver,
        cnf_path: PathBuf,
    },
}

impl UnifiedSatSolver {
    /// Create a new solver instance based on the configured backend
    pub fn from_settings(settings: &Settings) -> Self {
        match settings.solver.backend {
            SolverBackend::Cadical => UnifiedSatSolver::Cadical(SatSolver::new()),
            SolverBackend::External => UnifiedSatSolver::External {
                solver: ExternalSolver::new(
                    settings.solver.external_command.clone(),
                    settings.solver.timeout_seconds,
                ),
                cnf_path: settings.output.cnf_file.clone(),
            },
        }
    }

    /// Stream the encoder's formula into the backend and solve it
    pub fn solve(&mut self, encoder: &mut PlanEncoder) -> Result<SolverOutcome> {
        match self {
            UnifiedSatSolver::Cadical(solver) => {
                solver
                    .add_clauses(encoder.clauses())
                    .context("Failed to add clauses to SAT solver")?;
                info!(
                    "Loaded {} clauses over {} variables into CaDiCaL",
                    solver.clause_count(),
                    solver.variable_count()
                );
                solver.solve()
            }
            UnifiedSatSolver::External { solver, cnf_path } => {
                if let Some(parent) = cnf_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
                }
                let file = File::create(&*cnf_path)
                    .with_context(|| format!("Failed to create CNF file: {}", cnf_path.display()))?;
                encoder.write_dimacs(file)?;
                solver.solve_file(cnf_path.as_path())
            }
        }
    }

    /// Get the backend type being used
    pub fn backend(&self) -> SolverBackend {
        match self {
            UnifiedSatSolver::Cadical(_) => SolverBackend::Cadical,
            UnifiedSatSolver::External { .. } => SolverBackend::External,
        }
    }
}

impl Default for UnifiedSatSolver {
    fn default() -> Self {
        UnifiedSatSolver::Cadical(SatSolver::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::constraints::EncodingOptions;

    #[test]
    fn test_backend_selection() {
        let mut settings = Settings::default();
        assert_eq!(UnifiedSatSolver::from_settings(&settings).backend(), SolverBackend::Cadical);

        settings.solver.backend = SolverBackend::External;
        assert_eq!(UnifiedSatSolver::from_settings(&settings).backend(), SolverBackend::External);
    }

    #[test]
    fn test_cadical_trivial_plan() {
        // One stone already on the target tower
        let mut encoder = PlanEncoder::with_parameters(1, 2, 0, 0, 0, EncodingOptions::default());
        let mut solver = UnifiedSatSolver::default();

        assert!(solver.solve(&mut encoder).unwrap().is_satisfiable());
    }

    #[test]
    fn test_cadical_impossible_plan() {
        let mut encoder = PlanEncoder::with_parameters(1, 2, 0, 0, 1, EncodingOptions::default());
        let mut solver = UnifiedSatSolver::default();

        assert!(!solver.solve(&mut encoder).unwrap().is_satisfiable());
    }
}
