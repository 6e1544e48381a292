//! External SAT solver process driven through DIMACS files

use super::solver::{SolverOutcome, SolverSolution, Valuation};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;
use wait_timeout::ChildExt;

/// Solver output that breaks the `SAT`/`UNSAT` result-file contract
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverOutputError {
    #[error("solver output is empty")]
    Empty,
    #[error("unexpected solver result line: {0:?}")]
    UnexpectedResult(String),
    #[error("invalid literal {0:?} in solver model")]
    InvalidLiteral(String),
}

/// Parse a solver result file
///
/// Accepts the minisat layout (`SAT` then the model, or `UNSAT`) and the
/// competition layout (`s SATISFIABLE` followed by `v` lines). Comment lines
/// starting with `c` are skipped.
pub fn parse_solver_output(text: &str) -> Result<SolverOutcome, SolverOutputError> {
    let mut lines = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('c'));

    let result = lines.next().ok_or(SolverOutputError::Empty)?;
    match result {
        "SAT" | "SATISFIABLE" | "s SATISFIABLE" => {}
        "UNSAT" | "UNSATISFIABLE" | "s UNSATISFIABLE" => return Ok(SolverOutcome::Unsatisfiable),
        other => return Err(SolverOutputError::UnexpectedResult(other.to_string())),
    }

    let mut literals = Vec::new();
    for token in lines.flat_map(str::split_whitespace).filter(|&token| token != "v") {
        let literal = token
            .parse::<i32>()
            .ok()
            .filter(|literal| literal.checked_abs().is_some())
            .ok_or_else(|| SolverOutputError::InvalidLiteral(token.to_string()))?;
        literals.push(literal);
    }

    Ok(SolverOutcome::Satisfiable(SolverSolution {
        valuation: Valuation::from_literals(literals),
        solve_time: Duration::ZERO,
    }))
}

/// A solver binary invoked as `command {input} {output}`
#[derive(Debug, Clone)]
pub struct ExternalSolver {
    command: String,
    timeout: Option<Duration>,
}

impl ExternalSolver {
    /// `timeout_seconds == 0` disables the timeout
    pub fn new(command: impl Into<String>, timeout_seconds: u64) -> Self {
        Self {
            command: command.into(),
            timeout: (timeout_seconds > 0).then(|| Duration::from_secs(timeout_seconds)),
        }
    }

    /// Result file written next to the CNF file
    pub fn output_path(cnf_path: &Path) -> PathBuf {
        cnf_path.with_extension("out")
    }

    /// Program and arguments with placeholders substituted
    pub fn command_line(&self, input: &Path, output: &Path) -> Vec<String> {
        self.command
            .split_whitespace()
            .map(|part| {
                part.replace("{input}", &input.display().to_string())
                    .replace("{output}", &output.display().to_string())
            })
            .collect()
    }

    /// Run the solver on a DIMACS file and parse its result file
    pub fn solve_file(&self, cnf_path: &Path) -> Result<SolverOutcome> {
        let output_path = Self::output_path(cnf_path);
        let command_line = self.command_line(cnf_path, &output_path);
        let (program, args) = command_line
            .split_first()
            .context("External solver command is empty")?;

        // A result file left by an earlier run must never be read as this run's answer
        match std::fs::remove_file(&output_path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                return Err(e).with_context(|| {
                    format!("Failed to remove old solver output: {}", output_path.display())
                });
            }
            _ => {}
        }

        info!("Running external solver: {}", command_line.join(" "));
        let start_time = Instant::now();

        let mut child = Command::new(program)
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to start solver {}", program))?;

        // Exit codes are solver specific (minisat uses 10/20), only the result file counts
        let status = match self.timeout {
            Some(timeout) => match child
                .wait_timeout(timeout)
                .context("Failed to wait for solver process")?
            {
                Some(status) => status,
                None => {
                    warn!("Solver exceeded {}s, killing it", timeout.as_secs());
                    child.kill().context("Failed to kill solver process")?;
                    child.wait().ok();
                    anyhow::bail!("Solver timed out after {}s", timeout.as_secs());
                }
            },
            None => child.wait().context("Failed to wait for solver process")?,
        };
        let solve_time = start_time.elapsed();
        debug!("Solver exited with {} after {:.3}s", status, solve_time.as_secs_f64());

        if !output_path.exists() {
            anyhow::bail!(
                "Solver ({}) wrote no result file: {}",
                status,
                output_path.display()
            );
        }
        let text = std::fs::read_to_string(&output_path).with_context(|| {
            format!("Failed to read solver output ({}): {}", status, output_path.display())
        })?;

        let outcome = parse_solver_output(&text)
            .with_context(|| format!("Malformed solver output in {}", output_path.display()))?;

        Ok(match outcome {
            SolverOutcome::Satisfiable(solution) => SolverOutcome::Satisfiable(SolverSolution {
                solve_time,
                ..solution
            }),
            SolverOutcome::Unsatisfiable => SolverOutcome::Unsatisfiable,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minisat_sat() {
        let outcome = parse_solver_output("SAT\n1 -2 3 0\n").unwrap();
        let SolverOutcome::Satisfiable(solution) = outcome else {
            panic!("expected SAT");
        };
        assert_eq!(solution.valuation.len(), 3);
        assert_eq!(solution.valuation.value(2), Some(false));
        assert_eq!(solution.valuation.value(3), Some(true));
    }

    #[test]
    fn test_parse_unsat() {
        assert!(matches!(parse_solver_output("UNSAT\n"), Ok(SolverOutcome::Unsatisfiable)));
        assert!(matches!(
            parse_solver_output("c comment\ns UNSATISFIABLE\n"),
            Ok(SolverOutcome::Unsatisfiable)
        ));
    }

    #[test]
    fn test_parse_competition_format() {
        let text = "c solver banner\ns SATISFIABLE\nv 1 -2\nv 3 0\n";
        let SolverOutcome::Satisfiable(solution) = parse_solver_output(text).unwrap() else {
            panic!("expected SAT");
        };
        assert_eq!(solution.valuation.literals(), vec![1, -2, 3]);
    }

    #[test]
    fn test_parse_contract_violations() {
        assert_eq!(parse_solver_output(""), Err(SolverOutputError::Empty));
        assert_eq!(
            parse_solver_output("INDET\n"),
            Err(SolverOutputError::UnexpectedResult("INDET".to_string()))
        );
        assert_eq!(
            parse_solver_output("SAT\n1 x 0\n"),
            Err(SolverOutputError::InvalidLiteral("x".to_string()))
        );
        assert_eq!(
            parse_solver_output("SAT\n-2147483648 0\n"),
            Err(SolverOutputError::InvalidLiteral("-2147483648".to_string()))
        );
    }

    #[test]
    fn test_command_line_substitution() {
        let solver = ExternalSolver::new("minisat -verb=0 {input} {output}", 0);
        let line = solver.command_line(Path::new("plan.cnf"), Path::new("plan.out"));
        assert_eq!(line, vec!["minisat", "-verb=0", "plan.cnf", "plan.out"]);
        assert_eq!(ExternalSolver::output_path(Path::new("dir/plan.cnf")), PathBuf::from("dir/plan.out"));
    }

    #[test]
    fn test_missing_binary_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cnf = dir.path().join("empty.cnf");
        std::fs::write(&cnf, "p cnf 0 0\n").unwrap();

        let solver = ExternalSolver::new("definitely-not-a-sat-solver-binary {input} {output}", 1);
        assert!(solver.solve_file(&cnf).is_err());
    }
}
