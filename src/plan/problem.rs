//! Hanoi planning problem definition

use super::{Plan, PlanOutcome, PlanValidator};
use crate::config::Settings;
use crate::sat::encoder::{ComplexityEstimate, EncodingStatistics};
use crate::sat::{PlanEncoder, SolverOutcome, UnifiedSatSolver};
use anyhow::{Context, Result};
use log::{info, warn};
use std::time::Instant;

/// One bounded planning problem: fixed stones, towers and horizon
pub struct PlanningProblem {
    settings: Settings,
    encoder: PlanEncoder,
    solver: UnifiedSatSolver,
    validator: PlanValidator,
}

impl PlanningProblem {
    /// Create a new problem from validated settings
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate().context("Invalid planner settings")?;

        let encoder = PlanEncoder::new(&settings);
        let solver = UnifiedSatSolver::from_settings(&settings);
        let validator = PlanValidator::new(settings.clone());

        Ok(Self {
            settings,
            encoder,
            solver,
            validator,
        })
    }

    /// Encode, solve, decode and check the plan
    ///
    /// An unsatisfiable formula is a normal outcome. A model that does not
    /// decode, or a decoded plan that fails validation, is an error.
    pub fn solve(&mut self) -> Result<PlanOutcome> {
        let start_time = Instant::now();
        let planner = &self.settings.planner;

        info!(
            "Planning {} stones on {} towers from tower {} to tower {} in {} steps",
            planner.stones, planner.towers, planner.initial_tower, planner.target_tower, planner.horizon
        );
        info!("{}", self.encoder.estimate_complexity());

        let outcome = self
            .solver
            .solve(&mut self.encoder)
            .context("SAT solving failed")?;

        let solution = match outcome {
            SolverOutcome::Satisfiable(solution) => solution,
            SolverOutcome::Unsatisfiable => {
                info!("No plan with exactly {} steps", self.encoder.horizon());
                return Ok(PlanOutcome::NotFound {
                    horizon: self.encoder.horizon(),
                });
            }
        };

        let mut plan: Plan = self
            .encoder
            .decode(&solution.valuation)
            .context("Failed to decode solver model")?;
        plan.solve_time = solution.solve_time;

        let validation = self.validator.validate(&plan);
        if !validation.is_valid {
            let message = validation
                .error_message
                .unwrap_or_else(|| "Unknown error".to_string());
            warn!("Decoded plan failed validation: {}", message);
            anyhow::bail!("Decoded plan failed validation: {}", message);
        }

        info!(
            "Found plan with {} moves in {:.3}s",
            plan.effective_moves().count(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(PlanOutcome::Found(plan))
    }

    /// Get the problem settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn encoder(&self) -> &PlanEncoder {
        &self.encoder
    }

    /// Get encoding statistics
    pub fn encoding_statistics(&self) -> EncodingStatistics {
        self.encoder.statistics()
    }

    pub fn estimate_complexity(&self) -> ComplexityEstimate {
        self.encoder.estimate_complexity()
    }
}
