//! Plan formula assembly for the Hanoi planning problem

use super::constraints::{
    action_axioms, single_tower, state_axioms, Clause, Dimensions, EncodingOptions, KeyClause,
};
use super::decoder::{DecodeError, PlanDecoder};
use super::solver::Valuation;
use super::variables::VariableManager;
use crate::config::{FrameAxioms, Settings};
use crate::plan::Plan;
use anyhow::{Context, Result};
use log::{debug, info};
use std::io::{BufWriter, Write};

/// Builds the CNF for one planning problem and owns its variable registry
pub struct PlanEncoder {
    dims: Dimensions,
    horizon: usize,
    initial_tower: usize,
    target_tower: usize,
    options: EncodingOptions,
    variables: VariableManager,
}

/// Streaming view of the formula; resolves keys to identifiers as clauses are pulled
pub struct PlanFormula<'a> {
    variables: &'a mut VariableManager,
    clauses: Box<dyn Iterator<Item = KeyClause>>,
}

impl Iterator for PlanFormula<'_> {
    type Item = Clause;

    fn next(&mut self) -> Option<Clause> {
        let clause = self.clauses.next()?;
        let variables = &mut *self.variables;
        let literals = clause
            .literals
            .iter()
            .map(|literal| {
                let var = variables.variable_for(literal.key);
                if literal.positive {
                    var
                } else {
                    variables.negate(var)
                }
            })
            .collect();
        Some(Clause::new(literals))
    }
}

/// Variable and clause totals of a fully enumerated formula
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormulaSize {
    pub variables: usize,
    pub clauses: usize,
}

impl PlanEncoder {
    /// Create an encoder for the problem described by `settings`
    pub fn new(settings: &Settings) -> Self {
        let planner = &settings.planner;
        Self::with_parameters(
            planner.stones,
            planner.towers,
            planner.horizon,
            planner.initial_tower,
            planner.target_tower,
            EncodingOptions {
                frame_axioms: settings.encoding.frame_axioms,
                symmetry_pruning: settings.encoding.symmetry_pruning,
            },
        )
    }

    pub fn with_parameters(
        stones: usize,
        towers: usize,
        horizon: usize,
        initial_tower: usize,
        target_tower: usize,
        options: EncodingOptions,
    ) -> Self {
        Self {
            dims: Dimensions::new(stones, towers),
            horizon,
            initial_tower,
            target_tower,
            options,
            variables: VariableManager::new(stones, towers),
        }
    }

    /// The whole formula over predicate keys, in emission order:
    /// initial state, then state and action axioms per step, then the final
    /// state and the state axioms of the last step
    pub fn key_clauses(&self) -> impl Iterator<Item = KeyClause> + 'static {
        let dims = self.dims;
        let options = self.options;
        let horizon = self.horizon;

        single_tower(dims, 0, self.initial_tower)
            .chain((0..horizon).flat_map(move |t| {
                state_axioms(dims, t, options).chain(action_axioms(dims, t, options))
            }))
            .chain(single_tower(dims, horizon, self.target_tower))
            .chain(state_axioms(dims, horizon, options))
    }

    /// Stream the formula from the start, allocating identifiers on first use
    pub fn clauses(&mut self) -> PlanFormula<'_> {
        PlanFormula {
            clauses: Box::new(self.key_clauses()),
            variables: &mut self.variables,
        }
    }

    /// Enumerate the formula once to count clauses; allocates every variable
    pub fn formula_size(&mut self) -> FormulaSize {
        let clauses = self.clauses().count();
        let size = FormulaSize {
            variables: self.variables.variable_count(),
            clauses,
        };
        debug!("Formula has {} variables and {} clauses", size.variables, size.clauses);
        size
    }

    /// Write the formula in DIMACS CNF format
    ///
    /// The formula is enumerated twice: once for the header counts, once for
    /// the clauses. Identifiers are stable across passes.
    pub fn write_dimacs<W: Write>(&mut self, out: W) -> Result<FormulaSize> {
        let size = self.formula_size();
        let mut out = BufWriter::new(out);

        writeln!(out, "p cnf {} {}", size.variables, size.clauses)
            .context("Failed to write DIMACS header")?;
        for clause in self.clauses() {
            writeln!(out, "{}", clause.to_dimacs())?;
        }
        out.flush().context("Failed to flush DIMACS output")?;

        info!(
            "Wrote DIMACS formula: {} variables, {} clauses",
            size.variables, size.clauses
        );
        Ok(size)
    }

    /// Write the formula with every literal labelled by its predicate
    pub fn write_annotated<W: Write>(&mut self, out: W) -> Result<FormulaSize> {
        let size = self.formula_size();
        let mut out = BufWriter::new(out);

        writeln!(out, "p cnf {} {}", size.variables, size.clauses)?;
        for clause in self.clauses() {
            writeln!(out, "{}", clause)?;
        }
        out.flush()?;
        Ok(size)
    }

    /// Reconstruct the plan encoded by a model of this formula
    pub fn decode(&self, valuation: &Valuation) -> Result<Plan, DecodeError> {
        PlanDecoder::new(&self.variables, self.dims, self.horizon).decode(valuation)
    }

    pub fn variables(&self) -> &VariableManager {
        &self.variables
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn options(&self) -> EncodingOptions {
        self.options
    }

    /// Get encoding statistics
    pub fn statistics(&self) -> EncodingStatistics {
        let variable_stats = self.variables.statistics();
        let estimate = self.estimate_complexity();

        EncodingStatistics {
            stones: self.dims.stones,
            towers: self.dims.towers,
            horizon: self.horizon,
            allocated_variables: variable_stats.total_variables,
            stone_variables: variable_stats.stone_variables,
            action_variables: variable_stats.action_variables,
            total_clauses: estimate.estimated_clauses,
            frame_axioms: self.options.frame_axioms,
            symmetry_pruning: self.options.symmetry_pruning,
        }
    }

    /// Exact formula size computed from the parameters, without enumerating
    pub fn estimate_complexity(&self) -> ComplexityEstimate {
        let n = self.dims.stones;
        let m = self.dims.towers;
        let h = self.horizon;
        let slots = self.dims.slot_count();
        let actions = self.dims.action_count();
        let pair_divisor = if self.options.symmetry_pruning { 2 } else { 1 };

        let state_clauses = n
            + n * slots * (slots - 1) / pair_divisor
            + slots * n * (n - 1) / pair_divisor
            + m * (n - 1) * n * (n - 1) / 2
            + n * m * (n - 1);

        let frame_clauses = match self.options.frame_axioms {
            FrameAxioms::Explicit => actions * (n - 1) * slots,
            FrameAxioms::SuccessorState => n * slots,
        };
        let action_clauses = actions * (actions - 1) / pair_divisor + 1 + 2 * actions + frame_clauses;

        let estimated_variables = (h + 1) * n * slots + h * actions;
        let estimated_clauses = 2 * n + (h + 1) * state_clauses + h * action_clauses;

        let complexity_level = if estimated_clauses < 100_000 {
            ComplexityLevel::Low
        } else if estimated_clauses < 1_000_000 {
            ComplexityLevel::Medium
        } else if estimated_clauses < 10_000_000 {
            ComplexityLevel::High
        } else {
            ComplexityLevel::VeryHigh
        };

        ComplexityEstimate {
            complexity_level,
            estimated_variables,
            estimated_clauses,
            actions_per_step: actions,
            slots,
            time_steps: h + 1,
        }
    }
}

/// Statistics about the SAT encoding
#[derive(Debug, Clone)]
pub struct EncodingStatistics {
    pub stones: usize,
    pub towers: usize,
    pub horizon: usize,
    pub allocated_variables: usize,
    pub stone_variables: usize,
    pub action_variables: usize,
    pub total_clauses: usize,
    pub frame_axioms: FrameAxioms,
    pub symmetry_pruning: bool,
}

/// Complexity estimate for the problem
#[derive(Debug, Clone)]
pub struct ComplexityEstimate {
    pub complexity_level: ComplexityLevel,
    pub estimated_variables: usize,
    pub estimated_clauses: usize,
    pub actions_per_step: usize,
    pub slots: usize,
    pub time_steps: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComplexityLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl std::fmt::Display for EncodingStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SAT Encoding Statistics:")?;
        writeln!(f, "  Stones: {}, towers: {}", self.stones, self.towers)?;
        writeln!(f, "  Horizon: {}", self.horizon)?;
        writeln!(f, "  Allocated variables: {}", self.allocated_variables)?;
        writeln!(f, "    Stone variables: {}", self.stone_variables)?;
        writeln!(f, "    Action variables: {}", self.action_variables)?;
        writeln!(f, "  Total clauses: {}", self.total_clauses)?;
        writeln!(f, "  Frame axioms: {:?}", self.frame_axioms)?;
        writeln!(f, "  Symmetry pruning: {}", self.symmetry_pruning)?;
        Ok(())
    }
}

impl std::fmt::Display for ComplexityEstimate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Problem Complexity Estimate:")?;
        writeln!(f, "  Complexity level: {:?}", self.complexity_level)?;
        writeln!(f, "  Variables: {}", self.estimated_variables)?;
        writeln!(f, "  Clauses: {}", self.estimated_clauses)?;
        writeln!(f, "  Slots per board: {}", self.slots)?;
        writeln!(f, "  Actions per step: {}", self.actions_per_step)?;
        writeln!(f, "  Time steps: {}", self.time_steps)?;

        let recommendation = match self.complexity_level {
            ComplexityLevel::Low => "Should solve quickly",
            ComplexityLevel::Medium => "May take some time to encode and solve",
            ComplexityLevel::High => "Large formula, consider symmetry pruning or successor-state frame axioms",
            ComplexityLevel::VeryHigh => "Very large formula, reduce stones, towers or horizon",
        };
        writeln!(f, "  Recommendation: {}", recommendation)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::variables::{PredicateKey, StoneStateKey};
    use test_log::test;

    fn encoder(stones: usize, towers: usize, horizon: usize, options: EncodingOptions) -> PlanEncoder {
        PlanEncoder::with_parameters(stones, towers, horizon, 0, 1, options)
    }

    fn dimacs(encoder: &mut PlanEncoder) -> String {
        let mut buffer = Vec::new();
        encoder.write_dimacs(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_encoder_from_settings() {
        let mut settings = Settings::default();
        settings.planner.stones = 2;
        settings.planner.horizon = 3;
        let encoder = PlanEncoder::new(&settings);

        let stats = encoder.statistics();
        assert_eq!(stats.stones, 2);
        assert_eq!(stats.towers, 3);
        assert_eq!(stats.horizon, 3);
        assert_eq!(stats.allocated_variables, 0);
    }

    #[test]
    fn test_first_clauses_pin_initial_tower() {
        let mut encoder = encoder(3, 3, 1, EncodingOptions::default());
        let first: Vec<_> = encoder.clauses().take(3).collect();

        for (s, clause) in first.iter().enumerate() {
            assert!(clause.is_unit());
            assert_eq!(clause.literals[0].id(), s as i32 + 1);
            assert_eq!(
                clause.literals[0].key(),
                PredicateKey::Stone(StoneStateKey::new(0, s, 0, 2 - s))
            );
        }
    }

    #[test]
    fn test_estimate_matches_enumeration() {
        let modes = [
            EncodingOptions::default(),
            EncodingOptions { frame_axioms: FrameAxioms::SuccessorState, symmetry_pruning: false },
            EncodingOptions { frame_axioms: FrameAxioms::Explicit, symmetry_pruning: true },
        ];
        for options in modes {
            for (stones, towers, horizon) in [(1, 2, 0), (2, 2, 1), (2, 3, 2), (3, 2, 1)] {
                let mut encoder = encoder(stones, towers, horizon, options);
                let estimate = encoder.estimate_complexity();
                let size = encoder.formula_size();
                assert_eq!(size.clauses, estimate.estimated_clauses, "{:?} {:?}", options, (stones, towers, horizon));
                assert_eq!(size.variables, estimate.estimated_variables, "{:?} {:?}", options, (stones, towers, horizon));
            }
        }
    }

    #[test]
    fn test_horizon_zero_formula_shape() {
        let mut encoder = encoder(1, 2, 0, EncodingOptions::default());
        let clauses: Vec<_> = encoder.clauses().collect();

        // Initial unit, final unit, then the terminal state axioms: one ALO
        // clause and two ordered AMO pairs
        let state = 1 + 2;
        assert_eq!(clauses.len(), 1 + 1 + state);
        assert_eq!(encoder.variables().variable_count(), 2);
    }

    #[test]
    fn test_dimacs_header_and_terminators() {
        let mut encoder = encoder(2, 2, 1, EncodingOptions::default());
        let text = dimacs(&mut encoder);
        let mut lines = text.lines();

        let estimate = encoder.estimate_complexity();
        assert_eq!(
            lines.next().unwrap(),
            format!("p cnf {} {}", estimate.estimated_variables, estimate.estimated_clauses)
        );
        assert_eq!(lines.next().unwrap(), "1 0");
        assert_eq!(lines.next().unwrap(), "2 0");
        assert!(lines.all(|line| line.ends_with(" 0")));
    }

    #[test]
    fn test_dimacs_is_deterministic() {
        let options = EncodingOptions { frame_axioms: FrameAxioms::SuccessorState, symmetry_pruning: true };
        let first = dimacs(&mut encoder(2, 3, 2, options));
        let second = dimacs(&mut encoder(2, 3, 2, options));
        assert_eq!(first, second);

        // Writing twice from the same encoder reuses the identifiers
        let mut same = encoder(2, 3, 2, options);
        assert_eq!(dimacs(&mut same), dimacs(&mut same));
    }

    #[test]
    fn test_annotated_output() {
        let mut encoder = encoder(1, 2, 0, EncodingOptions::default());
        let mut buffer = Vec::new();
        encoder.write_annotated(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.starts_with("p cnf 2 5\n"));
        assert!(text.contains("Stone(t=0, s=0, w=0, p=0):1 0"));
        assert!(text.contains("Stone(t=0, s=0, w=1, p=0):2 0"));
    }

    #[test]
    fn test_complexity_levels() {
        let small = encoder(2, 2, 3, EncodingOptions::default());
        assert_eq!(small.estimate_complexity().complexity_level, ComplexityLevel::Low);

        let large = encoder(4, 4, 15, EncodingOptions::default());
        assert_eq!(large.estimate_complexity().complexity_level, ComplexityLevel::VeryHigh);
    }
}
