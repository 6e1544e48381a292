//! Independent replay of decoded plans against the rules of the puzzle

use super::Plan;
use crate::config::Settings;
use crate::hanoi::{Board, MoveError, MoveRules};
use rayon::prelude::*;
use std::time::Instant;

/// Checks a plan without trusting the formula it was decoded from
pub struct PlanValidator {
    settings: Settings,
}

/// Result of plan validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub error_message: Option<String>,
    pub validation_details: ValidationDetails,
}

/// Detailed validation information
#[derive(Debug, Clone, Default)]
pub struct ValidationDetails {
    pub steps_checked: usize,
    pub initial_state_matches: bool,
    pub final_state_matches: bool,
    pub malformed_boards: Vec<(usize, String)>,
    pub rule_violations: Vec<RuleViolation>,
    pub validation_time_ms: u64,
}

/// A step whose successor board is not the result of its move
#[derive(Debug, Clone)]
pub struct RuleViolation {
    pub step: usize,
    pub description: String,
}

impl PlanValidator {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Validate shape, endpoints, board well-formedness and every transition
    pub fn validate(&self, plan: &Plan) -> ValidationResult {
        let start_time = Instant::now();
        let planner = &self.settings.planner;

        if plan.snapshots.len() != plan.horizon + 1 || plan.moves.len() != plan.horizon {
            return Self::invalid(format!(
                "Plan shape mismatch: {} boards and {} moves for horizon {}",
                plan.snapshots.len(),
                plan.moves.len(),
                plan.horizon
            ));
        }
        if plan.stones != planner.stones || plan.towers != planner.towers {
            return Self::invalid(format!(
                "Plan is for {} stones on {} towers, expected {} on {}",
                plan.stones, plan.towers, planner.stones, planner.towers
            ));
        }

        let initial_state_matches = Self::is_stacked_on(plan.initial_state(), plan, planner.initial_tower);
        let final_state_matches = Self::is_stacked_on(plan.final_state(), plan, planner.target_tower);

        let malformed_boards: Vec<(usize, String)> = plan
            .snapshots
            .iter()
            .enumerate()
            .filter_map(|(t, board)| {
                board
                    .check_well_formed(plan.stones)
                    .err()
                    .map(|e| (t, e.to_string()))
            })
            .collect();

        // Each transition is independent of the others
        let mut rule_violations: Vec<RuleViolation> = plan
            .moves
            .par_iter()
            .enumerate()
            .filter_map(|(t, mv)| {
                let description = match MoveRules::apply(&plan.snapshots[t], mv) {
                    Ok(next) if next == plan.snapshots[t + 1] => return None,
                    Ok(_) => format!("step {}: board after `{}` differs from the next board", t, mv),
                    Err(e) => Self::describe_move_error(&plan.snapshots[t], t, &e),
                };
                Some(RuleViolation { step: t, description })
            })
            .collect();
        rule_violations.sort_by_key(|violation| violation.step);

        let is_valid = initial_state_matches
            && final_state_matches
            && malformed_boards.is_empty()
            && rule_violations.is_empty();

        let details = ValidationDetails {
            steps_checked: plan.moves.len(),
            initial_state_matches,
            final_state_matches,
            malformed_boards,
            rule_violations,
            validation_time_ms: start_time.elapsed().as_millis() as u64,
        };

        ValidationResult {
            is_valid,
            error_message: (!is_valid).then(|| Self::generate_error_message(&details)),
            validation_details: details,
        }
    }

    fn is_stacked_on(board: Option<&Board>, plan: &Plan, tower: usize) -> bool {
        match (board, Board::stacked(plan.stones, plan.towers, tower)) {
            (Some(board), Ok(expected)) => *board == expected,
            _ => false,
        }
    }

    fn describe_move_error(board: &Board, step: usize, error: &MoveError) -> String {
        let legal: Vec<String> = MoveRules::legal_moves(board, step)
            .iter()
            .map(|mv| format!("stone {} to tower {}", mv.stone, mv.to.tower))
            .collect();
        if legal.is_empty() {
            format!("step {}: {} (no legal moves)", step, error)
        } else {
            format!("step {}: {} (legal: {})", step, error, legal.join(", "))
        }
    }

    fn invalid(message: String) -> ValidationResult {
        ValidationResult {
            is_valid: false,
            error_message: Some(message),
            validation_details: ValidationDetails::default(),
        }
    }

    fn generate_error_message(details: &ValidationDetails) -> String {
        let mut message = String::new();

        if !details.initial_state_matches {
            message.push_str("Initial board is not the initial tower. ");
        }
        if !details.final_state_matches {
            message.push_str("Final board is not the target tower. ");
        }
        for (t, problem) in details.malformed_boards.iter().take(3) {
            message.push_str(&format!("Board {} is malformed: {}; ", t, problem));
        }

        if !details.rule_violations.is_empty() {
            message.push_str(&format!(
                "Found {} illegal transitions. ",
                details.rule_violations.len()
            ));
            for violation in details.rule_violations.iter().take(3) {
                message.push_str(&format!("{}; ", violation.description));
            }
            if details.rule_violations.len() > 3 {
                message.push_str(&format!("... and {} more", details.rule_violations.len() - 3));
            }
        }

        message
    }
}

impl std::fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Validation: {}", if self.is_valid { "PASSED" } else { "FAILED" })?;
        writeln!(f, "  Steps checked: {}", self.validation_details.steps_checked)?;
        writeln!(f, "  Time: {}ms", self.validation_details.validation_time_ms)?;
        if let Some(ref message) = self.error_message {
            writeln!(f, "  Error: {}", message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hanoi::{Move, Slot};
    use std::time::Duration;

    fn settings(stones: usize, towers: usize, horizon: usize) -> Settings {
        let mut settings = Settings::default();
        settings.planner.stones = stones;
        settings.planner.towers = towers;
        settings.planner.horizon = horizon;
        settings
    }

    fn classic_plan() -> Plan {
        let moves = vec![
            Move { step: 0, stone: 0, from: Slot::new(0, 1), to: Slot::new(2, 0) },
            Move { step: 1, stone: 1, from: Slot::new(0, 0), to: Slot::new(1, 0) },
            Move { step: 2, stone: 0, from: Slot::new(2, 0), to: Slot::new(1, 1) },
        ];
        let mut snapshots = vec![Board::stacked(2, 3, 0).unwrap()];
        for mv in &moves {
            let next = MoveRules::apply(snapshots.last().unwrap(), mv).unwrap();
            snapshots.push(next);
        }
        Plan { stones: 2, towers: 3, horizon: 3, snapshots, moves, solve_time: Duration::ZERO }
    }

    #[test]
    fn test_valid_plan() {
        let result = PlanValidator::new(settings(2, 3, 3)).validate(&classic_plan());
        assert!(result.is_valid, "{:?}", result.error_message);
        assert_eq!(result.validation_details.steps_checked, 3);
    }

    #[test]
    fn test_stone_teleport_is_rejected() {
        let mut plan = classic_plan();
        // Board 2 claims stone 0 left the spare tower without a move
        let mut board = plan.snapshots[2].clone();
        board.take(Slot::new(2, 0));
        board.place(Slot::new(1, 1), 0).unwrap();
        plan.snapshots[2] = board;

        let result = PlanValidator::new(settings(2, 3, 3)).validate(&plan);
        assert!(!result.is_valid);
        let steps: Vec<usize> = result
            .validation_details
            .rule_violations
            .iter()
            .map(|v| v.step)
            .collect();
        assert_eq!(steps, vec![1, 2]);
        assert!(
            result.validation_details.rule_violations[1]
                .description
                .ends_with("(legal: stone 0 to tower 0, stone 0 to tower 2)"),
            "{}",
            result.validation_details.rule_violations[1].description
        );
    }

    #[test]
    fn test_wrong_target() {
        let mut settings = settings(2, 3, 3);
        settings.planner.target_tower = 2;

        let result = PlanValidator::new(settings).validate(&classic_plan());
        assert!(!result.is_valid);
        assert!(!result.validation_details.final_state_matches);
        assert!(result.error_message.unwrap().contains("target tower"));
    }

    #[test]
    fn test_shape_mismatch() {
        let mut plan = classic_plan();
        plan.moves.pop();

        let result = PlanValidator::new(settings(2, 3, 3)).validate(&plan);
        assert!(!result.is_valid);
        assert!(result.error_message.unwrap().starts_with("Plan shape mismatch"));
    }
}
