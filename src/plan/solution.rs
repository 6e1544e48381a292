//! Plan representation for Hanoi planning problems

use crate::hanoi::{Board, Move, Slot};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A decoded plan: one board per step and the move taken between steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub stones: usize,
    pub towers: usize,
    pub horizon: usize,
    /// Boards for steps `0..=horizon`
    pub snapshots: Vec<Board>,
    /// Moves for steps `0..horizon`
    pub moves: Vec<Move>,
    /// Time taken by the solver
    #[serde(skip)]
    pub solve_time: Duration,
}

/// Outcome of one planning run at a fixed horizon
#[derive(Debug, Clone)]
pub enum PlanOutcome {
    Found(Plan),
    /// The formula is unsatisfiable: no plan of exactly this many steps
    NotFound { horizon: usize },
}

impl PlanOutcome {
    pub fn plan(&self) -> Option<&Plan> {
        match self {
            PlanOutcome::Found(plan) => Some(plan),
            PlanOutcome::NotFound { .. } => None,
        }
    }
}

/// Short description of a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSummary {
    pub stones: usize,
    pub towers: usize,
    pub horizon: usize,
    pub moves: usize,
    pub idle_steps: usize,
    pub solve_time_ms: u64,
}

impl Plan {
    /// Board before the first move
    pub fn initial_state(&self) -> Option<&Board> {
        self.snapshots.first()
    }

    /// Board after the last move
    pub fn final_state(&self) -> Option<&Board> {
        self.snapshots.last()
    }

    pub fn state_at_step(&self, step: usize) -> Option<&Board> {
        self.snapshots.get(step)
    }

    /// Moves that actually relocate a stone
    pub fn effective_moves(&self) -> impl Iterator<Item = &Move> {
        self.moves.iter().filter(|mv| !mv.is_idle())
    }

    pub fn summary(&self) -> PlanSummary {
        let moves = self.effective_moves().count();
        PlanSummary {
            stones: self.stones,
            towers: self.towers,
            horizon: self.horizon,
            moves,
            idle_steps: self.moves.len() - moves,
            solve_time_ms: self.solve_time.as_millis() as u64,
        }
    }

    /// Step-by-step report: stone positions, board, then the move of each step
    pub fn format_report(&self) -> String {
        let mut result = String::new();

        for (t, board) in self.snapshots.iter().enumerate() {
            for stone in 0..self.stones {
                if let Some(Slot { tower, position }) = board.position_of(stone) {
                    result.push_str(&format!(
                        "{}: Stone {} at tower {} at position {}.\n",
                        t, stone, tower, position
                    ));
                }
            }
            result.push_str(&board.to_string());

            if let Some(mv) = self.moves.get(t) {
                result.push_str(&format!("{}\n", mv));
            }
        }

        result
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Create from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Save to file
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> anyhow::Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from file
    pub fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Plan Summary:")?;
        writeln!(f, "  Stones: {}, towers: {}", self.stones, self.towers)?;
        writeln!(f, "  Horizon: {}", self.horizon)?;
        writeln!(f, "  Moves: {} ({} idle steps)", self.moves, self.idle_steps)?;
        writeln!(f, "  Solve time: {}ms", self.solve_time_ms)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hanoi::MoveRules;
    use tempfile::tempdir;

    /// Two stones, three moves, tower 0 to tower 1
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
        Plan {
            stones: 2,
            towers: 3,
            horizon: 3,
            snapshots,
            moves,
            solve_time: Duration::from_millis(12),
        }
    }

    #[test]
    fn test_accessors() {
        let plan = classic_plan();
        assert_eq!(plan.initial_state(), Some(&Board::stacked(2, 3, 0).unwrap()));
        assert_eq!(plan.final_state(), Some(&Board::stacked(2, 3, 1).unwrap()));
        assert_eq!(plan.state_at_step(1).unwrap().get(Slot::new(2, 0)), Some(0));
        assert!(plan.state_at_step(4).is_none());
    }

    #[test]
    fn test_summary_counts_idle_steps() {
        let mut plan = classic_plan();
        plan.moves.push(Move { step: 3, stone: 1, from: Slot::new(1, 0), to: Slot::new(1, 0) });
        plan.snapshots.push(plan.snapshots[3].clone());
        plan.horizon = 4;

        let summary = plan.summary();
        assert_eq!(summary.moves, 3);
        assert_eq!(summary.idle_steps, 1);
        assert_eq!(summary.solve_time_ms, 12);
    }

    #[test]
    fn test_report_wording() {
        let report = classic_plan().format_report();
        assert!(report.starts_with("0: Stone 0 at tower 0 at position 1.\n0: Stone 1 at tower 0 at position 0.\n"));
        assert!(report.contains("1: Move stone 1 at tower 0 at position 0 to tower 1 to position 0.\n"));
        assert!(report.ends_with("3: Stone 1 at tower 1 at position 0.\n0 | . .\n1 | 1 0\n2 | . .\n"));
    }

    #[test]
    fn test_json_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plan.json");

        let plan = classic_plan();
        plan.save_to_file(&path).unwrap();
        let loaded = Plan::load_from_file(&path).unwrap();

        assert_eq!(loaded.moves, plan.moves);
        assert_eq!(loaded.snapshots, plan.snapshots);
        assert_eq!(loaded.solve_time, Duration::ZERO);
    }
}
