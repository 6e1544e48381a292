//! Display and output formatting utilities

use crate::config::OutputFormat;
use crate::hanoi::Board;
use crate::plan::Plan;
use anyhow::Result;
use std::path::Path;

/// Format plans for display
pub struct PlanFormatter;

impl PlanFormatter {
    /// Format a plan for console output
    pub fn format_plan(plan: &Plan, show_boards: bool) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "=== Plan: {} stones, {} towers, {} steps ===\n",
            plan.stones, plan.towers, plan.horizon
        ));
        output.push_str(&format!("Solve Time: {:.3}s\n", plan.solve_time.as_secs_f64()));
        let summary = plan.summary();
        output.push_str(&format!("Moves: {} (+{} idle)\n\n", summary.moves, summary.idle_steps));

        if show_boards {
            output.push_str(&plan.format_report());
        } else {
            for mv in plan.effective_moves() {
                output.push_str(&format!("{}\n", mv));
            }
        }

        output
    }

    /// Board as a picture, top of the towers first
    ///
    /// ```text
    ///   |     |     |
    ///  ===    |     |
    /// =====   |     |
    /// ```
    pub fn format_board_visual(board: &Board) -> String {
        let width = 2 * board.height + 1;
        let mut output = String::new();

        for position in (0..board.height).rev() {
            let row: Vec<String> = (0..board.towers)
                .map(|tower| {
                    let cell = match board.tower(tower)[position] {
                        Some(stone) => "=".repeat(2 * stone + 1),
                        None => "|".to_string(),
                    };
                    format!("{:^width$}", cell, width = width)
                })
                .collect();
            output.push_str(row.join(" ").trim_end());
            output.push('\n');
        }

        let base: Vec<String> = (0..board.towers)
            .map(|tower| format!("{:^width$}", tower, width = width))
            .collect();
        output.push_str(base.join(" ").trim_end());
        output.push('\n');

        output
    }

    /// Save a plan in the configured format; returns the written file
    pub fn save_plan<P: AsRef<Path>>(
        plan: &Plan,
        output_dir: P,
        format: &OutputFormat,
    ) -> Result<std::path::PathBuf> {
        let output_dir = output_dir.as_ref();
        std::fs::create_dir_all(output_dir)?;
        let stem = format!("plan_{}x{}_h{}", plan.stones, plan.towers, plan.horizon);

        let filepath = match format {
            OutputFormat::Text => {
                let filepath = output_dir.join(format!("{}.txt", stem));
                std::fs::write(&filepath, Self::format_plan(plan, true))?;
                filepath
            }
            OutputFormat::Json => {
                let filepath = output_dir.join(format!("{}.json", stem));
                plan.save_to_file(&filepath)?;
                filepath
            }
            OutputFormat::Visual => {
                let filepath = output_dir.join(format!("{}_visual.txt", stem));
                std::fs::write(&filepath, Self::create_visual_plan(plan))?;
                filepath
            }
        };

        Ok(filepath)
    }

    fn create_visual_plan(plan: &Plan) -> String {
        let mut output = String::new();

        output.push_str(&format!("Visual Plan - {} stones, {} towers\n", plan.stones, plan.towers));
        output.push_str(&"=".repeat(50));
        output.push('\n');

        for (t, board) in plan.snapshots.iter().enumerate() {
            output.push_str(&format!("\nStep {}:\n", t));
            output.push_str(&Self::format_board_visual(board));
            if let Some(mv) = plan.moves.get(t).filter(|mv| !mv.is_idle()) {
                output.push_str(&format!("{}\n", mv));
            }
        }

        output
    }
}

/// Color output utilities
pub struct ColorOutput;

impl ColorOutput {
    /// Format text with color (if terminal supports it)
    pub fn colored(text: &str, color: Color) -> String {
        if Self::supports_color() {
            format!("\x1b[{}m{}\x1b[0m", color.code(), text)
        } else {
            text.to_string()
        }
    }

    fn supports_color() -> bool {
        std::env::var("NO_COLOR").is_err() && (std::env::var("TERM").unwrap_or_default() != "dumb")
    }

    pub fn success(text: &str) -> String {
        Self::colored(text, Color::Green)
    }

    pub fn error(text: &str) -> String {
        Self::colored(text, Color::Red)
    }

    pub fn warning(text: &str) -> String {
        Self::colored(text, Color::Yellow)
    }

    pub fn info(text: &str) -> String {
        Self::colored(text, Color::Blue)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
}

impl Color {
    fn code(self) -> u8 {
        match self {
            Color::Red => 31,
            Color::Green => 32,
            Color::Yellow => 33,
            Color::Blue => 34,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hanoi::{Move, MoveRules, Slot};
    use std::time::Duration;
    use tempfile::tempdir;

    fn one_move_plan() -> Plan {
        let start = Board::stacked(1, 2, 0).unwrap();
        let mv = Move { step: 0, stone: 0, from: Slot::new(0, 0), to: Slot::new(1, 0) };
        let end = MoveRules::apply(&start, &mv).unwrap();
        Plan {
            stones: 1,
            towers: 2,
            horizon: 1,
            snapshots: vec![start, end],
            moves: vec![mv],
            solve_time: Duration::ZERO,
        }
    }

    #[test]
    fn test_board_visual() {
        let board = Board::stacked(2, 3, 0).unwrap();
        let picture = PlanFormatter::format_board_visual(&board);
        assert_eq!(picture, "  =     |     |\n ===    |     |\n  0     1     2\n");
    }

    #[test]
    fn test_format_plan_lists_moves() {
        let text = PlanFormatter::format_plan(&one_move_plan(), false);
        assert!(text.contains("Moves: 1 (+0 idle)"));
        assert!(text.contains("0: Move stone 0 at tower 0 at position 0 to tower 1 to position 0."));
    }

    #[test]
    fn test_save_plan_formats() {
        let dir = tempdir().unwrap();
        let plan = one_move_plan();

        let json = PlanFormatter::save_plan(&plan, dir.path(), &OutputFormat::Json).unwrap();
        assert_eq!(json.file_name().unwrap(), "plan_1x2_h1.json");
        assert_eq!(Plan::load_from_file(&json).unwrap().moves, plan.moves);

        let visual = PlanFormatter::save_plan(&plan, dir.path(), &OutputFormat::Visual).unwrap();
        let content = std::fs::read_to_string(visual).unwrap();
        assert!(content.contains("Step 1:"));
    }

    #[test]
    fn test_color_output() {
        let colored = ColorOutput::colored("test", Color::Red);
        assert!(colored.contains("test"));
    }
}
