//! Configuration settings for the Hanoi SAT planner

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub planner: PlannerConfig,
    pub encoding: EncodingConfig,
    pub solver: SolverConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    pub stones: usize,
    pub towers: usize,
    pub horizon: usize,
    pub initial_tower: usize,
    pub target_tower: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodingConfig {
    pub frame_axioms: FrameAxioms,
    pub symmetry_pruning: bool,
}

/// How unaffected stones are carried from one step to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameAxioms {
    /// One clause per (action, other stone, slot)
    Explicit,
    /// One clause per (stone, slot) listing the actions that may move it away
    SuccessorState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    pub backend: SolverBackend,
    pub timeout_seconds: u64,
    /// Command line for the external backend, with `{input}` and `{output}` placeholders
    pub external_command: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SolverBackend {
    Cadical,
    External,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub output_directory: PathBuf,
    pub cnf_file: PathBuf,
    pub annotate_clauses: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Text,
    Json,
    Visual,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            planner: PlannerConfig {
                stones: 3,
                towers: 3,
                horizon: 7,
                initial_tower: 0,
                target_tower: 1,
            },
            encoding: EncodingConfig {
                frame_axioms: FrameAxioms::Explicit,
                symmetry_pruning: false,
            },
            solver: SolverConfig {
                backend: SolverBackend::Cadical,
                timeout_seconds: 300,
                external_command: "minisat {input} {output}".to_string(),
            },
            output: OutputConfig {
                format: OutputFormat::Text,
                output_directory: PathBuf::from("output/plans"),
                cnf_file: PathBuf::from("hanoi.cnf"),
                annotate_clauses: false,
            },
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Settings = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a YAML file
    pub fn to_file(&self, path: &PathBuf) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .context("Failed to serialize settings")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        let planner = &self.planner;

        if planner.stones == 0 {
            anyhow::bail!("Number of stones must be positive");
        }

        if planner.towers < 2 {
            anyhow::bail!("At least two towers are required, got {}", planner.towers);
        }

        if planner.initial_tower >= planner.towers {
            anyhow::bail!("Initial tower {} out of range (towers: {})", planner.initial_tower, planner.towers);
        }

        if planner.target_tower >= planner.towers {
            anyhow::bail!("Target tower {} out of range (towers: {})", planner.target_tower, planner.towers);
        }

        if self.solver.backend == SolverBackend::External {
            let command = &self.solver.external_command;
            if command.split_whitespace().next().is_none() {
                anyhow::bail!("External solver command is empty");
            }
            if !command.contains("{input}") || !command.contains("{output}") {
                anyhow::bail!("External solver command must contain {{input}} and {{output}} placeholders");
            }
        }

        Ok(())
    }

    /// Merge settings with command line overrides
    pub fn merge_with_cli(&mut self, cli_overrides: &CliOverrides) {
        if let Some(stones) = cli_overrides.stones {
            self.planner.stones = stones;
        }
        if let Some(towers) = cli_overrides.towers {
            self.planner.towers = towers;
        }
        if let Some(horizon) = cli_overrides.horizon {
            self.planner.horizon = horizon;
        }
        if let Some(initial_tower) = cli_overrides.initial_tower {
            self.planner.initial_tower = initial_tower;
        }
        if let Some(target_tower) = cli_overrides.target_tower {
            self.planner.target_tower = target_tower;
        }
        if let Some(frame_axioms) = cli_overrides.frame_axioms {
            self.encoding.frame_axioms = frame_axioms;
        }
        if let Some(backend) = cli_overrides.backend {
            self.solver.backend = backend;
        }
        if let Some(ref output_dir) = cli_overrides.output_dir {
            self.output.output_directory = output_dir.clone();
        }
    }
}

/// Command line overrides for settings
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub stones: Option<usize>,
    pub towers: Option<usize>,
    pub horizon: Option<usize>,
    pub initial_tower: Option<usize>,
    pub target_tower: Option<usize>,
    pub frame_axioms: Option<FrameAxioms>,
    pub backend: Option<SolverBackend>,
    pub output_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_parameters() {
        let mut settings = Settings::default();
        settings.planner.towers = 1;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.planner.stones = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.planner.target_tower = 3;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.solver.backend = SolverBackend::External;
        settings.solver.external_command = "minisat {input}".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_horizon_zero_is_allowed() {
        let mut settings = Settings::default();
        settings.planner.horizon = 0;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_yaml_round_trip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config/planner.yaml");

        let mut settings = Settings::default();
        settings.planner.stones = 2;
        settings.encoding.frame_axioms = FrameAxioms::SuccessorState;
        settings.to_file(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("frame_axioms: successor_state"));

        let loaded = Settings::from_file(&path).unwrap();
        assert_eq!(loaded.planner.stones, 2);
        assert_eq!(loaded.encoding.frame_axioms, FrameAxioms::SuccessorState);
    }

    #[test]
    fn test_cli_overrides() {
        let mut settings = Settings::default();
        let overrides = CliOverrides {
            horizon: Some(3),
            target_tower: Some(2),
            backend: Some(SolverBackend::External),
            ..CliOverrides::default()
        };
        settings.merge_with_cli(&overrides);

        assert_eq!(settings.planner.horizon, 3);
        assert_eq!(settings.planner.target_tower, 2);
        assert_eq!(settings.planner.stones, 3);
        assert_eq!(settings.solver.backend, SolverBackend::External);
    }
}
