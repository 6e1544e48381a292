//! Main CLI application for the Hanoi SAT planner

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use hanoi_sat_planner::{
    config::{CliOverrides, FrameAxioms, Settings, SolverBackend},
    plan::{PlanOutcome, PlanValidator, PlanningProblem},
    sat::{parse_solver_output, PlanEncoder, SolverOutcome},
    utils::{ColorOutput, PlanFormatter},
};
use log::debug;
use std::fs::File;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "hanoi_sat_planner")]
#[command(about = "Tower of Hanoi planning through SAT")]
#[command(version = "0.1.0")]
struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Planner parameters shared by every problem-level subcommand
#[derive(Args, Debug, Clone)]
struct PlannerArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.yaml")]
    config: PathBuf,

    /// Number of stones (overrides config)
    #[arg(short, long)]
    stones: Option<usize>,

    /// Number of towers (overrides config)
    #[arg(short, long)]
    towers: Option<usize>,

    /// Plan length (overrides config)
    #[arg(long)]
    horizon: Option<usize>,

    /// Tower holding the stones at step 0 (overrides config)
    #[arg(long)]
    initial_tower: Option<usize>,

    /// Tower holding the stones after the last step (overrides config)
    #[arg(long)]
    target_tower: Option<usize>,

    /// Frame axiom encoding (overrides config)
    #[arg(long, value_enum)]
    frame_axioms: Option<FrameAxiomsArg>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FrameAxiomsArg {
    Explicit,
    SuccessorState,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendArg {
    Cadical,
    External,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode, solve and decode one planning problem
    Solve {
        #[command(flatten)]
        planner: PlannerArgs,

        /// Solver backend (overrides config)
        #[arg(short, long, value_enum)]
        backend: Option<BackendArg>,

        /// Output directory (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show the board after every step
        #[arg(long)]
        show_boards: bool,
    },

    /// Write the plan formula in DIMACS format
    Encode {
        #[command(flatten)]
        planner: PlannerArgs,

        /// CNF file (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Render clauses with their predicate keys instead of plain DIMACS
        #[arg(long)]
        annotated: bool,
    },

    /// Decode a solver result file produced for an encoded formula
    Decode {
        #[command(flatten)]
        planner: PlannerArgs,

        /// Solver result file (`SAT` followed by the model, or `UNSAT`)
        #[arg(long)]
        solution: PathBuf,

        /// Show the board after every step
        #[arg(long)]
        show_boards: bool,
    },

    /// Report formula size and complexity without solving
    Analyze {
        #[command(flatten)]
        planner: PlannerArgs,
    },

    /// Create example configuration files
    Setup {
        /// Directory to create files in
        #[arg(short, long, default_value = ".")]
        directory: PathBuf,

        /// Force overwrite existing files
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Commands::Solve { planner, backend, output, show_boards } => {
            solve_command(planner, backend, output, show_boards)
        }
        Commands::Encode { planner, output, annotated } => encode_command(planner, output, annotated),
        Commands::Decode { planner, solution, show_boards } => {
            decode_command(planner, solution, show_boards)
        }
        Commands::Analyze { planner } => analyze_command(planner),
        Commands::Setup { directory, force } => setup_command(directory, force),
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Warn
    };
    simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )
    .context("Failed to initialize logger")
}

/// Load the configuration file (or defaults) and apply command line overrides
fn load_settings(args: &PlannerArgs, overrides: CliOverrides) -> Result<Settings> {
    let mut settings = if args.config.exists() {
        Settings::from_file(&args.config)
            .with_context(|| format!("Failed to load config from {}", args.config.display()))?
    } else {
        println!(
            "{}",
            ColorOutput::warning(&format!("Config file {} not found, using defaults", args.config.display()))
        );
        Settings::default()
    };

    let overrides = CliOverrides {
        stones: args.stones,
        towers: args.towers,
        horizon: args.horizon,
        initial_tower: args.initial_tower,
        target_tower: args.target_tower,
        frame_axioms: args.frame_axioms.map(|mode| match mode {
            FrameAxiomsArg::Explicit => FrameAxioms::Explicit,
            FrameAxiomsArg::SuccessorState => FrameAxioms::SuccessorState,
        }),
        ..overrides
    };
    settings.merge_with_cli(&overrides);

    settings.validate().context("Configuration validation failed")?;
    debug!("Effective settings: {:?}", settings);
    Ok(settings)
}

fn solve_command(
    args: PlannerArgs,
    backend: Option<BackendArg>,
    output_dir: Option<PathBuf>,
    show_boards: bool,
) -> Result<()> {
    let overrides = CliOverrides {
        backend: backend.map(|backend| match backend {
            BackendArg::Cadical => SolverBackend::Cadical,
            BackendArg::External => SolverBackend::External,
        }),
        output_dir,
        ..CliOverrides::default()
    };
    let settings = load_settings(&args, overrides)?;
    let planner = &settings.planner;

    println!(
        "{}",
        ColorOutput::info(&format!(
            "Planning {} stones on {} towers, tower {} to tower {}, horizon {}",
            planner.stones, planner.towers, planner.initial_tower, planner.target_tower, planner.horizon
        ))
    );

    let start_time = Instant::now();
    let mut problem = PlanningProblem::new(settings.clone()).context("Failed to create planning problem")?;
    let outcome = problem.solve().context("Failed to solve planning problem")?;
    let total_time = start_time.elapsed();

    let plan = match outcome {
        PlanOutcome::Found(plan) => plan,
        PlanOutcome::NotFound { horizon } => {
            println!(
                "{}",
                ColorOutput::warning(&format!("No plan with exactly {} steps; try a longer horizon", horizon))
            );
            return Ok(());
        }
    };

    println!(
        "{}",
        ColorOutput::success(&format!("Found a plan in {:.3}s", total_time.as_secs_f64()))
    );
    println!("\n{}", PlanFormatter::format_plan(&plan, show_boards));

    let path = PlanFormatter::save_plan(&plan, &settings.output.output_directory, &settings.output.format)
        .context("Failed to save plan")?;
    println!("{}", ColorOutput::success(&format!("Plan saved to {}", path.display())));

    debug!("\n{}", problem.encoding_statistics());
    Ok(())
}

fn encode_command(args: PlannerArgs, output: Option<PathBuf>, annotated: bool) -> Result<()> {
    let settings = load_settings(&args, CliOverrides::default())?;
    let path = output.unwrap_or_else(|| settings.output.cnf_file.clone());
    let annotated = annotated || settings.output.annotate_clauses;

    let mut encoder = PlanEncoder::new(&settings);
    let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    let size = if annotated {
        encoder.write_annotated(file)?
    } else {
        encoder.write_dimacs(file)?
    };

    println!(
        "{}",
        ColorOutput::success(&format!(
            "Wrote {} variables and {} clauses to {}",
            size.variables,
            size.clauses,
            path.display()
        ))
    );
    Ok(())
}

fn decode_command(args: PlannerArgs, solution_path: PathBuf, show_boards: bool) -> Result<()> {
    let settings = load_settings(&args, CliOverrides::default())?;

    // Numbering is deterministic, so one counting pass rebuilds the registry the file was written with
    let mut encoder = PlanEncoder::new(&settings);
    let size = encoder.formula_size();
    debug!("Rebuilt registry with {} variables", size.variables);

    let text = std::fs::read_to_string(&solution_path)
        .with_context(|| format!("Failed to read {}", solution_path.display()))?;
    let solution = match parse_solver_output(&text)
        .with_context(|| format!("Malformed solver output in {}", solution_path.display()))?
    {
        SolverOutcome::Satisfiable(solution) => solution,
        SolverOutcome::Unsatisfiable => {
            println!(
                "{}",
                ColorOutput::warning(&format!("Solver reports no plan with {} steps", encoder.horizon()))
            );
            return Ok(());
        }
    };

    let plan = encoder
        .decode(&solution.valuation)
        .context("Failed to decode solver model")?;

    let result = PlanValidator::new(settings).validate(&plan);
    println!("{}", PlanFormatter::format_plan(&plan, show_boards));
    println!("{}", result);

    if result.is_valid {
        println!("{}", ColorOutput::success("Plan is valid"));
    } else {
        println!("{}", ColorOutput::error("Plan is invalid"));
    }
    Ok(())
}

fn analyze_command(args: PlannerArgs) -> Result<()> {
    let settings = load_settings(&args, CliOverrides::default())?;
    let problem = PlanningProblem::new(settings).context("Failed to create problem for analysis")?;

    println!("{}", problem.estimate_complexity());
    println!("{}", problem.encoding_statistics());
    Ok(())
}

fn setup_command(directory: PathBuf, force: bool) -> Result<()> {
    println!("{}", ColorOutput::info("Setting up project structure..."));

    let config_dir = directory.join("config");
    let output_dir = directory.join("output/plans");

    for dir in [&config_dir, &output_dir] {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    let config_path = config_dir.join("default.yaml");
    if !config_path.exists() || force {
        Settings::default()
            .to_file(&config_path)
            .context("Failed to create default configuration")?;
        println!("Created: {}", config_path.display());
    } else {
        println!("Skipped: {} (already exists)", config_path.display());
    }

    let examples_dir = config_dir.join("examples");
    std::fs::create_dir_all(&examples_dir)?;

    let mut small = Settings::default();
    small.planner.stones = 2;
    small.planner.horizon = 3;
    small.to_file(&examples_dir.join("small.yaml"))?;

    let mut compact = Settings::default();
    compact.planner.stones = 4;
    compact.planner.horizon = 15;
    compact.encoding.frame_axioms = FrameAxioms::SuccessorState;
    compact.encoding.symmetry_pruning = true;
    compact.to_file(&examples_dir.join("compact.yaml"))?;

    let mut external = Settings::default();
    external.solver.backend = SolverBackend::External;
    external.output.cnf_file = PathBuf::from("output/hanoi.cnf");
    external.to_file(&examples_dir.join("external.yaml"))?;

    println!("Created example configurations in: {}", examples_dir.display());
    println!("\n{}", ColorOutput::success("Setup complete!"));
    println!("\nNext steps:");
    println!("1. Edit configuration files in {}", config_dir.display());
    println!("2. Run: cargo run -- solve --config config/default.yaml");

    Ok(())
}
