use clap::{Args, Parser, Subcommand};
use forest_fire_core::simulation::{count_completed_rows, DEFAULT_SWEEP_VALUES};
use forest_fire_core::{
    run_sweep, CancellationToken, CellState, ChannelObserver, CsvResultSink, EnvironmentParams,
    Frame, LandscapeGenerator, LandscapeSource, ParameterInputs, RunOutcome, SimError, Simulation,
    SimulationConfig, SweepPlan,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Forest fire cellular automaton with configurable weather
#[derive(Parser, Debug)]
#[command(name = "forest-fire")]
#[command(about = "Stochastic forest fire simulation", long_about = None)]
struct Cli {
    /// JSON configuration file (landscape, environment, sweep values)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// RNG seed (random when omitted)
    #[arg(short, long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a landscape, ignite one tree and burn it to the end
    Run(RunArgs),
    /// Run every combination of environment values and append results to a CSV file
    Sweep(SweepArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Humidity (0-1)
    #[arg(long)]
    humidity: Option<String>,

    /// Precipitation strength (0-1); rain above 0.6 puts fires out
    #[arg(long)]
    precipitation_strength: Option<String>,

    /// Chance of rain per step (0-1)
    #[arg(long)]
    precipitation_chance: Option<String>,

    /// Wind strength (0-1)
    #[arg(long)]
    wind_strength: Option<String>,

    /// Print an ASCII frame every N steps (0 = only the summary)
    #[arg(short, long, default_value_t = 0)]
    frames: usize,

    /// Cancel the run after this many steps
    #[arg(long)]
    max_steps: Option<usize>,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct SweepArgs {
    /// Number of evenly spaced values per parameter in [0, 1]
    #[arg(long)]
    values: Option<usize>,

    /// Result CSV file
    #[arg(short, long, default_value = "forest_fire_results.csv")]
    output: PathBuf,

    /// Skip the combinations already stored in the output file
    #[arg(long)]
    resume: bool,

    /// Generate a new landscape for every combination
    #[arg(long)]
    regenerate: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let result = load_config(cli.config.as_deref()).and_then(|config| {
        let seed = cli.seed.unwrap_or_else(rand::random);
        info!("Seed: {}", seed);
        let rng = ChaCha8Rng::seed_from_u64(seed);
        match cli.command {
            Command::Run(args) => run_command(config, &args, rng),
            Command::Sweep(args) => sweep_command(&config, &args, rng),
        }
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<SimulationConfig, SimError> {
    match path {
        Some(path) => {
            let config = SimulationConfig::load(path)?;
            info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        None => Ok(SimulationConfig::default()),
    }
}

/// Overlay the command line values on the configured environment.
fn environment_from_args(base: EnvironmentParams, args: &RunArgs) -> Result<EnvironmentParams, SimError> {
    let mut inputs = ParameterInputs::from_params(&base);
    let overrides = [
        (&mut inputs.humidity, &args.humidity),
        (&mut inputs.precipitation_strength, &args.precipitation_strength),
        (&mut inputs.precipitation_chance, &args.precipitation_chance),
        (&mut inputs.wind_strength, &args.wind_strength),
    ];
    for (slot, value) in overrides {
        if let Some(text) = value {
            slot.clone_from(text);
        }
    }

    let mut env = base;
    env.apply_inputs(&inputs)?;
    Ok(env)
}

fn glyph(state: CellState) -> char {
    match state {
        CellState::Ground => '.',
        CellState::TreePrimary => 'T',
        CellState::TreeSecondary => 't',
        CellState::Burning => '*',
        CellState::Water => '~',
        CellState::Rock => '#',
        CellState::Burnt => '_',
    }
}

fn print_legend() {
    let entries: Vec<String> = CellState::ALL
        .iter()
        .map(|&state| format!("{} {:?}", glyph(state), state))
        .collect();
    println!("Legend: {}", entries.join(", "));
}

fn print_frame(frame: &Frame) {
    println!(
        "--- step {} | burning {}{} ---",
        frame.step,
        frame.burning,
        if frame.rain_active { " | raining" } else { "" }
    );
    for row in frame.cells.rows() {
        let line: String = row.iter().copied().map(glyph).collect();
        println!("{line}");
    }
}

fn run_command(config: SimulationConfig, args: &RunArgs, mut rng: ChaCha8Rng) -> Result<(), SimError> {
    let generator = LandscapeGenerator::new(config.landscape)?;
    let mut sim = Simulation::generate(&generator, config.environment, &mut rng)?;
    let env = environment_from_args(*sim.environment(), args)?;
    sim.set_environment(env)?;
    let ignition = sim.ignite_random(&mut rng)?;

    info!(
        "Environment: humidity {:.2}, precipitation {:.2} (chance {:.2}), wind {:.2}, ignition p = {:.3}",
        env.humidity,
        env.precipitation_strength,
        env.precipitation_chance,
        env.wind_strength,
        env.ignition_probability()
    );

    if args.frames > 0 && !args.json {
        print_legend();
    }

    let cancel = CancellationToken::new();
    let (mut observer, frames) = ChannelObserver::channel(4, 1);
    let worker_cancel = cancel.clone();
    let worker = thread::spawn(move || {
        let outcome = sim.run(&mut rng, &worker_cancel, &mut observer);
        (sim, outcome)
    });

    for frame in &frames {
        if args.frames > 0 && frame.step % args.frames == 0 {
            print_frame(&frame);
        }
        if args.max_steps.is_some_and(|max| frame.step >= max) {
            cancel.cancel();
        }
    }

    let (sim, outcome) = worker
        .join()
        .map_err(|_| SimError::InvalidState("simulation thread panicked".into()))?;
    let outcome = outcome?;

    if args.json {
        let report = serde_json::json!({
            "environment": env,
            "ignition": ignition,
            "outcome": outcome,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match outcome {
        RunOutcome::Completed(metrics) => {
            println!("\n=== Fire has stopped spreading ===");
            println!("Steps taken:     {}", metrics.steps_taken);
            println!(
                "Cells burned:    {} of {} ({:.2}%)",
                metrics.burned_count,
                metrics.total_flammable,
                metrics.burned_percent()
            );
            println!("Remaining trees: {}", sim.landscape().flammable_count());
        }
        RunOutcome::Cancelled {
            steps_taken,
            burning_remaining,
        } => {
            println!("\n=== Simulation was stopped after {steps_taken} steps ===");
            println!("Cells still burning: {burning_remaining}");
        }
    }
    Ok(())
}

fn sweep_values(config: &SimulationConfig, count: Option<usize>) -> Vec<f32> {
    match count {
        Some(0) => Vec::new(),
        Some(1) => vec![0.0],
        Some(n) => (0..n).map(|i| i as f32 / (n - 1) as f32).collect(),
        None if config.sweep_values.is_empty() => DEFAULT_SWEEP_VALUES.to_vec(),
        None => config.sweep_values.clone(),
    }
}

fn sweep_command(config: &SimulationConfig, args: &SweepArgs, mut rng: ChaCha8Rng) -> Result<(), SimError> {
    let generator = LandscapeGenerator::new(config.landscape.clone())?;
    let source = if args.regenerate {
        LandscapeSource::Regenerate(generator)
    } else {
        LandscapeSource::Reuse(Arc::new(generator.generate(&mut rng)?))
    };
    let plan = SweepPlan::new(sweep_values(config, args.values), source)?;

    let skip = if args.resume {
        count_completed_rows(&args.output)?
    } else {
        0
    };
    let mut sink = CsvResultSink::append_to_path(&args.output)?;
    info!(
        "Sweeping {} combinations into {}",
        plan.total_combinations(),
        args.output.display()
    );

    let summary = run_sweep(&plan, &mut rng, &CancellationToken::new(), &mut sink, skip)?;
    println!(
        "Simulations completed: {} run, {} skipped, {} total",
        summary.completed, summary.skipped, summary.total
    );
    Ok(())
}
