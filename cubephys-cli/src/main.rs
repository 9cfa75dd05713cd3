use clap::{Parser, Subcommand};
use cubephys_core::{run_scenario, run_scenario_source, Scenario, SimulationResult};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "cubephys")]
#[command(about = "Cubephys - particles, springs and a rotating cube", long_about = None)]
struct Cli {
    /// Log filter, e.g. "cubephys_core=debug"
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a JSON scenario
    Run {
        /// Path to the scenario file
        file: PathBuf,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fire a laser at the cube
    Demo {
        /// Number of frames to simulate
        #[arg(long, default_value_t = 120)]
        frames: usize,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log.as_deref());

    let outcome = match cli.command {
        Commands::Run { file, json } => run_file(&file).and_then(|result| print_result(&result, json)),
        Commands::Demo { frames, json } => run_scenario(&Scenario::demo(frames))
            .map_err(Into::into)
            .and_then(|result| print_result(&result, json)),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(filter: Option<&str>) {
    let filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("cubephys=info")),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run_file(file: &PathBuf) -> Result<SimulationResult, Box<dyn std::error::Error>> {
    let source = fs::read_to_string(file)?;
    tracing::info!(file = %file.display(), "running scenario");
    Ok(run_scenario_source(&source)?)
}

fn print_result(result: &SimulationResult, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    println!(
        "frames = {}, substeps = {}, collisions = {}, elapsed = {:.3}",
        result.frames, result.substeps, result.collisions, result.elapsed
    );
    for body in &result.bodies {
        println!(
            "{} {} pos=({:.3}, {:.3}, {:.3}) orient=({:.3}, {:.3}, {:.3})",
            body.label,
            if body.active { "active" } else { "inactive" },
            body.position.x,
            body.position.y,
            body.position.z,
            body.orientation.x,
            body.orientation.y,
            body.orientation.z,
        );
    }

    Ok(())
}
