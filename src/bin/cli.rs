//! Command-line interface for the exsimo library
//!
//! This binary runs simulations, scans and the packaged experiments of the hepatic
//! glucose model, and checks or displays network definitions.
//!
//! # Usage
//!
//! ```bash
//! # Simulate the liver model for 100 minutes after setting glycogen
//! exsimo simulate --end 100 --steps 1000 --change glyglc=350 --output result.json
//!
//! # Scan blood glucose and report the last hormone values
//! exsimo scan --axis glc_ext=2:20:100 --show ins --show glu --output scan.json
//!
//! # Run a packaged experiment
//! exsimo experiment hgp_gng --output hgp_gng.json
//!
//! # Check a network definition
//! exsimo validate --model network.json
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use colored::Colorize;
use log::info;

use exsimo::{
    info::last_values_table,
    io::{
        load_definition, load_setup, load_tcsim, save_collection, save_experiment_result,
        save_result,
    },
    models::liver_glucose,
    network::consistency::{check_consistency, Severity},
    prelude::*,
};

/// Main CLI configuration struct
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by the simulating commands
#[derive(clap::Args)]
struct RunArgs {
    /// Path to a network definition; the liver glucose model if omitted
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Path to a timecourse simulation; replaces --start/--end/--steps/--change
    #[arg(short, long)]
    tcsim: Option<PathBuf>,

    /// Start time of the timecourse
    #[arg(long, default_value_t = 0.0)]
    start: f64,

    /// End time of the timecourse
    #[arg(long, default_value_t = 100.0)]
    end: f64,

    /// Number of output intervals
    #[arg(long, default_value_t = 100)]
    steps: usize,

    /// Change applied at the start, as name=value
    #[arg(short, long, value_parser = parse_change)]
    change: Vec<(String, f64)>,

    /// Path to a solver setup
    #[arg(long)]
    setup: Option<PathBuf>,

    /// Variables whose last values are printed
    #[arg(long)]
    show: Vec<String>,

    /// Path to the JSON output file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Simulate a single timecourse
    Simulate {
        #[command(flatten)]
        args: RunArgs,
    },
    /// Simulate a timecourse at every point of a parameter grid
    Scan {
        #[command(flatten)]
        args: RunArgs,

        /// Scan axis, as name=from:to:n or name=v1,v2,...
        #[arg(short, long, required = true)]
        axis: Vec<ScanAxis>,

        /// Run the grid points one after another
        #[arg(long)]
        sequential: bool,
    },
    /// Run a packaged experiment
    Experiment {
        /// Name of the experiment; lists the experiments if omitted
        name: Option<String>,

        /// Path to a solver setup
        #[arg(long)]
        setup: Option<PathBuf>,

        /// Run the grid points one after another
        #[arg(long)]
        sequential: bool,

        /// Path to the JSON output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check a network definition for consistency
    Validate {
        /// Path to a network definition; the liver glucose model if omitted
        #[arg(short, long)]
        model: Option<PathBuf>,
    },
    /// Display a network definition
    Info {
        /// Path to a network definition; the liver glucose model if omitted
        #[arg(short, long)]
        model: Option<PathBuf>,
    },
}

/// Main entry point for the CLI application
pub fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(err) = run(cli.command) {
        eprintln!("{} {:#}", "Error:".bold().red(), err);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Simulate { args } => {
            let network = ReactionNetwork::new(definition(&args.model)?)?;
            let tcsim = timecourse(&args)?;
            let setup = setup(&args.setup)?;

            let result = simulate(&network, &tcsim, &setup)?;
            println!(
                "{} {} samples of {} variables",
                "Simulated".bold().green(),
                result.len(),
                result.column_names().len()
            );
            for warning in &result.warnings {
                println!("{} {}", "Warning:".bold().yellow(), warning);
            }
            println!("{}", last_values_table(&result, &shown(&args.show)));

            if let Some(path) = &args.output {
                save_result(path, &result)?;
                info!("Wrote timecourse to {}", path.display());
            }
        }
        Commands::Scan {
            args,
            axis,
            sequential,
        } => {
            let network = ReactionNetwork::new(definition(&args.model)?)?;
            let tcsim = timecourse(&args)?;
            let setup = setup(&args.setup)?;
            let grid = ScanGrid::new(axis)?;
            grid.check(&network)?;

            let engine = ScanEngine::builder()
                .parallel(!sequential)
                .progress(true)
                .build();
            let collection = engine.run(&network, &tcsim, &setup, &grid);
            report_collection(&collection);

            for variable in shown(&args.show) {
                let values = collection.last_values(&variable)?;
                println!("{}: {}", variable.bold(), values);
            }

            if let Some(path) = &args.output {
                save_collection(path, &collection)?;
                info!("Wrote scan results to {}", path.display());
            }
        }
        Commands::Experiment {
            name,
            setup: setup_path,
            sequential,
            output,
        } => {
            let Some(name) = name else {
                for experiment in Experiment::all() {
                    println!(
                        "{:<20} {} grid points",
                        experiment.name.bold(),
                        experiment.grid.len()
                    );
                }
                return Ok(());
            };

            let experiment = Experiment::by_name(&name)
                .with_context(|| format!("Unknown experiment '{name}'"))?;
            let engine = ScanEngine::builder()
                .parallel(!sequential)
                .progress(true)
                .build();
            let result = experiment.run(&engine, &setup(&setup_path)?)?;
            report_collection(&result.collection);

            if let Some(path) = &output {
                save_experiment_result(path, &result)?;
                info!("Wrote experiment results to {}", path.display());
            }
        }
        Commands::Validate { model } => {
            let report = check_consistency(&definition(&model)?);
            for result in &report.errors {
                println!("{result}");
            }

            let n_errors = report.with_severity(Severity::Error).count();
            if !report.is_valid {
                bail!("Network definition has {n_errors} errors");
            }
            println!("{}", "Network definition is consistent".bold().green());
        }
        Commands::Info { model } => {
            println!("{}", definition(&model)?);
        }
    }

    Ok(())
}

fn definition(path: &Option<PathBuf>) -> anyhow::Result<NetworkDefinition> {
    match path {
        Some(path) => load_definition(path)
            .with_context(|| format!("Failed to load network from {}", path.display())),
        None => Ok(liver_glucose::definition()?),
    }
}

fn setup(path: &Option<PathBuf>) -> anyhow::Result<SimulationSetup> {
    match path {
        Some(path) => load_setup(path)
            .with_context(|| format!("Failed to load setup from {}", path.display())),
        None => Ok(SimulationSetup::default()),
    }
}

fn timecourse(run: &RunArgs) -> anyhow::Result<TimecourseSim> {
    if let Some(path) = &run.tcsim {
        return load_tcsim(path)
            .with_context(|| format!("Failed to load timecourse from {}", path.display()));
    }

    let timecourse = run
        .change
        .iter()
        .fold(Timecourse::new(run.start, run.end, run.steps), |tc, (name, value)| {
            tc.with_change(name.as_str(), *value)
        });
    Ok(timecourse.into())
}

fn shown(show: &[String]) -> Vec<String> {
    if show.is_empty() {
        liver_glucose::OUTPUTS.iter().map(|s| s.to_string()).collect()
    } else {
        show.to_vec()
    }
}

fn report_collection(collection: &ResultCollection) {
    println!(
        "{} {}/{} grid points",
        "Completed".bold().green(),
        collection.n_completed(),
        collection.len()
    );
    for (coordinate, failure) in collection.failures() {
        println!(
            "{} {:?} {}: {}",
            "Failed".bold().red(),
            coordinate,
            failure.kind,
            failure.message
        );
    }
}

fn parse_change(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{s}'"))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid value for '{name}': {e}"))?;
    Ok((name.trim().to_string(), value))
}
