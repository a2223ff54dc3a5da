mod boot;
mod duty;
mod events;
mod notification;
mod publish;
mod sensor;
#[cfg(test)]
mod testing;
mod tracking;
mod web;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use crate::duty::{DutyStore, FileDutyStore};
use crate::tracking::{FASTEST_INTERVAL, MAX_INTERVAL};
use crate::web::Config;

#[derive(Parser)]
#[command(name = "duty-beacon")]
#[command(about = "On-duty location tracking agent")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the agent: resume tracking if the worker was on duty, then serve commands
    Serve { config: String },
    /// Validate a config file
    Validate { config: String },
    /// Print the persisted duty state
    State { config: String },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => serve(&config),
        Commands::Validate { config } => validate(&config),
        Commands::State { config } => state(&config),
    }
}

fn load_config(path: &str) -> Option<Config> {
    match Config::from_file(path) {
        Ok(config) => Some(config),
        Err(e) => {
            eprintln!("Error loading config {}: {}", path, e);
            None
        }
    }
}

fn serve(path: &str) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(web::run_server(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Agent failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn validate(path: &str) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };

    println!("Config is valid");
    println!("  state file: {}", config.agent.state_file.display());
    println!("  listen:     {}", config.web.bind);
    println!("  sensor:     {}", config.sensor.describe());
    println!("  remote:     {}", config.remote.describe());
    println!(
        "  sampling:   every {} to {}",
        humantime::format_duration(FASTEST_INTERVAL),
        humantime::format_duration(MAX_INTERVAL)
    );
    ExitCode::SUCCESS
}

fn state(path: &str) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };

    let store = FileDutyStore::new(config.agent.state_file);
    match store.get() {
        Ok(Some(state)) => {
            match state.resumable_worker() {
                Ok(Some(worker_id)) => println!("On duty: {}", worker_id),
                Ok(None) => println!("Off duty"),
                Err(e) => println!("Malformed ({}), tracking will not resume", e),
            }
            ExitCode::SUCCESS
        }
        Ok(None) => {
            println!("No duty state at {}", store.path().display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error reading {}: {}", store.path().display(), e);
            ExitCode::FAILURE
        }
    }
}
