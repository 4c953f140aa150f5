//! sitegate-cli - drive the admission kernel against a JSON fixture.
//!
//! ```text
//! sitegate-cli --fixture fixtures/site.json start --actor 10 --assignment 1 --lat 40.7130 --lon -74.0062
//! sitegate-cli --fixture fixtures/site.json check --actor 10 --assignment 3
//! ```
//!
//! The response envelope is printed to stdout, followed by the location audit
//! log. Tracing goes to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use sitegate_core::app::{
    PositionInput, ProgressRequest, StartRequest, handle_check, handle_progress, handle_start,
};
use sitegate_core::domain::{EmployeeId, Project, TaskAssignment};
use sitegate_core::impls::{InMemoryAssignmentStore, InMemoryLocationLog, InMemoryProjectDirectory};
use sitegate_core::{AdmissionBuilder, AdmissionConfig};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Field-service start/progress admission demo
#[derive(Parser)]
#[command(name = "sitegate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON fixture with `projects` and `assignments`
    #[arg(long, env = "SITEGATE_FIXTURE", global = true)]
    fixture: Option<PathBuf>,

    /// TOML admission config (accuracy policy, write attempts)
    #[arg(long, env = "SITEGATE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a queued assignment
    Start {
        #[command(flatten)]
        target: Target,
        #[command(flatten)]
        position: PositionArgs,
    },
    /// Report progress on a started assignment
    Progress {
        #[command(flatten)]
        target: Target,
        /// New progress percentage (0-100)
        #[arg(long, allow_negative_numbers = true)]
        percent: i64,
        /// Free-text note stored with the update
        #[arg(long, default_value = "")]
        description: String,
        #[command(flatten)]
        position: PositionArgs,
    },
    /// Evaluate every start gate without writing
    Check {
        #[command(flatten)]
        target: Target,
        #[command(flatten)]
        position: PositionArgs,
    },
}

#[derive(Args)]
struct Target {
    /// Acting employee id
    #[arg(long)]
    actor: u64,
    /// Assignment id
    #[arg(long, allow_negative_numbers = true)]
    assignment: i64,
}

#[derive(Args)]
struct PositionArgs {
    #[arg(long, allow_negative_numbers = true)]
    lat: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    lon: Option<f64>,
    /// Reported accuracy radius in meters
    #[arg(long)]
    accuracy: Option<f64>,
}

impl PositionArgs {
    fn into_input(self) -> Option<PositionInput> {
        if self.lat.is_none() && self.lon.is_none() {
            return None;
        }
        Some(PositionInput {
            latitude: self.lat,
            longitude: self.lon,
            accuracy: self.accuracy,
            timestamp: None,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct Fixture {
    #[serde(default)]
    projects: Vec<Project>,
    #[serde(default)]
    assignments: Vec<TaskAssignment>,
}

fn load_fixture(path: Option<&PathBuf>) -> Result<Fixture> {
    let Some(path) = path else {
        return Ok(Fixture::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read fixture {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid fixture {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = match &cli.config {
        Some(path) => AdmissionConfig::load(path)?,
        None => AdmissionConfig::default(),
    };
    let fixture = load_fixture(cli.fixture.as_ref())?;
    info!(
        projects = fixture.projects.len(),
        assignments = fixture.assignments.len(),
        lenient_accuracy = config.accuracy.lenient,
        "fixture loaded"
    );

    let log = Arc::new(InMemoryLocationLog::new());
    let machine = AdmissionBuilder::new()
        .assignments(Arc::new(InMemoryAssignmentStore::with_assignments(
            fixture.assignments,
        )))
        .projects(Arc::new(InMemoryProjectDirectory::with_projects(
            fixture.projects,
        )))
        .location_log(log.clone())
        .config(config)
        .build()?;

    match cli.command {
        Commands::Start { target, position } => {
            let request = StartRequest {
                assignment_id: Some(target.assignment),
                position: position.into_input(),
            };
            let response = handle_start(&machine, EmployeeId::new(target.actor), request).await;
            print_json(&response)?;
        }
        Commands::Progress {
            target,
            percent,
            description,
            position,
        } => {
            let request = ProgressRequest {
                assignment_id: Some(target.assignment),
                progress_percent: Some(percent),
                description: Some(description),
                position: position.into_input(),
            };
            let response =
                handle_progress(&machine, EmployeeId::new(target.actor), request).await;
            print_json(&response)?;
        }
        Commands::Check { target, position } => {
            let request = StartRequest {
                assignment_id: Some(target.assignment),
                position: position.into_input(),
            };
            let response = handle_check(&machine, EmployeeId::new(target.actor), request).await;
            print_json(&response)?;
        }
    }

    let entries = log.entries().await;
    if !entries.is_empty() {
        println!("--- location log ---");
        print_json(&entries)?;
    }

    Ok(())
}
