use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod config;
pub mod diff;
pub mod grafana;
pub mod metrics;
pub mod runner;
pub mod state;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Config file holding the connection profiles
    #[arg(short, long, default_value = "grafana.yaml")]
    pub config: PathBuf,

    /// Report what would change without modifying Grafana
    #[arg(short, long)]
    pub test: bool,

    /// Write Prometheus metrics to this file when done
    #[arg(long)]
    pub metrics_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Ensure that a data source is present
    Present(state::Present),

    /// Ensure that a data source is absent
    Absent(state::Absent),

    /// Apply every state declared in a YAML file
    Apply {
        /// State file
        #[arg(short, long)]
        states: PathBuf,
    },
}
