use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Detectviz: plugin runtime with dependency injection and health monitoring
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Runtime configuration file (.json, .yaml/.yml or .toml)
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter handed to the logging plugin (e.g. "debug" or "detectviz_core=trace")
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one health check pass and print the report
    Health {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        /// Include per-plugin results
        #[arg(long)]
        details: bool,
    },
    /// Inspect managed plugins
    Plugins {
        #[command(subcommand)]
        command: PluginCommand,
    },
    /// Start all plugins and poll health until Ctrl-C
    Run {
        /// Stop after this many seconds instead of waiting for Ctrl-C
        #[arg(long)]
        seconds: Option<u64>,
    },
}

#[derive(Subcommand, Debug)]
pub enum PluginCommand {
    /// List registered plugins with their metadata
    List,
}
