mod cli;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use detectviz_core::config::{ConfigData, PluginEntry, RuntimeConfig};
use detectviz_core::health::HealthReport;
use detectviz_core::kernel::constants::APP_NAME;
use detectviz_core::{CancellationToken, KernelError, Platform};
use log::{info, warn};

// --- Core Plugins for Static Registration ---
use core_environment_check::EnvironmentCheckPlugin;
use core_logging::LoggingPlugin;

use cli::{CliArgs, Commands, PluginCommand};

type Result<T> = std::result::Result<T, KernelError>;

const CORE_PLUGINS: [&str; 2] = [core_logging::PLUGIN_NAME, core_environment_check::PLUGIN_NAME];

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: CliArgs) -> Result<ExitCode> {
    let config = load_config(&args)?;
    let mut platform = Platform::new(config)?;
    register_core_plugins(&mut platform).await?;
    platform.init_all().await?;

    match args.command {
        Commands::Health { json, details } => health(&platform, json, details).await,
        Commands::Plugins { command: PluginCommand::List } => list_plugins(&platform).await,
        Commands::Run { seconds } => run_until_stopped(&platform, seconds).await,
    }
}

fn load_config(args: &CliArgs) -> Result<RuntimeConfig> {
    let mut config = match &args.config {
        Some(path) => RuntimeConfig::load(path)?,
        None => RuntimeConfig::default(),
    };

    if let Some(level) = &args.log_level {
        let index = match config.plugins.iter().position(|e| e.name == core_logging::PLUGIN_NAME) {
            Some(index) => index,
            None => {
                config.plugins.push(PluginEntry {
                    name: core_logging::PLUGIN_NAME.to_string(),
                    kind: "logging".to_string(),
                    enabled: true,
                    config: ConfigData::new(),
                });
                config.plugins.len() - 1
            }
        };
        config.plugins[index].config.set("level", level)?;
    }
    Ok(config)
}

/// Register the statically linked plugins in the container and install them.
async fn register_core_plugins(platform: &mut Platform) -> Result<()> {
    let container = Arc::clone(platform.container());
    container.register_singleton::<LoggingPlugin, _, _>(|_: ()| Arc::new(LoggingPlugin::new()))?;
    container.register_singleton::<EnvironmentCheckPlugin, _, _>(|_: ()| Arc::new(EnvironmentCheckPlugin::new()))?;

    platform.install::<LoggingPlugin>(core_logging::PLUGIN_NAME).await?;
    platform.install::<EnvironmentCheckPlugin>(core_environment_check::PLUGIN_NAME).await?;

    for entry in &platform.config().plugins {
        if !CORE_PLUGINS.contains(&entry.name.as_str()) {
            warn!("Configured plugin '{}' ({}) is not available in this build", entry.name, entry.kind);
        }
    }
    Ok(())
}

async fn health(platform: &Platform, json: bool, details: bool) -> Result<ExitCode> {
    platform.health().check_now().await;
    let report = platform.health().report(details).await;
    platform.shutdown().await?;

    if json {
        let rendered = report
            .to_json()
            .map_err(|e| KernelError::Other(format!("Failed to render health report: {}", e)))?;
        println!("{}", rendered);
    } else {
        print_report(&report);
    }

    Ok(if report.status.is_operational() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_report(report: &HealthReport) {
    println!("Overall: {} - {}", report.status, report.message);
    for (name, plugin) in &report.plugins {
        if plugin.message.is_empty() {
            println!("  - {}: {} ({:?})", name, plugin.status, plugin.duration);
        } else {
            println!("  - {}: {} - {} ({:?})", name, plugin.status, plugin.message, plugin.duration);
        }
    }
}

async fn list_plugins(platform: &Platform) -> Result<ExitCode> {
    let names = platform.plugin_names();
    if names.is_empty() {
        println!("No plugins registered.");
    } else {
        println!("Registered plugins:");
        for name in names {
            let metadata = platform.registry().get_metadata(name).await?;
            let field = |key: &str| {
                metadata
                    .get(key)
                    .and_then(|value| value.as_str())
                    .unwrap_or("-")
                    .to_string()
            };
            println!("  - Name: {}, Status: {}, Type: {}", name, field("status"), field("type"));
        }
    }
    platform.shutdown().await?;
    Ok(ExitCode::SUCCESS)
}

async fn run_until_stopped(platform: &Platform, seconds: Option<u64>) -> Result<ExitCode> {
    let token = CancellationToken::new();
    platform.start_all(&token).await?;
    println!("{} running with {} plugins", APP_NAME, platform.plugin_names().len());

    let deadline = async {
        match seconds {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Received Ctrl-C"),
        _ = deadline => info!("Run time elapsed"),
    }

    let overall = platform.health().get_overall_health_status().await;
    let shutdown = platform.shutdown().await;
    token.cancel();
    shutdown?;

    println!("Last health status: {} - {}", overall.status, overall.message);
    println!("Stopped.");
    Ok(ExitCode::SUCCESS)
}
