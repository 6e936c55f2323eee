//! `rotor` - scheduled UUID rotation for xray client lists
//!
//! Meant to be run periodically (cron, systemd timer). Each invocation is a
//! single reconciliation; overlapping runs on the same files must be
//! prevented by the scheduler (e.g. `flock`).
//!
//! Exit status: 0 on success, 1 on a fatal error (nothing or only part of
//! the run was applied), 2 when the run completed but a reload or
//! notification failed.

mod settings;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use rotor_credential::{RotationPolicy, RotorConfig, Rotator};
use tracing::error;

use settings::{Overrides, Settings};

/// Exit status when the run completed but a sink failed
const EXIT_SINK_FAILURE: u8 = 2;

#[derive(Parser)]
#[command(name = "rotor", version, about = "Rotate proxy client UUIDs on a schedule", long_about = None)]
struct Cli {
    /// Configuration file (TOML); missing file means defaults
    #[arg(short, long, env = "ROTOR_CONFIG", default_value = "/etc/rotor/rotor.toml")]
    config: PathBuf,

    /// Rotation state file
    #[arg(long, value_name = "FILE")]
    state: Option<PathBuf>,

    /// Proxy configuration file
    #[arg(long = "xray-config", value_name = "FILE")]
    xray_config: Option<PathBuf>,

    /// Rotation policy: accumulate or handoff
    #[arg(long)]
    policy: Option<RotationPolicy>,

    /// Log filter (e.g. "debug", "info,rotor_credential=trace")
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one rotation
    Run {
        /// Compute and print the outcome without writing files or calling sinks
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the rotation state and live clients as JSON
    Status,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let overrides = Overrides {
        state_path: cli.state.clone(),
        config_path: cli.xray_config.clone(),
        policy: cli.policy,
    };
    let settings = match Settings::load(&cli.config, &overrides) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("rotor: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = rotor_log::init_with(settings.log_config(cli.log_level.as_deref())) {
        eprintln!("rotor: {err}");
        return ExitCode::FAILURE;
    }

    match execute(cli.command, &settings.rotor).await {
        Ok(code) => code,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn execute(command: Command, config: &RotorConfig) -> anyhow::Result<ExitCode> {
    let reload = config.reload.build().context("invalid reload configuration")?;
    let rotator =
        Rotator::with_configured_notifier(config, reload).context("invalid configuration")?;

    match command {
        Command::Run { dry_run: true } => {
            let report = rotator.dry_run(Utc::now()).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Run { dry_run: false } => {
            let report = rotator.run(Utc::now()).await?;
            if report.is_clean() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(EXIT_SINK_FAILURE))
            }
        }
        Command::Status => {
            let status = rotator.status().await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}
