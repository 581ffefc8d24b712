use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, bail};
use flow_panel::{PanelConfig, PanelPipeline};
use log::{error, info};

const USAGE: &str = "\
Usage: flow-panel <command> <config.json>

Commands:
  run      Extract the configured sources and build the balanced panel
  balance  Build the balanced panel from the stored aggregate";

enum Command {
    Run,
    Balance,
}

fn parse_args() -> anyhow::Result<(Command, PathBuf)> {
    let mut args = std::env::args().skip(1);
    let command = match args.next().as_deref() {
        Some("run") => Command::Run,
        Some("balance") => Command::Balance,
        Some(other) => bail!("Unknown command '{other}'\n\n{USAGE}"),
        None => bail!("{USAGE}"),
    };
    let Some(config) = args.next() else {
        bail!("Missing configuration file\n\n{USAGE}");
    };
    Ok((command, PathBuf::from(config)))
}

fn run() -> anyhow::Result<()> {
    let (command, config_path) = parse_args()?;
    let config = PanelConfig::from_json_file(&config_path)
        .with_context(|| format!("Failed to load configuration {}", config_path.display()))?;
    let pipeline = PanelPipeline::new(config);

    let (_, report) = match command {
        Command::Run => pipeline.run().context("Panel run failed")?,
        Command::Balance => pipeline
            .run_balance_only()
            .context("Balance-only run failed")?,
    };

    info!(
        "Balanced panel written to {}",
        pipeline.config().output_path.display()
    );
    println!("{}", report.summary());
    Ok(())
}

fn main() -> ExitCode {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
