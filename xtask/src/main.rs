use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::Command;

const CONFIG_DIR: &str = "config";

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for trackway")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tests, then every shipped config validated and replayed
    Ci {
        /// Ticks per replay run
        #[arg(long, default_value = "1200")]
        ticks: u64,
    },
    /// Run the workspace tests
    Test,
    /// Validate every YAML config under config/
    Configs,
    /// Replay every shipped config and require matching state hashes
    Replay {
        #[arg(long, default_value = "1200")]
        ticks: u64,
    },
    /// Run the track streaming benchmarks
    Bench,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { ticks } => {
            cargo(&["test", "--workspace"], "workspace tests")?;
            let configs = shipped_configs()?;
            validate_configs(&configs)?;
            replay_configs(&configs, ticks)?;
        }
        Commands::Test => cargo(&["test", "--workspace"], "workspace tests")?,
        Commands::Configs => validate_configs(&shipped_configs()?)?,
        Commands::Replay { ticks } => replay_configs(&shipped_configs()?, ticks)?,
        Commands::Bench => cargo(&["bench", "-p", "trackway-stream"], "track stream benchmarks")?,
    }

    Ok(())
}

fn cargo(args: &[&str], what: &str) -> Result<()> {
    println!("==> {what}");
    let status = Command::new("cargo")
        .args(args)
        .status()
        .with_context(|| format!("spawning cargo for {what}"))?;
    if !status.success() {
        anyhow::bail!("{what} failed");
    }
    Ok(())
}

fn shipped_configs() -> Result<Vec<PathBuf>> {
    let mut configs: Vec<_> = std::fs::read_dir(CONFIG_DIR)
        .with_context(|| format!("reading {CONFIG_DIR}/"))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "yaml"))
        .collect();
    if configs.is_empty() {
        anyhow::bail!("no configs found under {CONFIG_DIR}/");
    }
    configs.sort();
    Ok(configs)
}

fn cli(args: &[&str], config: &PathBuf, what: &str) -> Result<()> {
    println!("==> {what} {}", config.display());
    let status = Command::new("cargo")
        .args(["run", "-q", "-p", "trackway-cli", "--"])
        .args(args)
        .arg(config)
        .status()?;
    if !status.success() {
        anyhow::bail!("{what} failed for {}", config.display());
    }
    Ok(())
}

fn validate_configs(configs: &[PathBuf]) -> Result<()> {
    for config in configs {
        cli(&["validate"], config, "validate")?;
    }
    Ok(())
}

fn replay_configs(configs: &[PathBuf], ticks: u64) -> Result<()> {
    let ticks = ticks.to_string();
    for config in configs {
        cli(&["replay", "--ticks", &ticks, "--config"], config, "replay")?;
    }
    Ok(())
}
