use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use trackway_config::SimConfig;
use trackway_kernel::World;

mod sim;
mod vehicle;

use sim::Session;

#[derive(Parser)]
#[command(name = "trackway-cli", about = "Headless driver for endless track streaming and traffic")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Load and validate a session config
    Validate {
        /// Path to a YAML config
        config: PathBuf,
    },
    /// Print the built-in default config as YAML
    DefaultConfig,
    /// Run a headless session and print a summary
    Run {
        /// Path to a YAML config (built-in defaults if omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override the number of ticks
        #[arg(short, long)]
        ticks: Option<u64>,
        /// Override the RNG seed
        #[arg(short, long)]
        seed: Option<u64>,
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run a session, replay its event log and compare state hashes
    Replay {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long, default_value = "600")]
        ticks: u64,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SimConfig> {
    match path {
        Some(path) => Ok(SimConfig::load(path)?),
        None => Ok(SimConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("trackway-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", trackway_common::crate_info());
            println!("kernel: {}", trackway_kernel::crate_info());
            println!("stream: {}", trackway_stream::crate_info());
            println!("traffic: {}", trackway_traffic::crate_info());
            println!("config: {}", trackway_config::crate_info());
        }
        Commands::Validate { config } => {
            let loaded = SimConfig::load(&config)?;
            println!(
                "{}: OK (segments={}x{}, rivals={}, seed={})",
                config.display(),
                loaded.track.max_segments,
                loaded.track.segment_length,
                loaded.traffic.count,
                loaded.seed
            );
        }
        Commands::DefaultConfig => {
            print!("{}", SimConfig::default().to_yaml_string()?);
        }
        Commands::Run {
            config,
            ticks,
            seed,
            json,
        } => {
            let mut config = load_config(config.as_ref())?;
            if let Some(seed) = seed {
                config.seed = seed;
            }
            let ticks = ticks.unwrap_or(config.ticks);

            let mut session = Session::new(config)?;
            let report = session.run(ticks);
            session.teardown();

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Run: seed={}, ticks={}", report.seed, report.ticks);
                println!(
                    "Player: {:.1} units along the track",
                    report.player_distance
                );
                println!(
                    "Window: {} segments from offset {:?}, {} obstacles",
                    report.active_segments, report.window_front, report.active_obstacles
                );
                println!(
                    "Streamed: {} spawned, {} evicted, {} obstacles placed, {} destroyed",
                    report.totals.segments_spawned,
                    report.totals.segments_evicted,
                    report.totals.obstacles_spawned,
                    report.totals.obstacles_destroyed
                );
                for (i, rival) in report.rivals.iter().enumerate() {
                    println!(
                        "Rival {i}: pos=({:.1}, {:.1}, {:.1}) speed={:.1} target={:?}",
                        rival.position[0],
                        rival.position[1],
                        rival.position[2],
                        rival.speed,
                        rival.target
                    );
                }
                println!(
                    "Window slides: {}, avg {}us, max {}us",
                    report.slides, report.avg_slide_us, report.max_slide_us
                );
                println!("State hash: {:#x}", report.state_hash);
            }
        }
        Commands::Replay { config, ticks } => {
            let config = load_config(config.as_ref())?;
            println!("Deterministic replay: seed={}, ticks={ticks}", config.seed);

            let mut session = Session::recording(config)?;
            let report = session.run(ticks);
            let replayed = World::replay(session.world().events());

            println!(
                "Run: tick={}, entities={}, hash={:#x}",
                report.ticks, report.entity_count, report.state_hash
            );
            println!(
                "Replay: tick={}, entities={}, hash={:#x}",
                replayed.tick(),
                replayed.entity_count(),
                replayed.state_hash()
            );
            let matched = replayed.state_hash() == report.state_hash;
            println!("Match: {}", if matched { "OK" } else { "MISMATCH" });
            if !matched {
                anyhow::bail!("replay diverged from the recorded run");
            }
        }
    }

    Ok(())
}
