//! pinch_sculpt — interactive entry point.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use pinch_sculpt::app::{run, AppConfig};
use sculpt_core::SculptConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Pinch to create and scale shapes, snap to make them disintegrate.
#[derive(Parser, Debug)]
#[command(name = "pinch_sculpt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML file overriding the default thresholds and timings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for reproducible shapes and particles
    #[arg(long)]
    seed: Option<u64>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    dump_config: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let sculpt = match &cli.config {
        Some(path) => SculptConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SculptConfig::default(),
    };

    if cli.dump_config {
        print!("{}", sculpt.to_toml()?);
        return Ok(());
    }

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Pinch Sculpt — create, scale, drag, disintegrate      ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    #[cfg(feature = "leap")]
    println!("  Mode: LeapMotion hardware");
    #[cfg(not(feature = "leap"))]
    println!("  Mode: Mouse/keyboard simulation  (use --features leap for hardware)");
    println!();
    println!("  Opening visualizer window…");
    println!();

    info!(seed = ?cli.seed, "starting");
    run(AppConfig { sculpt, seed: cli.seed })
}
