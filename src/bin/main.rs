//! ALICE-WARP CLI
//!
//! Command-line driver for scripted deformation sessions.
//!
//! Author: Moroya Sakamoto

#![allow(clippy::uninlined_format_args)]

#[cfg(feature = "cli")]
use alice_warp::prelude::*;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "alice-warp")]
#[command(author = "Moroya Sakamoto")]
#[command(version = alice_warp::VERSION)]
#[command(about = "ALICE-WARP: probe-driven lattice deformation", long_about = None)]
struct Cli {
    /// JSON config file (grid + engine sections)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Displace one root probe and print the resulting heatmap
    Push {
        /// Root probe slot
        #[arg(short, long, default_value = "0")]
        slot: usize,
        /// X displacement
        #[arg(long, default_value = "0.5", allow_hyphen_values = true)]
        dx: f32,
        /// Y displacement
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        dy: f32,
    },

    /// Run a zoom session: push a root probe, zoom in, push a nested probe, zoom out
    Demo {
        /// Root probe slot to zoom into
        #[arg(short, long, default_value = "0")]
        slot: usize,
    },

    /// Print the effective configuration as JSON
    Config,
}

#[cfg(feature = "cli")]
fn main() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match WarpConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => WarpConfig::default(),
    };

    let result = match cli.command {
        Commands::Push { slot, dx, dy } => cmd_push(&config, slot, Vec3::new(dx, dy, 0.0)),
        Commands::Demo { slot } => cmd_demo(&config, slot),
        Commands::Config => config.to_json_string().map(|json| println!("{}", json)),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn print_map(title: &str, engine: &WarpEngine) {
    let map = Heatmap::sample(engine);
    println!("── {} (max {:.4}) ──", title, map.max_val);
    print!("{}", map.to_ascii());
}

#[cfg(feature = "cli")]
fn move_probe(engine: &mut WarpEngine, id: ProbeId, delta: Vec3) -> Result<(), WarpError> {
    let probes = engine.probes_mut().ok_or(WarpError::NotReady)?;
    probes.translate(id, delta);
    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_push(config: &WarpConfig, slot: usize, delta: Vec3) -> Result<(), WarpError> {
    let mut engine = WarpEngine::with_defaults(config.grid, config.engine)?;
    let root = engine.root_probes();
    let id = *root.get(slot).ok_or(WarpError::UnknownParent {
        slot,
        len: root.len(),
    })?;

    move_probe(&mut engine, id, delta)?;
    if let TickOutcome::Rebuilt(stats) = engine.tick() {
        println!(
            "{} moved by ({:.3}, {:.3}): {} contributors, {} points touched",
            id, delta.x, delta.y, stats.contributors, stats.touched
        );
    }
    print_map("displacement", &engine);
    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_demo(config: &WarpConfig, slot: usize) -> Result<(), WarpError> {
    let mut engine = WarpEngine::with_defaults(config.grid, config.engine)?;
    engine.tick();

    let parent = *engine.root_probes().get(slot).ok_or(WarpError::UnknownParent {
        slot,
        len: engine.root_probes().len(),
    })?;
    move_probe(&mut engine, parent, Vec3::new(config.grid.cell_size * 0.5, 0.0, 0.0))?;
    engine.tick();
    print_map("level 1: root probe pushed", &engine);

    let t = engine.advance_into(slot)?;
    println!("{:?}", t);
    engine.tick();

    let nested = engine.active_probes()[0];
    move_probe(&mut engine, nested, Vec3::new(0.0, config.grid.cell_size * 0.3, 0.0))?;
    engine.tick();
    print_map("level 2: nested probe pushed", &engine);

    let t = engine.unwind()?;
    println!("{:?}", t);
    engine.tick();
    print_map("level 1: after unwind", &engine);

    let t = engine.enter(slot)?;
    println!("{:?}", t);
    engine.tick();
    println!(
        "nested probe displacement after revisit: {:?}",
        engine.probe_displacement(nested)
    );
    print_map("level 2: revisited", &engine);
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Build with: cargo build --features cli");
    std::process::exit(1);
}
