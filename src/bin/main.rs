//! CLI tool for Jetson Clocks

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "jetson-clocks")]
#[command(about = "Jetson Clocks: show, store, restore or maximize CPU, GPU, EMC and fan settings", long_about = None)]
#[command(version)]
struct Cli {
    /// Show current settings
    #[arg(long, conflicts_with_all = ["store", "restore"])]
    show: bool,

    /// Store current settings to FILE (default: ~/l4t_dfs.toml)
    #[arg(long, value_name = "FILE", conflicts_with = "restore")]
    store: Option<Option<PathBuf>>,

    /// Restore settings from FILE (default: ~/l4t_dfs.toml)
    #[arg(long, value_name = "FILE")]
    restore: Option<Option<PathBuf>>,

    /// Output format for --show (json or text)
    #[arg(short, long, default_value = "text")]
    format: String,
}

#[cfg(feature = "cli")]
fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    use jetson_clocks::{ClockState, ClocksConfig, JetsonClocks};

    let clocks = JetsonClocks::new();

    if cli.show {
        let state = ClockState::capture(&clocks)?;
        if cli.format == "json" {
            println!("{}", serde_json::to_string_pretty(&state)?);
        } else {
            print!("{}", state);
        }
    } else if let Some(path) = &cli.store {
        let path = path.clone().unwrap_or_else(ClocksConfig::default_path);
        ClockState::capture(&clocks)?.to_config().save_to(&path)?;
        println!("Settings stored to {}", path.display());
    } else if let Some(path) = &cli.restore {
        let path = path.clone().unwrap_or_else(ClocksConfig::default_path);
        let config = ClocksConfig::load_from(&path)?;
        jetson_clocks::apply_config(&clocks, &config)?;
        println!("Settings restored from {}", path.display());
    } else {
        jetson_clocks::maximize(&clocks)?;
        println!("All clocks set to maximum");
    }

    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI features not enabled. Please compile with --features cli");
    std::process::exit(1);
}
