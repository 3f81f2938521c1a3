mod error;
mod monitors;
mod wayland;
mod x11;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dispinfo")]
#[command(about = "Display and monitor information for X11 and Wayland", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show screen dimensions and resolution of the X display
    X11,

    /// Show the globals announced by the Wayland compositor
    Wayland,

    /// List the connected monitors
    Monitors {
        /// Also show the DPI of every monitor
        #[arg(short, long)]
        dpi: bool,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the average horizontal DPI
    Dpi {
        /// Show the DPI of every monitor
        #[arg(short, long)]
        all: bool,

        /// Show both the horizontal and vertical average
        #[arg(short, long)]
        both: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::X11 => print!("{}", x11::info_string()?),
        Commands::Wayland => print!("{}", wayland::info_string()?),
        Commands::Monitors { dpi, json } => {
            let monitors = monitors::detect()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&monitors)?);
            } else {
                for m in &monitors {
                    if dpi {
                        println!(
                            "{}: {}x{} (DPI: {}x{})",
                            m.id, m.width, m.height, m.dpi_w, m.dpi_h
                        );
                    } else {
                        println!("{}: {}x{}", m.id, m.width, m.height);
                    }
                }
            }
        }
        Commands::Dpi { all, both } => {
            let monitors = monitors::detect()?;
            if all {
                for (i, m) in monitors.iter().enumerate() {
                    println!("[{}] {}x{}", i, m.dpi_w, m.dpi_h);
                }
            } else if let Some((w, h)) = monitors::average_dpi(&monitors) {
                if both {
                    println!("{}x{}", w, h);
                } else {
                    println!("{}", w);
                }
            }
        }
    }

    Ok(())
}
