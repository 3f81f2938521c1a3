use anyhow::{Context, Result, bail};
use clap::Parser;
use common::ImageMode;
use std::path::PathBuf;
use wallpaper::config::Config;
use wallpaper::pick::{self, Pick};
use wallpaper::{
    DisplayBackend, RunMode, Session, SessionOptions, X11Backend, geometry, sources,
};

#[derive(Parser)]
#[command(name = "setwallpaper")]
#[command(about = "Set the X11 desktop background across all monitors", long_about = None)]
#[command(version)]
struct Cli {
    /// Image files, one per monitor, cycled when there are more monitors than images
    images: Vec<PathBuf>,

    /// Placement mode (center, zoom, fill, scale, stretch)
    #[arg(short, long)]
    mode: Option<ImageMode>,

    /// Rotate images whose orientation differs from the monitor's
    #[arg(short, long)]
    rotate: bool,

    /// Background color, an X color name or #RGB / #RRGGBB / #RRRRGGGGBBBB
    #[arg(short, long)]
    color: Option<String>,

    /// Which of the images to draw: all of them, the one whose `_WxH` file
    /// name is closest to the monitors, or one at random
    #[arg(short, long, value_enum)]
    pick: Option<Pick>,

    /// Keep running and redraw when the screen is reconfigured
    #[arg(short, long)]
    watch: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// X display to use
    #[arg(long, env = "DISPLAY")]
    display: Option<String>,

    /// Path to the config file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => match Config::load() {
            Ok(config) => Ok(config),
            Err(e) => {
                eprintln!("Warning: {:#}, using defaults", e);
                Ok(Config::default())
            }
        },
    }
}

/// Images from the command line, or from the config file when none are given
fn resolve_images(cli_images: &[PathBuf], config: &Config) -> Result<Vec<PathBuf>> {
    let images = if cli_images.is_empty() {
        sources::expand_sources(&config.images)?
    } else {
        cli_images.to_vec()
    };

    if images.is_empty() {
        bail!("No image given (pass a path or set `images` in the config file)");
    }

    images
        .into_iter()
        .map(|path| {
            if !path.exists() {
                bail!("no such file: {}", path.display());
            }
            std::path::absolute(&path)
                .with_context(|| format!("Failed to resolve {}", path.display()))
        })
        .collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    let level = if cli.verbose {
        "debug"
    } else {
        config.general.log_level.as_str()
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mode = cli.mode.unwrap_or_else(|| config.mode());
    let rotate = cli.rotate || config.general.rotate;
    let run_mode = if cli.watch || config.general.watch {
        RunMode::Watch
    } else {
        RunMode::Once
    };

    let pick = cli.pick.unwrap_or(config.general.pick);
    let images = resolve_images(&cli.images, &config)?;

    let mut backend = X11Backend::connect(cli.display.as_deref())?;
    let images = if pick == Pick::All {
        images
    } else {
        let size = backend.screen_size();
        let monitors = geometry::update_geometry(&mut backend, size, config.display.monitor_limit);
        pick::pick_images(images, pick, &monitors)?
    };

    let options = SessionOptions {
        images,
        color: cli.color.unwrap_or_else(|| config.general.color.clone()),
        monitor_limit: config.display.monitor_limit,
    };
    log::debug!(
        "Mode: {}, rotate: {}, run: {:?}, pick: {:?}, images: {:?}",
        mode,
        rotate,
        run_mode,
        pick,
        options.images
    );

    let mut session = Session::setup(backend, &options)?;
    session.run(mode, rotate, run_mode)?;
    drop(session.cleanup());

    Ok(())
}
