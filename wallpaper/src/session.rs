//! The compositor session.
//!
//! A [`Session`] only exists once [`Session::setup`] has loaded the images,
//! subscribed to root reconfiguration and allocated the background colour.
//! [`Session::run`] draws at least once and, in watch mode, redraws on every
//! reconfiguration. [`Session::cleanup`] consumes the session, releasing the
//! images and handing the backend back to the caller.

use crate::backend::{DisplayBackend, Rgb};
use crate::compose::{self, MonitorPlacement};
use crate::geometry;
use crate::loader::{self, SourceImage};
use crate::log_and_continue;
use crate::x11::X11Backend;
use common::{ImageMode, Monitor, Result, WallpaperError};
use std::path::{Path, PathBuf};

/// Default background colour
pub const DEFAULT_COLOR: &str = "#000000";

/// What a session is set up with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Images to show, cycled over the monitors
    pub images: Vec<PathBuf>,
    /// X colour name or `#rrggbb`
    pub color: String,
    pub monitor_limit: Option<usize>,
}

impl SessionOptions {
    pub fn single(path: impl Into<PathBuf>) -> Self {
        Self {
            images: vec![path.into()],
            ..Self::default()
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            images: Vec::new(),
            color: DEFAULT_COLOR.to_string(),
            monitor_limit: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Draw once and return
    #[default]
    Once,
    /// Draw, then redraw on every root reconfiguration until the display goes away
    Watch,
}

/// Outcome of one draw pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawReport {
    pub screen: (u32, u32),
    pub placements: Vec<MonitorPlacement>,
}

#[derive(Debug)]
pub struct Session<B: DisplayBackend> {
    backend: B,
    images: Vec<SourceImage>,
    screen: (u32, u32),
    monitors: Vec<Monitor>,
    background: Rgb,
    monitor_limit: Option<usize>,
    draws: usize,
}

impl<B: DisplayBackend> Session<B> {
    /// Load the images and prepare `backend` for drawing.
    pub fn setup(mut backend: B, options: &SessionOptions) -> Result<Self> {
        let mut images = Vec::with_capacity(options.images.len());
        for path in &options.images {
            match loader::load_image(path) {
                Ok(image) => images.push(image),
                Err(e) => log::error!("Skipping {}: {}", path.display(), e),
            }
        }
        if images.is_empty() {
            return Err(WallpaperError::Decode("no image to draw".to_string()));
        }

        let screen = backend.screen_size();
        log::debug!("Screen size: {}x{}", screen.0, screen.1);

        backend.watch_root()?;

        let background = backend.alloc_color(&options.color).map_err(|e| {
            WallpaperError::Allocation(format!("cannot allocate color {}: {}", options.color, e.message()))
        })?;

        log::info!(
            "Session ready: {} image(s), background {}",
            images.len(),
            options.color
        );

        Ok(Self {
            backend,
            images,
            screen,
            monitors: Vec::new(),
            background,
            monitor_limit: options.monitor_limit,
            draws: 0,
        })
    }

    /// Refresh the monitor list for the current screen size.
    pub fn update_geometry(&mut self) -> &[Monitor] {
        self.monitors = geometry::update_geometry(&mut self.backend, self.screen, self.monitor_limit);
        &self.monitors
    }

    /// Compose every monitor's image and present the result.
    ///
    /// Nothing is presented when composing fails.
    pub fn draw_background(&mut self, mode: ImageMode, rotate: bool) -> Result<DrawReport> {
        let (buffer, placements) = compose::compose(
            &self.images,
            &self.monitors,
            self.screen,
            self.background,
            mode,
            rotate,
        )?;

        self.backend.present(&buffer)?;
        self.draws += 1;

        Ok(DrawReport {
            screen: self.screen,
            placements,
        })
    }

    /// Draw, and in [`RunMode::Watch`] keep redrawing on reconfiguration.
    ///
    /// A failing first draw is returned. A failing redraw is logged and the
    /// loop waits for the next reconfiguration.
    pub fn run(&mut self, mode: ImageMode, rotate: bool, run_mode: RunMode) -> Result<()> {
        self.update_geometry();
        let report = self.draw_background(mode, rotate)?;
        log::info!(
            "Wallpaper set on {} monitor(s) ({}x{}, {})",
            report.placements.len(),
            report.screen.0,
            report.screen.1,
            mode
        );

        if run_mode == RunMode::Once {
            return Ok(());
        }

        log::info!("Watching for screen changes");
        while let Some(screen) = self.backend.wait_for_reconfigure()? {
            log::info!("Screen reconfigured to {}x{}", screen.0, screen.1);
            self.screen = screen;
            self.update_geometry();
            log_and_continue!(self.draw_background(mode, rotate), "redraw background");
        }

        log::info!("Display closed, leaving watch mode");
        Ok(())
    }

    /// Release the images and hand back the backend.
    pub fn cleanup(self) -> B {
        log::debug!(
            "Releasing {} image(s) after {} draw(s)",
            self.images.len(),
            self.draws
        );
        self.backend
    }

    pub fn images(&self) -> &[SourceImage] {
        &self.images
    }

    pub fn monitors(&self) -> &[Monitor] {
        &self.monitors
    }

    pub fn screen(&self) -> (u32, u32) {
        self.screen
    }

    pub fn background(&self) -> Rgb {
        self.background
    }

    /// Number of buffers presented so far
    pub fn draws(&self) -> usize {
        self.draws
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

/// Set `path` as the desktop background on the X display named by `$DISPLAY`.
pub fn set_background(path: impl AsRef<Path>, rotate: bool, mode: ImageMode, verbose: bool) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(WallpaperError::Decode(format!("no such file: {}", path.display())));
    }

    let backend = X11Backend::connect(None)?;
    set_background_with(backend, path, rotate, mode, verbose)?;
    Ok(())
}

/// One-shot single image draw on any backend. Returns the backend once done.
pub fn set_background_with<B: DisplayBackend>(
    backend: B,
    path: &Path,
    rotate: bool,
    mode: ImageMode,
    verbose: bool,
) -> Result<B> {
    let mut session = Session::setup(backend, &SessionOptions::single(path))?;
    session.update_geometry();
    let report = session.draw_background(mode, rotate)?;

    if verbose {
        for (i, p) in report.placements.iter().enumerate() {
            let Some(image) = session.images().get(p.image_index) else {
                continue;
            };
            log::info!(
                "Monitor {} ({}): {} as {}x{}+{}+{}",
                i,
                p.monitor,
                image.path().display(),
                p.placement.width,
                p.placement.height,
                p.placement.x,
                p.placement.y
            );
        }
    }

    Ok(session.cleanup())
}
