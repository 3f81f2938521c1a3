//! Screen dimensions and resolution of the X display.

use crate::error::{InspectError, Result};
use std::fmt;
use x11rb::connection::Connection;

/// Resolution used when the server reports no physical size
pub const FALLBACK_DPI: u32 = 96;

/// One X screen as reported in the connection setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenInfo {
    pub number: usize,
    pub width_px: u16,
    pub height_px: u16,
    pub width_mm: u16,
    pub height_mm: u16,
}

impl ScreenInfo {
    /// Horizontal and vertical dots per inch, rounded to nearest.
    pub fn dpi(&self) -> (u32, u32) {
        (dpi(self.width_px, self.width_mm), dpi(self.height_px, self.height_mm))
    }
}

/// `px * 25.4 / mm`, rounded to nearest
pub fn dpi(px: u16, mm: u16) -> u32 {
    if mm == 0 {
        log::warn!("No physical screen size reported, assuming {} DPI", FALLBACK_DPI);
        return FALLBACK_DPI;
    }
    (f64::from(px) * 25.4 / f64::from(mm) + 0.5) as u32
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub display: String,
    pub default_screen: usize,
    pub screens: Vec<ScreenInfo>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "name of display:    {}", self.display)?;
        writeln!(f, "default screen number:    {}", self.default_screen)?;
        writeln!(f, "number of screens:    {}", self.screens.len())?;

        for screen in &self.screens {
            let (xres, yres) = screen.dpi();
            writeln!(f, "SCREEN {}", screen.number)?;
            writeln!(f)?;
            writeln!(f, "screen #{}:", screen.number)?;
            writeln!(
                f,
                "  dimensions:    {}x{} pixels ({}x{} millimeters)",
                screen.width_px, screen.height_px, screen.width_mm, screen.height_mm
            )?;
            writeln!(f, "  resolution:    {}x{} dots per inch", xres, yres)?;
        }

        Ok(())
    }
}

/// Whether a connection to `$DISPLAY` can be opened
pub fn running() -> bool {
    x11rb::connect(None).is_ok()
}

pub fn report() -> Result<Report> {
    let (conn, default_screen) =
        x11rb::connect(None).map_err(|e| InspectError::X11Connect(e.to_string()))?;

    let screens = conn
        .setup()
        .roots
        .iter()
        .enumerate()
        .map(|(number, s)| ScreenInfo {
            number,
            width_px: s.width_in_pixels,
            height_px: s.height_in_pixels,
            width_mm: s.width_in_millimeters,
            height_mm: s.height_in_millimeters,
        })
        .collect();

    Ok(Report {
        display: std::env::var("DISPLAY").unwrap_or_default(),
        default_screen,
        screens,
    })
}

/// The formatted report for the current display
pub fn info_string() -> Result<String> {
    Ok(report()?.to_string())
}

pub fn screens() -> Result<Vec<ScreenInfo>> {
    Ok(report()?.screens)
}
