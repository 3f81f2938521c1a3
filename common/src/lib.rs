//! Common types and utilities for the wallpaper tools.
//!
//! This crate defines the data structures shared between the wallpaper
//! compositor (`setwallpaper`) and the display inspection tool (`dispinfo`):
//! monitor rectangles, placement modes, the placement engine and the error
//! taxonomy.
//!
//! # Examples
//!
//! ```
//! use common::{ImageMode, Monitor, placement};
//!
//! let monitor = Monitor::new(0, 0, 1920, 1080);
//! let p = placement::place(3840, 2160, &monitor, ImageMode::Scale, false);
//! assert_eq!((p.x, p.y, p.width, p.height), (0, 0, 1920, 1080));
//! ```

pub mod placement;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Broad category of a [`WallpaperError`], for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    Connection,
    Decode,
    Allocation,
    Config,
    Unsupported,
}

/// Errors shared between the compositor and its callers.
///
/// Every variant carries a human readable message; [`WallpaperError::kind`]
/// exposes the category.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WallpaperError {
    /// The display connection could not be opened or was lost.
    #[error("connection error: {0}")]
    Connection(String),

    /// An image could not be loaded, decoded or cloned.
    #[error("decode error: {0}")]
    Decode(String),

    /// A buffer, pixmap or colour could not be allocated.
    #[error("allocation error: {0}")]
    Allocation(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// The display uses a visual or depth we cannot render to.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl WallpaperError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection(_) => ErrorKind::Connection,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Allocation(_) => ErrorKind::Allocation,
            Self::Config(_) => ErrorKind::Config,
            Self::Unsupported(_) => ErrorKind::Unsupported,
        }
    }

    /// The message without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Connection(m)
            | Self::Decode(m)
            | Self::Allocation(m)
            | Self::Config(m)
            | Self::Unsupported(m) => m,
        }
    }
}

pub type Result<T, E = WallpaperError> = std::result::Result<T, E>;

/// A monitor rectangle in virtual-screen pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Monitor {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Monitor {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// A monitor covering the whole virtual screen.
    pub const fn full_screen(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Whether the rectangle has a positive area.
    pub fn is_valid(&self) -> bool {
        self.w > 0 && self.h > 0
    }

    pub fn is_landscape(&self) -> bool {
        self.w > self.h
    }

    pub fn is_portrait(&self) -> bool {
        self.w < self.h
    }
}

impl fmt::Display for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.w, self.h, self.x, self.y)
    }
}

/// How a source image is laid out on each monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageMode {
    /// Placed around the monitor centre without scaling to fit.
    Center,
    /// Fill the whole monitor.
    Zoom,
    /// Scale uniformly to fit inside the monitor.
    #[default]
    Scale,
}

impl ImageMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::Zoom => "zoom",
            Self::Scale => "scale",
        }
    }
}

impl fmt::Display for ImageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ImageMode {
    type Err = WallpaperError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "center" | "centered" => Ok(Self::Center),
            "zoom" | "zoomed" | "fill" | "max" => Ok(Self::Zoom),
            "scale" | "scaled" | "stretch" | "stretched" => Ok(Self::Scale),
            other => Err(WallpaperError::Config(format!(
                "unsupported desktop wallpaper mode: {other}"
            ))),
        }
    }
}

/// Resolution and DPI of one detected monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorInfo {
    /// Monitor number, from 0 and up
    pub id: u32,
    pub width: u32,
    pub height: u32,
    pub dpi_w: u32,
    pub dpi_h: u32,
}

impl fmt::Display for MonitorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}x{}", self.id, self.width, self.height)
    }
}

/// Parse a hex color string (e.g., "#FF5733" or "FF5733") to RGBA
pub fn parse_hex_color(color: &str) -> Option<(u8, u8, u8, u8)> {
    let color = color.trim_start_matches('#');

    if (color.len() != 6 && color.len() != 8) || !color.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let r = u8::from_str_radix(&color[0..2], 16).ok()?;
    let g = u8::from_str_radix(&color[2..4], 16).ok()?;
    let b = u8::from_str_radix(&color[4..6], 16).ok()?;
    let a = if color.len() == 8 {
        u8::from_str_radix(&color[6..8], 16).ok()?
    } else {
        255
    };

    Some((r, g, b, a))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#FF5733"), Some((255, 87, 51, 255)));
        assert_eq!(parse_hex_color("FF5733"), Some((255, 87, 51, 255)));
        assert_eq!(parse_hex_color("#FF573380"), Some((255, 87, 51, 128)));
        assert_eq!(parse_hex_color("000000"), Some((0, 0, 0, 255)));
        assert_eq!(parse_hex_color("invalid"), None);
        assert_eq!(parse_hex_color("#ÄÄÄ"), None);
        assert_eq!(parse_hex_color("#+1+2+3"), None);
        assert_eq!(parse_hex_color("#-1-2-3"), None);
        assert_eq!(parse_hex_color("#fff"), None);
    }

    #[test]
    fn test_image_mode_aliases() {
        assert_eq!("center".parse::<ImageMode>().unwrap(), ImageMode::Center);
        for name in ["zoom", "zoomed", "fill", "max", "FILL"] {
            assert_eq!(name.parse::<ImageMode>().unwrap(), ImageMode::Zoom);
        }
        for name in ["scale", "scaled", "stretch", "stretched"] {
            assert_eq!(name.parse::<ImageMode>().unwrap(), ImageMode::Scale);
        }
    }

    #[test]
    fn test_image_mode_unknown() {
        let err = "tiled".parse::<ImageMode>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.message().contains("tiled"));

        assert_eq!(ImageMode::default(), ImageMode::Scale);
    }

    #[test]
    fn test_error_kind() {
        let err = WallpaperError::Allocation("cannot allocate buffer".to_string());
        assert_eq!(err.kind(), ErrorKind::Allocation);
        assert_eq!(err.message(), "cannot allocate buffer");
        assert_eq!(err.to_string(), "allocation error: cannot allocate buffer");
    }

    #[test]
    fn test_monitor_orientation() {
        let m = Monitor::new(0, 0, 1920, 1080);
        assert!(m.is_landscape());
        assert!(!m.is_portrait());
        assert!(Monitor::new(0, 0, 1080, 1920).is_portrait());
        assert!(!Monitor::new(0, 0, 0, 1080).is_valid());
        assert_eq!(m.to_string(), "1920x1080+0+0");
    }

    #[test]
    fn test_monitor_info_serialization() {
        let info = MonitorInfo {
            id: 1,
            width: 2560,
            height: 1440,
            dpi_w: 109,
            dpi_h: 109,
        };
        let json = serde_json::to_string(&info).unwrap();
        let back: MonitorInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, info);
        assert_eq!(info.to_string(), "[1] 2560x1440");
    }
}
