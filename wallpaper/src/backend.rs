//! The display side of the compositor.
//!
//! [`DisplayBackend`] is everything the session needs from a display server:
//! screen geometry, monitor rectangles, colour allocation, a way to put the
//! composed image on the root surface and a way to wait for the root surface
//! to be reconfigured. [`crate::x11::X11Backend`] implements it over `x11rb`.

use common::{Monitor, Result};
use image::RgbaImage;

/// An allocated colour, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

pub trait DisplayBackend {
    /// Size of the virtual screen in pixels.
    fn screen_size(&self) -> (u32, u32);

    /// Rectangles reported by the multi-monitor extension, in order.
    ///
    /// `None` when the extension is missing, inactive or the query failed.
    fn monitors(&mut self) -> Option<Vec<Monitor>>;

    /// Resolve a colour name (`"black"`, `"#1a1a2e"`, ...) on the default colormap.
    fn alloc_color(&mut self, name: &str) -> Result<Rgb>;

    /// Ask to be told when the root surface changes size.
    fn watch_root(&mut self) -> Result<()>;

    /// Paint `buffer` on the root surface and keep it as the persistent background.
    ///
    /// `buffer` always covers the whole virtual screen.
    fn present(&mut self, buffer: &RgbaImage) -> Result<()>;

    /// Block until the root surface is reconfigured and return its new size.
    ///
    /// Returns `Ok(None)` when no more notifications can arrive.
    fn wait_for_reconfigure(&mut self) -> Result<Option<(u32, u32)>>;
}
