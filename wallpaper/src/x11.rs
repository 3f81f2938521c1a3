//! X11 display backend over `x11rb`.
//!
//! Monitors come from Xinerama. The composed buffer is uploaded into a
//! pixmap in row strips, copied onto the root window and kept as the root's
//! background pixmap.

use crate::backend::{DisplayBackend, Rgb};
use common::{Monitor, Result, WallpaperError};
use image::RgbaImage;
use x11rb::connection::{Connection, RequestConnection};
use x11rb::errors::{ConnectionError, ReplyError};
use x11rb::protocol::Event;
use x11rb::protocol::xinerama::{self, ConnectionExt as _};
use x11rb::protocol::xproto::{
    ChangeWindowAttributesAux, ConnectionExt as _, CreateGCAux, EventMask, Gcontext, ImageFormat,
    ImageOrder, Pixmap, Screen, VisualClass, Window,
};
use x11rb::rust_connection::RustConnection;

/// Size of a PutImage request without its data
const PUT_IMAGE_HEADER: usize = 24;

fn connection_error(e: impl std::fmt::Display) -> WallpaperError {
    WallpaperError::Connection(e.to_string())
}

/// `#rrggbb` colours resolved without a round trip; every other spelling
/// (`#rgb`, `#rrrrggggbbbb`, names) is left to the server.
fn client_side_color(name: &str) -> Option<Rgb> {
    if !name.starts_with('#') {
        return None;
    }
    common::parse_hex_color(name).map(|(r, g, b, _)| Rgb::new(r, g, b))
}

/// Channel layout of the root visual
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PixelLayout {
    red_shift: u32,
    green_shift: u32,
    blue_shift: u32,
    /// Bits to set on every pixel (alpha on 32-bit visuals)
    opaque: u32,
    /// The server wants the opposite byte order to ours
    swap_bytes: bool,
}

impl PixelLayout {
    fn pixel(&self, [r, g, b, _]: [u8; 4]) -> u32 {
        let pixel = (u32::from(r) << self.red_shift)
            | (u32::from(g) << self.green_shift)
            | (u32::from(b) << self.blue_shift)
            | self.opaque;
        if self.swap_bytes {
            pixel.swap_bytes()
        } else {
            pixel
        }
    }
}

pub struct X11Backend {
    conn: RustConnection,
    root: Window,
    depth: u8,
    colormap: u32,
    layout: PixelLayout,
    size: (u32, u32),
}

impl X11Backend {
    /// Connect to `display`, or to `$DISPLAY` when `None`.
    pub fn connect(display: Option<&str>) -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(display).map_err(|e| {
            WallpaperError::Connection(format!(
                "cannot open display {}: {}",
                display.unwrap_or("$DISPLAY"),
                e
            ))
        })?;

        let setup = conn.setup();
        let screen = setup.roots.get(screen_num).ok_or_else(|| {
            WallpaperError::Connection(format!("invalid screen number: {screen_num}"))
        })?;

        let mut layout = Self::pixel_layout(screen)?;
        let bits_per_pixel = setup
            .pixmap_formats
            .iter()
            .find(|f| f.depth == screen.root_depth)
            .map(|f| f.bits_per_pixel);
        if bits_per_pixel != Some(32) {
            return Err(WallpaperError::Unsupported(format!(
                "{}-bit pixmaps at depth {}",
                bits_per_pixel.unwrap_or(0),
                screen.root_depth
            )));
        }
        let server_lsb = setup.image_byte_order == ImageOrder::LSB_FIRST;
        layout.swap_bytes = server_lsb != cfg!(target_endian = "little");

        let backend = Self {
            root: screen.root,
            depth: screen.root_depth,
            colormap: screen.default_colormap,
            layout,
            size: (
                u32::from(screen.width_in_pixels),
                u32::from(screen.height_in_pixels),
            ),
            conn,
        };

        log::debug!(
            "Connected to X screen {} ({}x{}, depth {})",
            screen_num,
            backend.size.0,
            backend.size.1,
            backend.depth
        );

        Ok(backend)
    }

    /// Check the root visual and work out its channel shifts.
    ///
    /// Only 24 and 32-bit TrueColor visuals are supported.
    fn pixel_layout(screen: &Screen) -> Result<PixelLayout> {
        let visual = screen
            .allowed_depths
            .iter()
            .filter(|d| d.depth == screen.root_depth)
            .flat_map(|d| d.visuals.iter())
            .find(|v| v.visual_id == screen.root_visual)
            .ok_or_else(|| {
                WallpaperError::Unsupported(format!(
                    "could not find root visual {}",
                    screen.root_visual
                ))
            })?;

        if visual.class != VisualClass::TRUE_COLOR
            || (screen.root_depth != 24 && screen.root_depth != 32)
        {
            return Err(WallpaperError::Unsupported(format!(
                "{}-bit {:?} visual, expected 24/32-bit TrueColor",
                screen.root_depth, visual.class
            )));
        }

        let rgb = visual.red_mask | visual.green_mask | visual.blue_mask;
        Ok(PixelLayout {
            red_shift: visual.red_mask.trailing_zeros(),
            green_shift: visual.green_mask.trailing_zeros(),
            blue_shift: visual.blue_mask.trailing_zeros(),
            opaque: if screen.root_depth == 32 { !rgb } else { 0 },
            swap_bytes: false,
        })
    }

    fn query_xinerama(&self) -> std::result::Result<Option<Vec<Monitor>>, ReplyError> {
        if self
            .conn
            .extension_information(xinerama::X11_EXTENSION_NAME)?
            .is_none()
        {
            log::debug!("Xinerama extension not present");
            return Ok(None);
        }

        if self.conn.xinerama_is_active()?.reply()?.state == 0 {
            log::debug!("Xinerama is not active");
            return Ok(None);
        }

        let screens = self.conn.xinerama_query_screens()?.reply()?.screen_info;
        Ok(Some(
            screens
                .iter()
                .map(|s| {
                    Monitor::new(
                        i32::from(s.x_org),
                        i32::from(s.y_org),
                        i32::from(s.width),
                        i32::from(s.height),
                    )
                })
                .collect(),
        ))
    }

    /// Convert the buffer to server pixels.
    fn pixels(&self, buffer: &RgbaImage) -> Result<Vec<u32>> {
        let count = buffer.width() as usize * buffer.height() as usize;
        let mut pixels = Vec::new();
        pixels.try_reserve_exact(count).map_err(|_| {
            WallpaperError::Allocation(format!(
                "cannot allocate {}x{} image",
                buffer.width(),
                buffer.height()
            ))
        })?;
        pixels.extend(buffer.pixels().map(|p| self.layout.pixel(p.0)));
        Ok(pixels)
    }

    /// Upload `data` into `pixmap` in strips of whole rows that fit one request.
    fn put_rows(&self, pixmap: Pixmap, gc: Gcontext, width: u16, height: u16, data: &[u8]) -> Result<()> {
        let row_bytes = usize::from(width) * 4;
        let max_data = self
            .conn
            .maximum_request_bytes()
            .saturating_sub(PUT_IMAGE_HEADER);
        let rows_per_strip = (max_data / row_bytes).clamp(1, usize::from(height));

        for (i, strip) in data.chunks(rows_per_strip * row_bytes).enumerate() {
            let y = i * rows_per_strip;
            let rows = strip.len() / row_bytes;
            self.conn
                .put_image(
                    ImageFormat::Z_PIXMAP,
                    pixmap,
                    gc,
                    width,
                    rows as u16,
                    0,
                    y as i16,
                    0,
                    self.depth,
                    strip,
                )
                .map_err(connection_error)?;
        }

        Ok(())
    }

    fn paint(&self, pixmap: Pixmap, gc: Gcontext, width: u16, height: u16, buffer: &RgbaImage) -> Result<()> {
        let pixels = self.pixels(buffer)?;
        self.put_rows(pixmap, gc, width, height, bytemuck::cast_slice(pixels.as_slice()))?;
        drop(pixels);

        self.conn
            .copy_area(pixmap, self.root, gc, 0, 0, 0, 0, width, height)
            .map_err(connection_error)?;
        self.conn
            .change_window_attributes(
                self.root,
                &ChangeWindowAttributesAux::new().background_pixmap(pixmap),
            )
            .map_err(connection_error)?
            .check()
            .map_err(connection_error)?;
        self.conn
            .clear_area(false, self.root, 0, 0, width, height)
            .map_err(connection_error)?;

        Ok(())
    }
}

impl DisplayBackend for X11Backend {
    fn screen_size(&self) -> (u32, u32) {
        self.size
    }

    fn monitors(&mut self) -> Option<Vec<Monitor>> {
        match self.query_xinerama() {
            Ok(monitors) => monitors,
            Err(e) => {
                log::debug!("Xinerama query failed: {}", e);
                None
            }
        }
    }

    fn alloc_color(&mut self, name: &str) -> Result<Rgb> {
        if let Some(rgb) = client_side_color(name) {
            return Ok(rgb);
        }

        let reply = self
            .conn
            .alloc_named_color(self.colormap, name.as_bytes())
            .map_err(connection_error)?
            .reply()
            .map_err(|e| WallpaperError::Allocation(format!("cannot allocate color {name}: {e}")))?;

        Ok(Rgb::new(
            (reply.visual_red >> 8) as u8,
            (reply.visual_green >> 8) as u8,
            (reply.visual_blue >> 8) as u8,
        ))
    }

    fn watch_root(&mut self) -> Result<()> {
        self.conn
            .change_window_attributes(
                self.root,
                &ChangeWindowAttributesAux::new().event_mask(EventMask::STRUCTURE_NOTIFY),
            )
            .map_err(connection_error)?
            .check()
            .map_err(connection_error)?;
        Ok(())
    }

    fn present(&mut self, buffer: &RgbaImage) -> Result<()> {
        let (width, height) = match (u16::try_from(buffer.width()), u16::try_from(buffer.height())) {
            (Ok(w), Ok(h)) if w > 0 && h > 0 => (w, h),
            _ => {
                return Err(WallpaperError::Allocation(format!(
                    "cannot allocate {}x{} pixmap",
                    buffer.width(),
                    buffer.height()
                )));
            }
        };

        let pixmap = self.conn.generate_id().map_err(connection_error)?;
        self.conn
            .create_pixmap(self.depth, pixmap, self.root, width, height)
            .map_err(connection_error)?
            .check()
            .map_err(|e| WallpaperError::Allocation(format!("cannot allocate pixmap: {e}")))?;

        let result = match self.conn.generate_id() {
            Ok(gc) => {
                let painted = self
                    .conn
                    .create_gc(gc, pixmap, &CreateGCAux::new())
                    .map_err(connection_error)
                    .and_then(|_| self.paint(pixmap, gc, width, height, buffer));
                log_free(self.conn.free_gc(gc), "graphics context");
                painted
            }
            Err(e) => Err(connection_error(e)),
        };

        // The root keeps its own reference to the background pixmap
        log_free(self.conn.free_pixmap(pixmap), "pixmap");
        self.conn.flush().map_err(connection_error)?;

        result
    }

    fn wait_for_reconfigure(&mut self) -> Result<Option<(u32, u32)>> {
        loop {
            let event = match self.conn.wait_for_event() {
                Ok(event) => event,
                Err(ConnectionError::IoError(e)) => {
                    log::debug!("X connection closed: {}", e);
                    return Ok(None);
                }
                Err(e) => return Err(connection_error(e)),
            };

            match event {
                Event::ConfigureNotify(ev) if ev.window == self.root => {
                    self.size = (u32::from(ev.width), u32::from(ev.height));
                    return Ok(Some(self.size));
                }
                Event::Error(e) => log::debug!("X error while waiting: {:?}", e),
                _ => {}
            }
        }
    }
}

fn log_free<C>(result: std::result::Result<C, ConnectionError>, what: &str) {
    if let Err(e) = result {
        log::warn!("Failed to free {}: {}", what, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_side_color() {
        assert_eq!(client_side_color("#102030"), Some(Rgb::new(0x10, 0x20, 0x30)));
        // Short and long hex forms are resolved by the server
        assert_eq!(client_side_color("#fff"), None);
        assert_eq!(client_side_color("#ffffffffffff"), None);
        assert_eq!(client_side_color("navy"), None);
        assert_eq!(client_side_color("102030"), None);
    }

    #[test]
    fn test_pixel_layout_rgb24() {
        let layout = PixelLayout {
            red_shift: 16,
            green_shift: 8,
            blue_shift: 0,
            opaque: 0,
            swap_bytes: false,
        };
        assert_eq!(layout.pixel([0x12, 0x34, 0x56, 0xff]), 0x0012_3456);
    }

    #[test]
    fn test_pixel_layout_argb32_swapped() {
        let layout = PixelLayout {
            red_shift: 16,
            green_shift: 8,
            blue_shift: 0,
            opaque: 0xff00_0000,
            swap_bytes: true,
        };
        assert_eq!(layout.pixel([0x12, 0x34, 0x56, 0x00]), 0x5634_12ff);
    }
}
