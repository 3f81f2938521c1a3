//! Root window wallpaper compositor for X11.
//!
//! Composes one or more images over every Xinerama monitor into a single
//! buffer the size of the virtual screen and installs it as the root
//! window's background.

pub mod backend;
pub mod compose;
pub mod config;
pub mod geometry;
pub mod loader;
mod macros;
pub mod pick;
pub mod session;
pub mod sources;
pub mod x11;

pub use backend::{DisplayBackend, Rgb};
pub use common::{ErrorKind, ImageMode, Monitor, Result, WallpaperError};
pub use session::{
    DrawReport, RunMode, Session, SessionOptions, set_background, set_background_with,
};
pub use x11::X11Backend;
