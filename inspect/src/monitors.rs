use crate::error::{InspectError, Result};
use crate::wayland::{self, OutputInfo};
use crate::x11::{self, FALLBACK_DPI, ScreenInfo};
use common::MonitorInfo;

/// Monitors of the running display server, Wayland first, then X11.
pub fn detect() -> Result<Vec<MonitorInfo>> {
    let monitors = if wayland::running() {
        log::debug!("Detecting monitors over Wayland");
        from_wayland(&wayland::outputs()?)
    } else if x11::running() {
        log::debug!("Detecting monitors over X11");
        from_x11(&x11::screens()?)
    } else {
        Vec::new()
    };

    if monitors.is_empty() {
        return Err(InspectError::NoDisplay);
    }
    Ok(monitors)
}

/// One monitor per current output mode.
pub fn from_wayland(outputs: &[OutputInfo]) -> Vec<MonitorInfo> {
    let mut monitors = Vec::new();
    let mut with_size = 0;

    for output in outputs {
        let has_size = output.physical_width > 0 && output.physical_height > 0;
        if has_size {
            with_size += 1;
        }

        for mode in output.modes.iter().filter(|m| m.is_current()) {
            let (dpi_w, dpi_h) = if has_size {
                (
                    wayland_dpi(mode.width, output.physical_width),
                    wayland_dpi(mode.height, output.physical_height),
                )
            } else {
                log::warn!("No physical monitor size detected!");
                (FALLBACK_DPI, FALLBACK_DPI)
            };

            monitors.push(MonitorInfo {
                id: monitors.len() as u32,
                width: mode.width.max(0) as u32,
                height: mode.height.max(0) as u32,
                dpi_w,
                dpi_h,
            });
        }
    }

    if with_size > 0 && with_size < outputs.len() {
        log::warn!("Some monitors contains a physical size, but not all of them");
    }

    monitors
}

/// `px / (mm / 25.4)`, truncated
fn wayland_dpi(px: i32, mm: i32) -> u32 {
    (f64::from(px) / (f64::from(mm) / 25.4)) as u32
}

pub fn from_x11(screens: &[ScreenInfo]) -> Vec<MonitorInfo> {
    screens
        .iter()
        .enumerate()
        .map(|(i, screen)| {
            let (dpi_w, dpi_h) = screen.dpi();
            MonitorInfo {
                id: i as u32,
                width: u32::from(screen.width_px),
                height: u32::from(screen.height_px),
                dpi_w,
                dpi_h,
            }
        })
        .collect()
}

/// Average horizontal and vertical DPI over all monitors
pub fn average_dpi(monitors: &[MonitorInfo]) -> Option<(u32, u32)> {
    if monitors.is_empty() {
        return None;
    }
    let count = monitors.len() as u32;
    let w: u32 = monitors.iter().map(|m| m.dpi_w).sum();
    let h: u32 = monitors.iter().map(|m| m.dpi_h).sum();
    Some((w / count, h / count))
}
