//! Placement engine.
//!
//! Computes where, and at which size, a source image is blended onto one
//! monitor's region of the composition buffer. All arithmetic is integer
//! arithmetic truncating toward zero, except the scale factor, so that the
//! output matches the classic `bgs` layout pixel for pixel.

use crate::{ImageMode, Monitor};

/// Target rectangle of one image on one monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// The image has to be turned 90° clockwise before blending.
    pub rotated: bool,
}

impl Placement {
    /// Whether anything is left to blend.
    pub fn is_visible(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Whether an image of `width`x`height` has to be rotated to match the
/// orientation of `monitor`.
pub fn needs_rotation(width: i32, height: i32, monitor: &Monitor) -> bool {
    (monitor.is_landscape() && width < height) || (monitor.is_portrait() && width > height)
}

/// Compute the placement of a `width`x`height` image on `monitor`.
///
/// With `rotate` set, an image whose orientation differs from the monitor's is
/// treated as rotated by 90°, i.e. its width and height are swapped before the
/// layout math.
pub fn place(width: i32, height: i32, monitor: &Monitor, mode: ImageMode, rotate: bool) -> Placement {
    let rotated = rotate && needs_rotation(width, height, monitor);
    let (w, h) = if rotated {
        (height, width)
    } else {
        (width, height)
    };

    if w <= 0 || h <= 0 || !monitor.is_valid() {
        return Placement {
            x: monitor.x,
            y: monitor.y,
            width: 0,
            height: 0,
            rotated,
        };
    }

    let Monitor {
        x: mx,
        y: my,
        w: mw,
        h: mh,
    } = *monitor;

    let (x, y, width, height) = match mode {
        ImageMode::Center => {
            let nw = (mw - w) / 2;
            let nh = (mh - h) / 2;
            (mx + (mw - nw) / 2, my + (mh - nh) / 2, nw, nh)
        }
        ImageMode::Zoom => {
            let (nw, nh) = (mw, mh);
            if w > h && w / h > mw / mh {
                let nx = mx + (mw - nw) / 2;
                let ny = my + scaled_half(h, nx, w);
                (nx, ny, nw, nh)
            } else {
                let ny = my + (mh - nh) / 2;
                let nx = mx + scaled_half(w, ny, h);
                (nx, ny, nw, nh)
            }
        }
        ImageMode::Scale => {
            let factor = f64::max(w as f64 / mw as f64, h as f64 / mh as f64);
            let nw = (w as f64 / factor) as i32;
            let nh = (h as f64 / factor) as i32;
            (mx + (mw - nw) / 2, my + (mh - nh) / 2, nw, nh)
        }
    };

    Placement {
        x,
        y,
        width,
        height,
        rotated,
    }
}

/// `(a * b / c) / 2` without overflowing on large virtual screens.
fn scaled_half(a: i32, b: i32, c: i32) -> i32 {
    ((a as i64 * b as i64 / c as i64) / 2) as i32
}

/// Index of the image used for the monitor at `monitor_index`, cycling
/// through the available images.
pub fn image_index_for(monitor_index: usize, image_count: usize) -> Option<usize> {
    (image_count > 0).then(|| monitor_index % image_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_HD: Monitor = Monitor::new(0, 0, 1920, 1080);

    #[test]
    fn test_center_arithmetic() {
        let p = place(800, 600, &FULL_HD, ImageMode::Center, false);
        assert_eq!(p.width, 560);
        assert_eq!(p.height, 240);
        assert_eq!(p.x, 680);
        assert_eq!(p.y, 420);
        assert!(!p.rotated);
    }

    #[test]
    fn test_center_truncates_toward_zero() {
        // Larger than the monitor: the gap is negative and truncates toward zero
        let p = place(1925, 1085, &FULL_HD, ImageMode::Center, false);
        assert_eq!(p.width, -2);
        assert_eq!(p.height, -2);
        assert_eq!(p.x, 961);
        assert_eq!(p.y, 541);
        assert!(!p.is_visible());
    }

    #[test]
    fn test_center_offset_monitor() {
        let monitor = Monitor::new(1920, 0, 1280, 1024);
        let p = place(640, 480, &monitor, ImageMode::Center, false);
        assert_eq!((p.width, p.height), (320, 272));
        assert_eq!((p.x, p.y), (1920 + 480, 376));
    }

    #[test]
    fn test_zoom_fills_monitor() {
        let monitors = [
            FULL_HD,
            Monitor::new(1920, 0, 1080, 1920),
            Monitor::new(-1280, 200, 1280, 1024),
            Monitor::new(0, 1080, 3840, 2160),
        ];
        let sizes = [(800, 600), (600, 800), (3840, 1080), (1, 1), (5000, 100)];

        for monitor in &monitors {
            for &(w, h) in &sizes {
                for rotate in [false, true] {
                    let p = place(w, h, monitor, ImageMode::Zoom, rotate);
                    assert_eq!((p.width, p.height), (monitor.w, monitor.h));
                }
            }
        }
    }

    #[test]
    fn test_zoom_truncating_ratio_branch() {
        // 3840/1080 = 3 > 1920/1080 = 1: horizontal branch
        let monitor = Monitor::new(0, 100, 1920, 1080);
        let p = place(3840, 1080, &monitor, ImageMode::Zoom, false);
        assert_eq!((p.x, p.y), (0, 100));

        // 1900/1000 = 1 is not > 1920/1080 = 1: vertical branch, the
        // x offset derives from the monitor's y origin
        let p = place(1900, 1000, &monitor, ImageMode::Zoom, false);
        assert_eq!(p.y, 100);
        assert_eq!(p.x, (1900 * 100 / 1000) / 2);
    }

    #[test]
    fn test_zoom_horizontal_branch_uses_x_origin() {
        let monitor = Monitor::new(1920, 0, 1280, 1024);
        let p = place(4000, 1000, &monitor, ImageMode::Zoom, false);
        assert_eq!(p.x, 1920);
        assert_eq!(p.y, (1000 * 1920 / 4000) / 2);
    }

    #[test]
    fn test_scale_never_exceeds_monitor() {
        let monitors = [FULL_HD, Monitor::new(0, 0, 1080, 1920), Monitor::new(7, 3, 333, 777)];
        for monitor in &monitors {
            for w in [1, 7, 640, 1919, 1920, 1921, 3840, 9999] {
                for h in [1, 3, 480, 1079, 1080, 1081, 2160, 7777] {
                    let p = place(w, h, monitor, ImageMode::Scale, false);
                    assert!(p.width <= monitor.w, "{w}x{h} on {monitor}: {p:?}");
                    assert!(p.height <= monitor.h, "{w}x{h} on {monitor}: {p:?}");
                }
            }
        }
    }

    #[test]
    fn test_scale_downscale_exact() {
        let p = place(3840, 2160, &FULL_HD, ImageMode::Scale, false);
        assert_eq!((p.x, p.y, p.width, p.height), (0, 0, 1920, 1080));
    }

    #[test]
    fn test_scale_letterbox() {
        let p = place(540, 540, &FULL_HD, ImageMode::Scale, false);
        assert_eq!((p.width, p.height), (1080, 1080));
        assert_eq!((p.x, p.y), (420, 0));
    }

    #[test]
    fn test_rotation_swaps_dimensions() {
        // Portrait image on a landscape monitor
        let rotated = place(1080, 1920, &FULL_HD, ImageMode::Scale, true);
        let swapped = place(1920, 1080, &FULL_HD, ImageMode::Scale, false);
        assert!(rotated.rotated);
        assert_eq!(
            (rotated.x, rotated.y, rotated.width, rotated.height),
            (swapped.x, swapped.y, swapped.width, swapped.height)
        );

        // Landscape image on a portrait monitor
        let portrait = Monitor::new(0, 0, 1080, 1920);
        assert!(place(800, 600, &portrait, ImageMode::Center, true).rotated);

        // Matching orientation or rotation disabled
        assert!(!place(800, 600, &FULL_HD, ImageMode::Scale, true).rotated);
        assert!(!place(1080, 1920, &FULL_HD, ImageMode::Scale, false).rotated);
    }

    #[test]
    fn test_square_monitor_never_rotates() {
        let square = Monitor::new(0, 0, 1024, 1024);
        assert!(!needs_rotation(800, 600, &square));
        assert!(!needs_rotation(600, 800, &square));
    }

    #[test]
    fn test_placement_is_deterministic() {
        for mode in [ImageMode::Center, ImageMode::Zoom, ImageMode::Scale] {
            for rotate in [false, true] {
                let first = place(1234, 567, &FULL_HD, mode, rotate);
                for _ in 0..10 {
                    assert_eq!(place(1234, 567, &FULL_HD, mode, rotate), first);
                }
            }
        }
    }

    #[test]
    fn test_degenerate_input() {
        let p = place(0, 600, &FULL_HD, ImageMode::Scale, false);
        assert!(!p.is_visible());
        let p = place(800, 600, &Monitor::new(0, 0, 0, 0), ImageMode::Zoom, false);
        assert!(!p.is_visible());
    }

    #[test]
    fn test_round_robin_selection() {
        let picks: Vec<_> = (0..5).map(|i| image_index_for(i, 2).unwrap()).collect();
        assert_eq!(picks, vec![0, 1, 0, 1, 0]);
        assert_eq!(image_index_for(3, 1), Some(0));
        assert_eq!(image_index_for(0, 0), None);
    }
}
