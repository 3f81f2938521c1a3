//! Choosing which of the expanded image sources end up on screen.
//!
//! Collections often ship one file per resolution, named `*_WxH.ext`;
//! `Pick::Closest` takes the one nearest the average monitor size.

use anyhow::{Result, bail};
use clap::ValueEnum;
use common::Monitor;
use rand::rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// How to choose among the available images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pick {
    /// Use every image, cycled over the monitors
    #[default]
    All,
    /// The image whose file name resolution is closest to the average monitor
    Closest,
    /// One image at random
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Sum of the width and height differences
pub fn distance(a: Resolution, b: Resolution) -> u32 {
    a.width.abs_diff(b.width) + a.height.abs_diff(b.height)
}

/// Average monitor size, truncated. `None` without monitors.
pub fn average_resolution(monitors: &[Monitor]) -> Option<Resolution> {
    let count = u64::try_from(monitors.len()).ok().filter(|&n| n > 0)?;
    let (w, h) = monitors.iter().fold((0u64, 0u64), |(w, h), m| {
        (
            w + u64::from(m.w.unsigned_abs()),
            h + u64::from(m.h.unsigned_abs()),
        )
    });
    Some(Resolution::new(
        u32::try_from(w / count).ok()?,
        u32::try_from(h / count).ok()?,
    ))
}

/// Parse `WIDTHxHEIGHT`, the `x` in either case
pub fn parse_size(size: &str) -> Option<Resolution> {
    let (w, h) = size.split_once(['x', 'X'])?;
    let number = |s: &str| {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse::<u32>().ok()
    };
    Some(Resolution::new(number(w)?, number(h)?))
}

/// Resolution encoded in a file name such as `forest_1920x1080.jpg` or
/// `1920x1080.png`
pub fn filename_resolution(path: &Path) -> Option<Resolution> {
    let stem = path.file_stem()?.to_str()?;
    let size = stem.rsplit('_').next().unwrap_or(stem);
    parse_size(size)
}

/// The image whose name is closest to `target`. Names without a resolution
/// are skipped; ties go to the earliest path.
pub fn closest_by_resolution(images: &[PathBuf], target: Resolution) -> Option<&PathBuf> {
    images
        .iter()
        .filter_map(|path| match filename_resolution(path) {
            Some(res) => Some((path, distance(target, res))),
            None => {
                log::debug!("No resolution in file name: {}", path.display());
                None
            }
        })
        .min_by_key(|&(_, dist)| dist)
        .map(|(path, _)| path)
}

/// Narrow `images` down according to `pick`
pub fn pick_images(
    images: Vec<PathBuf>,
    pick: Pick,
    monitors: &[Monitor],
) -> Result<Vec<PathBuf>> {
    match pick {
        Pick::All => Ok(images),
        Pick::Random => match images.choose(&mut rng()) {
            Some(path) => Ok(vec![path.clone()]),
            None => bail!("No image to pick from"),
        },
        Pick::Closest => {
            let Some(target) = average_resolution(monitors) else {
                bail!("No monitor to compare image resolutions against");
            };
            match closest_by_resolution(&images, target) {
                Some(path) => {
                    log::info!(
                        "Picked {} as closest to the average resolution {}",
                        path.display(),
                        target
                    );
                    Ok(vec![path.clone()])
                }
                None => bail!("No image file name carries a WIDTHxHEIGHT resolution"),
            }
        }
    }
}
