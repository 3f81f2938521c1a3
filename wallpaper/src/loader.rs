use common::{Result, WallpaperError};
use image::RgbaImage;
use std::path::{Path, PathBuf};

/// A decoded source image and the file it came from.
pub struct SourceImage {
    path: PathBuf,
    pixels: RgbaImage,
}

impl SourceImage {
    pub fn new(path: impl Into<PathBuf>, pixels: RgbaImage) -> Self {
        Self {
            path: path.into(),
            pixels,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

impl std::fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceImage")
            .field("path", &self.path)
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// Check if a file is an SVG (rasterised with resvg)
pub fn is_svg(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"))
}

/// Load and decode an image from a file path
pub fn load_image(path: impl AsRef<Path>) -> Result<SourceImage> {
    let path = path.as_ref();
    log::debug!("Loading image: {}", path.display());

    let pixels = if is_svg(path) {
        render_svg(path)?
    } else {
        image::open(path)
            .map_err(|e| {
                WallpaperError::Decode(format!("cannot load image {}: {}", path.display(), e))
            })?
            .to_rgba8()
    };

    if pixels.width() == 0 || pixels.height() == 0 {
        return Err(WallpaperError::Decode(format!(
            "image {} has no pixels",
            path.display()
        )));
    }

    log::info!(
        "Loaded image: {}x{} ({})",
        pixels.width(),
        pixels.height(),
        path.display()
    );

    Ok(SourceImage::new(path, pixels))
}

/// Rasterise an SVG at its intrinsic size
fn render_svg(path: &Path) -> Result<RgbaImage> {
    use resvg::{tiny_skia, usvg};

    let data = std::fs::read(path).map_err(|e| {
        WallpaperError::Decode(format!("cannot read image {}: {}", path.display(), e))
    })?;
    let tree = usvg::Tree::from_data(&data, &usvg::Options::default()).map_err(|e| {
        WallpaperError::Decode(format!("cannot parse SVG {}: {}", path.display(), e))
    })?;

    let size = tree.size().to_int_size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height()).ok_or_else(|| {
        WallpaperError::Allocation(format!(
            "cannot allocate {}x{} pixmap for {}",
            size.width(),
            size.height(),
            path.display()
        ))
    })?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    // tiny-skia stores premultiplied RGBA
    let raw: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();

    RgbaImage::from_raw(size.width(), size.height(), raw).ok_or_else(|| {
        WallpaperError::Decode(format!("SVG {} rendered to a bad buffer", path.display()))
    })
}
