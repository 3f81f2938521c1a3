use anyhow::{Result, bail};
use glob::glob;
use std::path::{Path, PathBuf};

/// File extensions picked up when a source is a directory or a glob pattern
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "webp", "gif", "bmp", "tif", "tiff", "svg",
];

/// Expand image sources (files, directories or glob patterns) into image paths.
///
/// `~` and environment variables are expanded. Directories contribute every
/// image directly inside them, matched by extension in any case. The result
/// is sorted and free of duplicates.
pub fn expand_sources(sources: &[String]) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();

    for source in sources {
        let expanded = match shellexpand::full(source) {
            Ok(expanded) => expanded,
            Err(e) => bail!("Failed to expand image source '{}': {}", source, e),
        };

        let path = Path::new(expanded.as_ref());
        if path.is_file() {
            images.push(path.to_path_buf());
            continue;
        }

        let pattern = if path.is_dir() {
            format!("{}/*", glob::Pattern::escape(expanded.trim_end_matches('/')))
        } else {
            expanded.into_owned()
        };

        match glob(&pattern) {
            Ok(entries) => {
                images.extend(
                    entries
                        .flatten()
                        .filter(|entry| entry.is_file() && has_image_extension(entry)),
                );
            }
            Err(e) => {
                log::warn!("Failed to glob pattern '{}': {}", source, e);
            }
        }
    }

    images.sort();
    images.dedup();

    Ok(images)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}
