//! Bundled default preview image.

use std::io;
use std::path::{Path, PathBuf};

/// Preview image used for new items published without one.
pub const DEFAULT_PREVIEW: &[u8] = include_bytes!("../assets/PreviewImage.png");

/// File name the default preview is written under.
pub const DEFAULT_PREVIEW_NAME: &str = "PreviewImage.png";

/// Writes the default preview into `dir` and returns its path.
///
/// An existing file with the same content is reused as is.
pub fn write_default_preview(dir: &Path) -> io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(DEFAULT_PREVIEW_NAME);
    match std::fs::read(&path) {
        Ok(existing) if existing == DEFAULT_PREVIEW => {}
        _ => std::fs::write(&path, DEFAULT_PREVIEW)?,
    }
    Ok(path)
}
