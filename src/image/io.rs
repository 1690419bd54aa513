//! I/O helpers for rasters and JSON.
//!
//! - `load_rgb_image`: read a PNG/JPEG/etc. into an owned RGB buffer.
//! - `save_rgb_png` / `save_gray_png`: dump buffers for inspection.
//! - `write_atomic`: replace a file via a temporary sibling and rename.
//! - `write_json_file`: pretty-print a serializable value, atomically.
use super::{ImageGray8, ImageRgb8, ImageView};
use crate::error::{Error, Result};
use image::{GrayImage, RgbImage};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Load an image from disk and convert to 8-bit RGB.
pub fn load_rgb_image(path: &Path) -> Result<ImageRgb8> {
    let img = image::open(path)
        .map_err(|e| Error::ImageLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?
        .into_rgb8();
    let width = img.width() as usize;
    let height = img.height() as usize;
    ImageRgb8::from_raw(width, height, img.into_raw()).ok_or_else(|| Error::ImageLoad {
        path: path.to_path_buf(),
        reason: "decoded buffer has unexpected size".to_string(),
    })
}

/// Save an RGB buffer as PNG.
pub fn save_rgb_png(buffer: &ImageRgb8, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let image = RgbImage::from_raw(buffer.w as u32, buffer.h as u32, packed_samples(buffer))
        .ok_or_else(|| Error::InvalidDocument("failed to create image buffer".to_string()))?;
    image
        .save(path)
        .map_err(|e| Error::Io(std::io::Error::other(format!("{}: {e}", path.display()))))
}

/// Save a single-channel buffer as grayscale PNG.
pub fn save_gray_png(buffer: &ImageGray8, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let image = GrayImage::from_raw(buffer.w as u32, buffer.h as u32, packed_samples(buffer))
        .ok_or_else(|| Error::InvalidDocument("failed to create image buffer".to_string()))?;
    image
        .save(path)
        .map_err(|e| Error::Io(std::io::Error::other(format!("{}: {e}", path.display()))))
}

/// Visible samples of a view without row padding.
fn packed_samples<I: ImageView<Pixel = u8>>(img: &I) -> Vec<u8> {
    let row_len = img.width() * img.channels();
    match img.as_slice() {
        Some(data) if img.stride() == row_len => data[..row_len * img.height()].to_vec(),
        _ => img.rows().flat_map(|r| r.iter().copied()).collect(),
    }
}

/// Write `bytes` to `path` so that readers see either the old file or the
/// complete new one. The temporary file lives in the target's directory so the
/// final rename stays on one filesystem.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    ensure_parent_dir(path)?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    write_atomic(path, json.as_bytes())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_replaces_existing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.txt");
        write_atomic(&path, b"first").expect("write");
        write_atomic(&path, b"second").expect("rewrite");
        assert_eq!(fs::read(&path).expect("read"), b"second");
        let leftovers = fs::read_dir(dir.path()).expect("list").count();
        assert_eq!(leftovers, 1, "temporary file must not be left behind");
    }

    #[test]
    fn missing_image_is_image_load_error() {
        let err = load_rgb_image(Path::new("/nonexistent/rom.png")).unwrap_err();
        assert!(matches!(err, Error::ImageLoad { .. }));
    }

    #[test]
    fn png_round_trip_preserves_pixels() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("img.png");
        let mut img = ImageRgb8::new(3, 2);
        img.set(1, 1, [10, 200, 30]);
        save_rgb_png(&img, &path).expect("save");
        let back = load_rgb_image(&path).expect("load");
        assert_eq!(back, img);
    }

    #[test]
    fn padded_gray_rows_are_packed_on_save() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("mask.png");
        let mask = ImageGray8 {
            w: 2,
            h: 2,
            stride: 3,
            data: vec![1, 2, 99, 3, 4, 99],
        };
        save_gray_png(&mask, &path).expect("save");
        let back = image::open(&path).expect("open").into_luma8();
        assert_eq!(back.into_raw(), vec![1, 2, 3, 4]);
    }
}
