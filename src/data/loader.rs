// ============================================================
// Layer 4 — Image Folder Loader
// ============================================================
// Discovers training images under one or more dataroots and
// decodes them on demand.
//
// Discovery walks every root recursively (walkdir) and keeps
// files whose extension is a known raster format. The result is
// sorted so index → path is stable across runs and workers.
//
// Decoding uses the `image` crate and normalises every source
// (grey, RGBA, 16-bit, ...) to RGB f32 in [0, 1]. A file that
// cannot be decoded is an error for that sample: training data
// integrity matters more than keeping the epoch alive.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::domain::traits::ImageSource;
use crate::error::{CoreError, Result};

/// File extensions treated as images during discovery
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "webp", "tif", "tiff"];

/// Image paths gathered from a set of dataroots
#[derive(Debug, Clone)]
pub struct ImageFolderSource {
    paths: Vec<PathBuf>,
}

impl ImageFolderSource {
    /// Scan every root and collect image files.
    /// Fails if nothing was found; an empty dataset cannot be sampled.
    pub fn scan<P: AsRef<Path>>(roots: &[P]) -> Result<Self> {
        let mut paths = Vec::new();

        for root in roots {
            let root: &Path = root.as_ref();
            if !root.exists() {
                tracing::warn!("Dataroot '{}' does not exist; skipping", root.display());
                continue;
            }

            let before = paths.len();
            for entry in WalkDir::new(root).follow_links(true).into_iter().filter_map(|e| e.ok()) {
                if entry.file_type().is_file() && is_image_file(entry.path()) {
                    paths.push(entry.into_path());
                }
            }
            tracing::debug!("Found {} images under '{}'", paths.len() - before, root.display());
        }

        if paths.is_empty() {
            let joined = roots
                .iter()
                .map(|r| AsRef::<Path>::as_ref(r).display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(CoreError::EmptyDataroot(joined));
        }

        paths.sort();
        tracing::info!("Indexed {} images", paths.len());
        Ok(Self { paths })
    }

    /// Build directly from a known list of paths
    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl ImageSource for ImageFolderSource {
    fn len(&self) -> usize {
        self.paths.len()
    }

    fn path(&self, index: usize) -> String {
        self.paths[index].display().to_string()
    }

    fn read(&self, index: usize) -> Result<image::Rgb32FImage> {
        read_rgb(&self.paths[index])
    }
}

/// Decode one file as RGB f32
pub fn read_rgb(path: &Path) -> Result<image::Rgb32FImage> {
    let img = image::open(path).map_err(|source| CoreError::ImageRead {
        path: path.display().to_string(),
        source,
    })?;
    Ok(img.into_rgb32f())
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::fs;

    fn write_png(path: &Path, w: u32, h: u32) {
        RgbImage::from_pixel(w, h, Rgb([255, 0, 0])).save(path).unwrap();
    }

    #[test]
    fn test_scan_is_recursive_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        write_png(&dir.path().join("b.png"), 4, 4);
        write_png(&dir.path().join("nested/a.png"), 4, 4);
        fs::write(dir.path().join("notes.txt"), "not an image").unwrap();

        let source = ImageFolderSource::scan(&[dir.path()]).unwrap();
        assert_eq!(source.len(), 2);
        let names: Vec<String> = source.paths().iter().map(|p| p.display().to_string()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_empty_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImageFolderSource::scan(&[dir.path()]).unwrap_err();
        assert!(matches!(err, CoreError::EmptyDataroot(_)));
    }

    #[test]
    fn test_read_normalises_to_unit_range() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("red.png");
        write_png(&path, 3, 2);

        let img = read_rgb(&path).unwrap();
        assert_eq!(img.dimensions(), (3, 2));
        let px = img.get_pixel(1, 1);
        assert!((px[0] - 1.0).abs() < 1e-6);
        assert!(px[1].abs() < 1e-6);
    }

    #[test]
    fn test_unreadable_file_fails() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        fs::write(&path, b"definitely not a png").unwrap();

        let source = ImageFolderSource::from_paths(vec![path]);
        assert!(matches!(source.read(0), Err(CoreError::ImageRead { .. })));
    }
}
