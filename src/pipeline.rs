use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::convert::{ConversionResult, ExposureTriple};
use crate::error::Error;
use crate::exif::ExposureMetadata;
use crate::session::ExposureSession;

/// The containers nom-exif locates EXIF in, detected from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// APP1 `Exif` segment
    Jpeg,
    /// IFD chain at the file head; DNG and NEF are TIFF-structured
    Tiff,
    /// ISO-BMFF `Exif` item
    Heif,
}

impl Container {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "tif" | "tiff" | "dng" | "nef" => Some(Self::Tiff),
            "heic" | "heif" => Some(Self::Heif),
            _ => None,
        }
    }
}

/// The result of converting a single image against a target exposure.
///
/// # Example
///
/// ```rust,no_run
/// # use exposure_equiv::pipeline::process_image;
/// # use exposure_equiv::config::Config;
/// # use exposure_equiv::session::ExposureSession;
/// # async fn example() {
/// # let config = Config::default();
/// let mut session = ExposureSession::new();
/// let result = process_image("photo.jpg".as_ref(), &mut session, &config.default_target, &config).await;
///
/// if let Some(ref conversion) = result.conversion {
///     println!("{} stops", conversion.stops);
/// }
/// # }
/// ```
#[derive(Debug, Serialize)]
pub struct ProcessResult {
    pub path: PathBuf,
    pub metadata: Option<ExposureMetadata>,
    pub conversion: Option<ConversionResult>,
    pub error: Option<String>,
    /// What the user can do about `error`.
    pub hint: Option<String>,
}

impl ProcessResult {
    fn record_error(&mut self, err: &Error) {
        self.error = Some(err.to_string());
        self.hint = Some(err.user_message());
    }
}

/// Collect the images whose container nom-exif can read.
///
/// Files are kept in argument order; directories are walked recursively (following
/// symlinks) in file-name order.
pub fn collect_images(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut images = Vec::new();

    for path in paths {
        if path.is_file() {
            match Container::from_path(path) {
                Some(_) => images.push(path.clone()),
                None => log::warn!("No EXIF container for {}, skipping", path.display()),
            }
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let p = entry.path();
                if let (true, Some(container)) = (p.is_file(), Container::from_path(p)) {
                    log::debug!("{container:?}: {}", p.display());
                    images.push(p.to_path_buf());
                }
            }
        } else {
            log::warn!("Path does not exist: {}", path.display());
        }
    }

    images
}

/// Extract metadata from one image and convert it against `target`.
///
/// Read failures and missing metadata are recorded in [`ProcessResult::error`];
/// the metadata that was extracted is kept either way.
pub async fn process_image(
    path: &Path,
    session: &mut ExposureSession,
    target: &ExposureTriple,
    config: &Config,
) -> ProcessResult {
    let mut result = ProcessResult {
        path: path.to_path_buf(),
        metadata: None,
        conversion: None,
        error: None,
        hint: None,
    };

    match session
        .extract_from_path(path, config.fallback_dimensions)
        .await
    {
        Ok(metadata) => result.metadata = Some(metadata.clone()),
        Err(e) => {
            result.record_error(&e);
            return result;
        }
    }

    match session.convert_from_metadata(target) {
        Ok(conversion) => result.conversion = Some(conversion),
        Err(e) => result.record_error(&e),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    // ── Container ────────────────────────────────────────────────────

    #[test]
    fn container_from_extension() {
        assert_eq!(Container::from_path(Path::new("a.JPG")), Some(Container::Jpeg));
        assert_eq!(Container::from_path(Path::new("a.dng")), Some(Container::Tiff));
        assert_eq!(Container::from_path(Path::new("a.HEIF")), Some(Container::Heif));
    }

    #[test]
    fn formats_without_exif_support_are_rejected() {
        for name in ["a.png", "a.webp", "a.avif", "a.cr3", "a.raf", "jpg"] {
            assert_eq!(Container::from_path(Path::new(name)), None, "{name}");
        }
    }

    // ── collect_images ───────────────────────────────────────────────

    #[test]
    fn explicit_files_keep_argument_order() {
        let dir = TempDir::new().unwrap();
        let b = dir.path().join("b.heic");
        let a = dir.path().join("a.jpeg");
        let png = dir.path().join("c.png");
        for p in [&a, &b, &png] {
            fs::write(p, b"x").unwrap();
        }

        let images = collect_images(&[b.clone(), png, a.clone()]);
        assert_eq!(images, vec![b, a]);
    }

    #[test]
    fn directory_walk_is_sorted_and_recursive() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("raw");
        fs::create_dir(&sub).unwrap();
        fs::write(dir.path().join("z.jpg"), b"x").unwrap();
        fs::write(dir.path().join("m.webp"), b"x").unwrap();
        fs::write(sub.join("a.nef"), b"x").unwrap();

        let images = collect_images(&[dir.path().to_path_buf()]);
        let names: Vec<_> = images
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(names, vec![PathBuf::from("raw/a.nef"), PathBuf::from("z.jpg")]);
    }

    #[test]
    fn missing_path_yields_nothing() {
        assert!(collect_images(&[PathBuf::from("/nonexistent/path")]).is_empty());
    }

    // ── process_image ────────────────────────────────────────────────

    #[tokio::test]
    async fn process_image_without_exif_reports_incomplete() {
        let dir = TempDir::new().unwrap();
        let jpg = dir.path().join("blank.jpg");
        fs::write(&jpg, b"fake").unwrap();

        let mut config = Config::default();
        config.fallback_dimensions = Some((800, 600));
        let mut session = ExposureSession::new();

        let result = process_image(&jpg, &mut session, &config.default_target, &config).await;
        let metadata = result.metadata.expect("fallback metadata");
        assert_eq!(metadata.image.width, Some(800));
        assert!(result.conversion.is_none());
        assert!(result.error.unwrap().contains("Incomplete"));
        assert!(result.hint.unwrap().contains("ISO"));
    }

    #[tokio::test]
    async fn process_collected_jpeg() {
        let dir = TempDir::new().unwrap();
        let jpg = dir.path().join("shot.jpg");
        fs::write(&jpg, crate::exif::sample_jpeg()).unwrap();

        let config = Config::default();
        let mut session = ExposureSession::new();
        let images = collect_images(&[dir.path().to_path_buf()]);
        assert_eq!(images, vec![jpg]);

        let target = ExposureTriple::new(2.8, "1/250", 100u32);
        let result = process_image(&images[0], &mut session, &target, &config).await;
        assert!(result.error.is_none());
        assert!(result.hint.is_none());
        assert_eq!(result.conversion.unwrap().stops, 2.0);
    }

    #[tokio::test]
    async fn process_image_unreadable_file() {
        let config = Config::default();
        let mut session = ExposureSession::new();

        let result = process_image(
            Path::new("/nonexistent/photo.jpg"),
            &mut session,
            &config.default_target,
            &config,
        )
        .await;
        assert!(result.metadata.is_none());
        assert!(result.error.unwrap().contains("Failed to read"));
        assert!(result.hint.unwrap().contains("check the path"));
    }
}
