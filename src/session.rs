use std::path::Path;

use crate::convert::{self, ConversionResult, ExposureTriple, ExposureValue};
use crate::error::{CameraField, MissingMetadata, Result};
use crate::exif::{self, ExposureMetadata};
use crate::presets::{Camera, CameraCatalog, Lens};

/// Holds the most recently extracted metadata and the selected camera/lens preset.
///
/// Each extraction replaces the cached metadata (last writer wins). Use separate
/// sessions for concurrent extractions.
///
/// # Example
///
/// ```rust,no_run
/// use exposure_equiv::convert::ExposureTriple;
/// use exposure_equiv::session::ExposureSession;
///
/// # async fn example() -> exposure_equiv::error::Result<()> {
/// let mut session = ExposureSession::new();
/// session.extract_from_path("photo.jpg".as_ref(), None).await?;
///
/// let result = session.convert_from_metadata(&ExposureTriple::new(8.0, "1/125", 100u32))?;
/// println!("{} stops", result.stops);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ExposureSession {
    metadata: Option<ExposureMetadata>,
    catalog: CameraCatalog,
    selected_camera: Option<usize>,
    selected_lens: Option<usize>,
}

impl ExposureSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata from the last extraction, if any.
    pub fn metadata(&self) -> Option<&ExposureMetadata> {
        self.metadata.as_ref()
    }

    /// Decode and normalize an in-memory image. Never fails: undecodable metadata
    /// becomes fallback metadata with the given dimensions.
    pub fn extract_from_bytes(
        &mut self,
        bytes: &[u8],
        fallback_dimensions: Option<(u32, u32)>,
    ) -> &ExposureMetadata {
        let decoded = exif::decode_tags(bytes);
        self.metadata
            .insert(exif::normalize_decoded(decoded, fallback_dimensions))
    }

    /// Read an image file and extract its metadata. Fails only when the file cannot be read.
    pub async fn extract_from_path(
        &mut self,
        path: &Path,
        fallback_dimensions: Option<(u32, u32)>,
    ) -> Result<&ExposureMetadata> {
        let bytes = exif::read_source(path).await?;
        Ok(self.extract_from_bytes(&bytes, fallback_dimensions))
    }

    /// Replace the cached metadata, e.g. with metadata normalized elsewhere.
    pub fn set_metadata(&mut self, metadata: ExposureMetadata) {
        self.metadata = Some(metadata);
    }

    /// The source triple recorded in the cached metadata.
    pub fn source_triple(&self) -> std::result::Result<ExposureTriple, MissingMetadata> {
        let camera = &self
            .metadata
            .as_ref()
            .ok_or(MissingMetadata::NotExtracted)?
            .camera;

        let mut missing = Vec::new();
        let f_number = present(&camera.f_number, CameraField::FNumber, &mut missing);
        let exposure_time = present(&camera.exposure_time, CameraField::ExposureTime, &mut missing);
        let iso = camera.iso.filter(|iso| *iso != 0);
        if iso.is_none() {
            missing.push(CameraField::Iso);
        }

        match (f_number, exposure_time, iso) {
            (Some(f_number), Some(exposure_time), Some(iso)) => Ok(ExposureTriple {
                f_number,
                exposure_time,
                iso: ExposureValue::from(iso),
            }),
            _ => Err(MissingMetadata::Incomplete { missing }),
        }
    }

    /// Convert from the cached metadata to `target`.
    pub fn convert_from_metadata(&self, target: &ExposureTriple) -> Result<ConversionResult> {
        let original = self.source_triple()?;
        Ok(convert::convert(&original, target))
    }

    /// Install a preset catalog and select its first camera.
    pub fn set_catalog(&mut self, catalog: CameraCatalog) {
        self.selected_camera = if catalog.is_empty() { None } else { Some(0) };
        self.selected_lens = None;
        self.catalog = catalog;
    }

    /// Load a preset catalog from JSON and select its first camera.
    pub fn load_catalog(&mut self, path: &Path) -> Result<&[Camera]> {
        let catalog = CameraCatalog::load(path)?;
        self.set_catalog(catalog);
        Ok(&self.catalog.cameras)
    }

    pub fn cameras(&self) -> &[Camera] {
        &self.catalog.cameras
    }

    /// Select a camera by index. Out-of-range indices leave the selection unchanged.
    pub fn select_camera(&mut self, index: usize) -> Option<&Camera> {
        if index >= self.catalog.cameras.len() {
            return None;
        }
        if self.selected_camera != Some(index) {
            self.selected_lens = None;
        }
        self.selected_camera = Some(index);
        self.catalog.get(index)
    }

    /// Select a lens of the current camera. An invalid index clears the lens selection.
    pub fn select_lens(&mut self, index: usize) -> Option<&Lens> {
        let valid = self
            .selected_camera()
            .is_some_and(|camera| index < camera.lenses.len());
        self.selected_lens = valid.then_some(index);
        self.selected_lens()
    }

    pub fn selected_camera(&self) -> Option<&Camera> {
        self.selected_camera.and_then(|i| self.catalog.get(i))
    }

    pub fn selected_lens(&self) -> Option<&Lens> {
        let lens = self.selected_lens?;
        self.selected_camera()?.lenses.get(lens)
    }
}

fn present(
    value: &Option<ExposureValue>,
    field: CameraField,
    missing: &mut Vec<CameraField>,
) -> Option<ExposureValue> {
    match value {
        Some(v) if !v.is_blank() => Some(v.clone()),
        _ => {
            missing.push(field);
            None
        }
    }
}
