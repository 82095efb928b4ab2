//! Error types for exposure conversion.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for exposure-equiv operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to callers. Malformed metadata never ends up here: it degrades to
/// `None` fields or non-finite arithmetic instead.
#[derive(Error, Debug)]
pub enum Error {
    /// The image bytes could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A conversion needed source metadata that is not available.
    #[error(transparent)]
    MissingMetadata(#[from] MissingMetadata),

    /// The camera preset catalog could not be loaded.
    #[error("Failed to load camera catalog: {message}")]
    Catalog {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Which precondition of a metadata-based conversion was unmet.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MissingMetadata {
    #[error("No metadata available. Extract metadata from a photo first.")]
    NotExtracted,
    #[error("Incomplete camera metadata. Missing {}.", join_fields(.missing))]
    Incomplete { missing: Vec<CameraField> },
}

/// A camera setting required as a conversion source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraField {
    FNumber,
    ExposureTime,
    Iso,
}

impl fmt::Display for CameraField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CameraField::FNumber => "f-number",
            CameraField::ExposureTime => "exposure time",
            CameraField::Iso => "ISO",
        };
        f.write_str(name)
    }
}

fn join_fields(fields: &[CameraField]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Create a catalog error with its underlying cause.
    pub fn catalog<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Catalog {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// User-facing guidance for the error.
    pub fn user_message(&self) -> String {
        match self {
            Error::Io { .. } => {
                "Could not read the image file. Please check the path and try again.".to_string()
            }
            Error::MissingMetadata(MissingMetadata::NotExtracted) => {
                "Please capture or choose a photo before converting.".to_string()
            }
            Error::MissingMetadata(MissingMetadata::Incomplete { missing }) => format!(
                "This photo does not record its {}. Enter the value manually.",
                join_fields(missing)
            ),
            Error::Catalog { .. } => "The camera list could not be loaded.".to_string(),
        }
    }
}
