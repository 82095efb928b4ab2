use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::convert::ExposureValue;
use crate::error::{Error, Result};

/// A static list of camera bodies and their lenses, used to pick conversion targets.
///
/// # Format
///
/// ```json
/// {
///   "cameras": [
///     {
///       "name": "Pentax K1000",
///       "id": "k1000",
///       "lenses": [{ "name": "SMC 50mm f/2", "fNumber": 2.0 }]
///     }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraCatalog {
    #[serde(default)]
    pub cameras: Vec<Camera>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub name: String,
    pub id: String,
    #[serde(default)]
    pub lenses: Vec<Lens>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lens {
    pub name: String,
    /// Aperture this lens is usually shot at; becomes the target f-number when selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f_number: Option<ExposureValue>,
}

impl CameraCatalog {
    /// Load a catalog from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::catalog(format!("cannot read {}", path.display()), e))?;
        let catalog = Self::from_json(&contents)?;
        log::info!(
            "Loaded {} camera(s) from {}",
            catalog.cameras.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Parse a catalog from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::catalog("invalid catalog JSON", e))
    }

    pub fn get(&self, index: usize) -> Option<&Camera> {
        self.cameras.get(index)
    }

    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }
}
