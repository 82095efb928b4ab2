//! # exposure-equiv
//!
//! Exposure-equivalence calculator — read aperture, shutter speed and ISO from a photo's
//! EXIF metadata and express a target exposure as a light ratio and a number of stops.
//!
//! ## Quick Start
//!
//! The simplest way to use the library is through [`session::ExposureSession`], which
//! handles the full read → normalize → convert flow:
//!
//! ```rust,no_run
//! use exposure_equiv::convert::ExposureTriple;
//! use exposure_equiv::session::ExposureSession;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut session = ExposureSession::new();
//!
//!     // Read and normalize metadata (never fails on bad metadata, only on I/O)
//!     let metadata = session.extract_from_path("photo.jpg".as_ref(), None).await?;
//!     println!("Shot with {:?} {:?}", metadata.device.make, metadata.device.model);
//!
//!     // Compare against f/8, 1/125s, ISO 100
//!     let target = ExposureTriple::new(8.0, "1/125", 100u32);
//!     let result = session.convert_from_metadata(&target)?;
//!     println!("factor {:.3}, {} stops", result.factor, result.stops);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Lower-Level Usage
//!
//! Normalization and conversion are plain functions over values:
//!
//! ```rust
//! use exposure_equiv::convert::{compute_factor, convert, ExposureTriple, ExposureValue};
//! use exposure_equiv::exif::{normalize, RawTagCollection, TagRecord};
//!
//! let mut tags = RawTagCollection::new();
//! tags.insert("ApertureValue".into(), TagRecord::rational(6, 1));      // APEX 6 = f/8
//! tags.insert("ShutterSpeedValue".into(), TagRecord::rational(7, 1));  // APEX 7 = 1/128
//! tags.insert("ISOSpeedRatings".into(), TagRecord::scalar(200.0));
//!
//! let metadata = normalize(&tags);
//! assert_eq!(metadata.camera.f_number, Some(ExposureValue::Number(8.0)));
//! assert_eq!(metadata.camera.exposure_time, Some(ExposureValue::Text("1/128".into())));
//!
//! let factor = compute_factor(
//!     &ExposureValue::Number(2.8),
//!     &ExposureValue::Number(2.8),
//!     &"1/100".into(),
//!     &"1/100".into(),
//!     &ExposureValue::Number(200.0),
//!     &ExposureValue::Number(100.0),
//! );
//! assert_eq!(factor, 2.0);
//! ```
//!
//! ## Modules
//!
//! - [`exif`] — EXIF decoding (`nom-exif`) and normalization into [`exif::ExposureMetadata`]
//! - [`convert`] — Exposure-time parsing, light factor and stops
//! - [`session`] — Host object caching the last metadata and the preset selection
//! - [`presets`] — Camera/lens preset catalog
//! - [`pipeline`] — Image collection and per-file processing
//! - [`config`] — Configuration types and loading/saving
//! - [`error`] — Error types

pub mod config;
pub mod convert;
pub mod error;
pub mod exif;
pub mod pipeline;
pub mod presets;
pub mod session;

pub use error::{Error, Result};
