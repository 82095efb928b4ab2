//! EXIF metadata decoding and normalization.
//!
//! This module provides the path from image bytes to a canonical exposure triple:
//!
//! - [`read_source`] — Read all bytes of an image file
//! - [`decode_tags`] — Decode EXIF into a [`RawTagCollection`] keyed by tag name
//! - [`normalize`] — Resolve aperture, exposure time, ISO, device and image fields,
//!   including the APEX fallbacks (`ApertureValue`, `ShutterSpeedValue`)
//! - [`normalize_decoded`] — Same, but turns a decode failure into fallback metadata

mod normalize;
mod reader;
pub(crate) mod tags;

pub use normalize::{
    CameraSettings, DeviceInfo, ExposureMetadata, ImageInfo, normalize, normalize_decoded,
};
pub use reader::{DecodeError, decode_tags, read_source};
#[cfg(test)]
pub(crate) use reader::sample_jpeg;
pub use tags::{RawTagCollection, TagRecord, TagValue};
