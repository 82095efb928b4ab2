use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::reader::DecodeError;
use super::tags::{RawTagCollection, TagRecord, TagValue, format_number, rational_to_f64};
use crate::convert::ExposureValue;

/// Canonical metadata produced by [`normalize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureMetadata {
    pub device: DeviceInfo,
    pub image: ImageInfo,
    pub camera: CameraSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub make: Option<String>,
    pub model: Option<String>,
    pub software: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// EXIF orientation code (1–8).
    pub orientation: Option<u16>,
    /// Capture timestamp; the extraction time when the image carries none.
    pub created: String,
}

/// The exposure triple read from metadata. `None` means no tag supplied the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraSettings {
    pub exposure_time: Option<ExposureValue>,
    pub f_number: Option<ExposureValue>,
    pub iso: Option<u32>,
}

impl ExposureMetadata {
    /// Best-effort metadata for an image whose metadata could not be decoded.
    ///
    /// Dimensions default to `0` unless the caller knows the capture size.
    pub fn fallback(dimensions: Option<(u32, u32)>) -> Self {
        let (width, height) = dimensions.unwrap_or((0, 0));
        Self {
            device: DeviceInfo::default(),
            image: ImageInfo {
                width: Some(width),
                height: Some(height),
                orientation: None,
                created: now_timestamp(),
            },
            camera: CameraSettings::default(),
        }
    }
}

/// Normalize a raw tag collection. Missing or malformed tags become `None`.
pub fn normalize(tags: &RawTagCollection) -> ExposureMetadata {
    if log::log_enabled!(log::Level::Debug) {
        log::debug!(
            "Normalizing {} tag(s): {}",
            tags.len(),
            tags.keys().cloned().collect::<Vec<_>>().join(", ")
        );
    }

    let device = DeviceInfo {
        make: text_value(tags, "Make"),
        model: text_value(tags, "Model"),
        software: text_value(tags, "Software"),
    };

    let image = ImageInfo {
        width: first_of(tags, &["ImageWidth", "ExifImageWidth"], dimension),
        height: first_of(tags, &["ImageHeight", "ExifImageHeight"], dimension),
        orientation: u32_value(tags, "Orientation").and_then(|v| u16::try_from(v).ok()),
        created: text_value(tags, "DateTimeOriginal").unwrap_or_else(now_timestamp),
    };

    let camera = CameraSettings {
        exposure_time: exposure_time(tags),
        f_number: f_number(tags),
        iso: first_of(
            tags,
            &["ISOSpeedRatings", "PhotographicSensitivity"],
            |t| t.value.as_u32(),
        ),
    };

    ExposureMetadata {
        device,
        image,
        camera,
    }
}

/// Normalize the outcome of decoding, substituting fallback metadata on failure.
pub fn normalize_decoded(
    decoded: Result<RawTagCollection, DecodeError>,
    fallback_dimensions: Option<(u32, u32)>,
) -> ExposureMetadata {
    match decoded {
        Ok(tags) => normalize(&tags),
        Err(e) => {
            log::debug!("Metadata decode failed, using fallback metadata: {e}");
            ExposureMetadata::fallback(fallback_dimensions)
        }
    }
}

/// Read the named tags in order and return the first value `read` accepts.
fn first_of<T>(
    tags: &RawTagCollection,
    names: &[&str],
    read: impl Fn(&TagRecord) -> Option<T>,
) -> Option<T> {
    names.iter().filter_map(|name| tags.get(*name)).find_map(read)
}

/// Aperture: `FNumber`, then `ApertureValue` in APEX units.
fn f_number(tags: &RawTagCollection) -> Option<ExposureValue> {
    if let Some(tag) = tags.get("FNumber") {
        log::debug!("FNumber data: {tag:?}");
        return match &tag.value {
            TagValue::Rational(n, d) => rational_to_f64(*n, *d).map(ExposureValue::Number),
            _ => description_or_value(tag),
        };
    }

    let tag = tags.get("ApertureValue")?;
    log::debug!("Using ApertureValue instead: {tag:?}");
    match &tag.value {
        TagValue::Rational(n, d) => {
            let apex = rational_to_f64(*n, *d)?;
            Some(ExposureValue::Number(round_to(2f64.powf(apex / 2.0), 1)))
        }
        _ => tag.description.clone().map(ExposureValue::Text),
    }
}

/// Exposure time: `ExposureTime`, then `ShutterSpeedValue` in APEX units.
fn exposure_time(tags: &RawTagCollection) -> Option<ExposureValue> {
    if let Some(tag) = tags.get("ExposureTime") {
        log::debug!("ExposureTime data: {tag:?}");
        if let Some(desc) = &tag.description {
            return Some(ExposureValue::Text(desc.clone()));
        }
        return match &tag.value {
            TagValue::Rational(n, d) => Some(ExposureValue::Text(format!("{n}/{d}"))),
            _ => None,
        };
    }

    let tag = tags.get("ShutterSpeedValue")?;
    log::debug!("Using ShutterSpeedValue instead: {tag:?}");
    match &tag.value {
        TagValue::Rational(n, d) => {
            let apex = rational_to_f64(*n, *d)?;
            let denominator = 2f64.powf(apex).round();
            Some(ExposureValue::Text(format!("1/{}", format_number(denominator))))
        }
        _ => tag.description.clone().map(ExposureValue::Text),
    }
}

fn description_or_value(tag: &TagRecord) -> Option<ExposureValue> {
    if let Some(desc) = &tag.description {
        return Some(ExposureValue::Text(desc.clone()));
    }
    match &tag.value {
        TagValue::Scalar(v) => Some(ExposureValue::Number(*v)),
        TagValue::Text(s) if !s.trim().is_empty() => Some(ExposureValue::Text(s.clone())),
        _ => None,
    }
}

/// A pixel size; zero counts as unpopulated so the next tag is tried.
fn dimension(tag: &TagRecord) -> Option<u32> {
    tag.value.as_u32().filter(|v| *v != 0)
}

fn text_value(tags: &RawTagCollection, name: &str) -> Option<String> {
    tags.get(name).and_then(|t| t.value.as_text())
}

fn u32_value(tags: &RawTagCollection, name: &str) -> Option<u32> {
    tags.get(name).and_then(|t| t.value.as_u32())
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Current instant as an RFC 3339 UTC timestamp with millisecond precision.
pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn tags(entries: Vec<(&str, TagRecord)>) -> RawTagCollection {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    fn assert_recent(ts: &str) {
        let created = DateTime::parse_from_rfc3339(ts).unwrap();
        let age = Utc::now().signed_duration_since(created);
        assert!(age.num_seconds().abs() < 5, "timestamp {ts} is not recent");
    }

    // ── empty / fallback ─────────────────────────────────────────────

    #[test]
    fn empty_collection_yields_nulls() {
        let meta = normalize(&RawTagCollection::new());
        assert_eq!(meta.camera, CameraSettings::default());
        assert_eq!(meta.device, DeviceInfo::default());
        assert!(meta.image.width.is_none());
        assert!(meta.image.height.is_none());
        assert!(meta.image.orientation.is_none());
        assert_recent(&meta.image.created);
    }

    #[test]
    fn decode_failure_uses_fallback() {
        let meta = normalize_decoded(Err(DecodeError::NoExif), None);
        assert_eq!(meta.image.width, Some(0));
        assert_eq!(meta.image.height, Some(0));
        assert!(meta.device.make.is_none());
        assert!(meta.camera.f_number.is_none());
        assert!(meta.camera.exposure_time.is_none());
        assert!(meta.camera.iso.is_none());
        assert_recent(&meta.image.created);
    }

    #[test]
    fn decode_failure_keeps_caller_dimensions() {
        let meta = normalize_decoded(Err(DecodeError::NoExif), Some((1920, 1080)));
        assert_eq!(meta.image.width, Some(1920));
        assert_eq!(meta.image.height, Some(1080));
    }

    // ── aperture ─────────────────────────────────────────────────────

    #[test]
    fn f_number_rational() {
        let meta = normalize(&tags(vec![("FNumber", TagRecord::rational(28, 10))]));
        assert_eq!(meta.camera.f_number, Some(ExposureValue::Number(2.8)));
    }

    #[test]
    fn f_number_prefers_description_over_scalar() {
        let meta = normalize(&tags(vec![(
            "FNumber",
            TagRecord::scalar(2.8).with_description("f/2.8"),
        )]));
        assert_eq!(meta.camera.f_number, Some(ExposureValue::Text("f/2.8".into())));

        let meta = normalize(&tags(vec![("FNumber", TagRecord::scalar(4.0))]));
        assert_eq!(meta.camera.f_number, Some(ExposureValue::Number(4.0)));
    }

    #[test]
    fn f_number_wins_over_aperture_value() {
        let meta = normalize(&tags(vec![
            ("FNumber", TagRecord::rational(56, 10)),
            ("ApertureValue", TagRecord::rational(3, 1)),
        ]));
        assert_eq!(meta.camera.f_number, Some(ExposureValue::Number(5.6)));
    }

    #[test]
    fn aperture_value_apex_conversion() {
        for (n, d) in [(3i64, 1i64), (4, 1), (297, 100), (5, 2), (6, 1), (1, 3)] {
            let meta = normalize(&tags(vec![("ApertureValue", TagRecord::rational(n, d))]));
            let expected = (2f64.powf((n as f64 / d as f64) / 2.0) * 10.0).round() / 10.0;
            assert_eq!(meta.camera.f_number, Some(ExposureValue::Number(expected)));
        }

        // APEX 3 is f/2.8, APEX 6 is f/8
        let meta = normalize(&tags(vec![("ApertureValue", TagRecord::rational(3, 1))]));
        assert_eq!(meta.camera.f_number, Some(ExposureValue::Number(2.8)));
        let meta = normalize(&tags(vec![("ApertureValue", TagRecord::rational(6, 1))]));
        assert_eq!(meta.camera.f_number, Some(ExposureValue::Number(8.0)));
    }

    #[test]
    fn aperture_value_non_rational_uses_description() {
        let meta = normalize(&tags(vec![(
            "ApertureValue",
            TagRecord::scalar(3.0).with_description("f/2.8"),
        )]));
        assert_eq!(meta.camera.f_number, Some(ExposureValue::Text("f/2.8".into())));

        let meta = normalize(&tags(vec![("ApertureValue", TagRecord::scalar(3.0))]));
        assert!(meta.camera.f_number.is_none());
    }

    // ── exposure time ────────────────────────────────────────────────

    #[test]
    fn exposure_time_description_verbatim() {
        let meta = normalize(&tags(vec![(
            "ExposureTime",
            TagRecord::rational(10, 2500).with_description("1/250"),
        )]));
        assert_eq!(meta.camera.exposure_time, Some(ExposureValue::Text("1/250".into())));
    }

    #[test]
    fn exposure_time_rational_formatted() {
        let meta = normalize(&tags(vec![("ExposureTime", TagRecord::rational(1, 60))]));
        assert_eq!(meta.camera.exposure_time, Some(ExposureValue::Text("1/60".into())));
    }

    #[test]
    fn shutter_speed_value_apex_conversion() {
        for (n, d) in [(8i64, 1i64), (6, 1), (7965784, 1000000), (1, 2), (0, 1)] {
            let meta = normalize(&tags(vec![("ShutterSpeedValue", TagRecord::rational(n, d))]));
            let expected = format!("1/{}", 2f64.powf(n as f64 / d as f64).round() as i64);
            assert_eq!(meta.camera.exposure_time, Some(ExposureValue::Text(expected)));
        }

        let meta = normalize(&tags(vec![("ShutterSpeedValue", TagRecord::rational(8, 1))]));
        assert_eq!(meta.camera.exposure_time, Some(ExposureValue::Text("1/256".into())));
    }

    #[test]
    fn shutter_speed_value_non_rational_uses_description() {
        let meta = normalize(&tags(vec![(
            "ShutterSpeedValue",
            TagRecord::text("fast").with_description("1/500"),
        )]));
        assert_eq!(meta.camera.exposure_time, Some(ExposureValue::Text("1/500".into())));
    }

    // ── iso ──────────────────────────────────────────────────────────

    #[test]
    fn iso_primary_and_fallback() {
        let meta = normalize(&tags(vec![
            ("ISOSpeedRatings", TagRecord::scalar(400.0)),
            ("PhotographicSensitivity", TagRecord::scalar(800.0)),
        ]));
        assert_eq!(meta.camera.iso, Some(400));

        let meta = normalize(&tags(vec![("PhotographicSensitivity", TagRecord::scalar(800.0))]));
        assert_eq!(meta.camera.iso, Some(800));
    }

    // ── device / image ───────────────────────────────────────────────

    #[test]
    fn device_and_image_fields() {
        let meta = normalize(&tags(vec![
            ("Make", TagRecord::text("Canon")),
            ("Model", TagRecord::text("EOS R5")),
            ("Software", TagRecord::text("")),
            ("ExifImageWidth", TagRecord::scalar(8192.0)),
            ("ImageHeight", TagRecord::scalar(5464.0)),
            ("ExifImageHeight", TagRecord::scalar(1.0)),
            ("Orientation", TagRecord::scalar(6.0)),
            ("DateTimeOriginal", TagRecord::text("2024-05-01T10:20:30+02:00")),
        ]));
        assert_eq!(meta.device.make.as_deref(), Some("Canon"));
        assert_eq!(meta.device.model.as_deref(), Some("EOS R5"));
        assert!(meta.device.software.is_none());
        assert_eq!(meta.image.width, Some(8192));
        assert_eq!(meta.image.height, Some(5464));
        assert_eq!(meta.image.orientation, Some(6));
        assert_eq!(meta.image.created, "2024-05-01T10:20:30+02:00");
    }

    #[test]
    fn zero_dimension_falls_through_to_exif_tag() {
        let meta = normalize(&tags(vec![
            ("ImageWidth", TagRecord::scalar(0.0)),
            ("ExifImageWidth", TagRecord::scalar(4032.0)),
            ("ImageHeight", TagRecord::scalar(0.0)),
        ]));
        assert_eq!(meta.image.width, Some(4032));
        assert!(meta.image.height.is_none());
    }

    #[test]
    fn metadata_serializes_camel_case() {
        let meta = normalize(&tags(vec![
            ("FNumber", TagRecord::rational(28, 10)),
            ("ExposureTime", TagRecord::rational(1, 250)),
        ]));
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["camera"]["fNumber"], serde_json::json!(2.8));
        assert_eq!(json["camera"]["exposureTime"], serde_json::json!("1/250"));
        assert!(json["camera"]["iso"].is_null());
    }
}
