use nom_exif::{EntryValue, ExifIter, MediaParser, MediaSource};
use std::io::Cursor;
use std::path::Path;

use super::tags::{RawTagCollection, TagRecord, TagValue, format_number};
use crate::error::Error;

/// Why a byte buffer did not yield a tag collection.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("no EXIF segment found")]
    NoExif,
    #[error("EXIF parse failed: {0}")]
    Parse(#[from] nom_exif::Error),
}

/// Read every byte of an image file.
pub async fn read_source(path: &Path) -> Result<Vec<u8>, Error> {
    tokio::fs::read(path).await.map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Decode the EXIF tags of an in-memory image into a tag collection keyed by tag name.
///
/// When a tag appears in several IFDs the first one wins, so primary-image values
/// shadow thumbnail values.
pub fn decode_tags(bytes: &[u8]) -> Result<RawTagCollection, DecodeError> {
    let mut parser = MediaParser::new();
    let ms = MediaSource::seekable(Cursor::new(bytes))?;
    if !ms.has_exif() {
        return Err(DecodeError::NoExif);
    }

    let iter: ExifIter = parser.parse(ms)?;

    let mut tags = RawTagCollection::new();
    for entry in iter {
        let Some(tag) = entry.tag() else {
            continue;
        };
        let Some(value) = entry.get_value() else {
            continue;
        };
        let name = format!("{tag:?}");
        if tags.contains_key(&name) {
            continue;
        }
        let record = to_record(&name, value);
        tags.insert(name, record);
    }

    log::debug!("Decoded {} EXIF tag(s)", tags.len());
    Ok(tags)
}

/// Convert a nom-exif value into a tag record, describing the exposure tags.
fn to_record(name: &str, value: &EntryValue) -> TagRecord {
    let tag_value = match value {
        EntryValue::URational(r) => TagValue::Rational(r.0 as i64, r.1 as i64),
        EntryValue::IRational(r) => TagValue::Rational(r.0 as i64, r.1 as i64),
        EntryValue::U8(v) => TagValue::Scalar(*v as f64),
        EntryValue::U16(v) => TagValue::Scalar(*v as f64),
        EntryValue::U32(v) => TagValue::Scalar(*v as f64),
        EntryValue::I16(v) => TagValue::Scalar(*v as f64),
        EntryValue::I32(v) => TagValue::Scalar(*v as f64),
        EntryValue::F32(v) => TagValue::Scalar(*v as f64),
        EntryValue::F64(v) => TagValue::Scalar(*v),
        EntryValue::Text(s) => TagValue::Text(s.clone()),
        other => TagValue::Text(other.to_string()),
    };

    let description = match (name, &tag_value) {
        ("ExposureTime", TagValue::Rational(n, d)) => describe_exposure_time(*n, *d),
        ("FNumber", TagValue::Rational(n, d)) if *d != 0 => {
            Some(format!("f/{}", format_number((*n as f64 / *d as f64 * 10.0).round() / 10.0)))
        }
        _ => None,
    };

    TagRecord {
        value: tag_value,
        description,
    }
}

/// Human form of an exposure time: `1/250` for fractions of a second, `2.5` for longer.
fn describe_exposure_time(num: i64, den: i64) -> Option<String> {
    if num <= 0 || den <= 0 {
        return None;
    }
    if num >= den {
        return Some(format_number(num as f64 / den as f64));
    }
    if den % num == 0 {
        return Some(format!("1/{}", den / num));
    }
    Some(format!("1/{}", (den as f64 / num as f64).round() as i64))
}

/// A minimal JPEG whose Exif IFD records 1/250s, f/2.8 and ISO 400.
#[cfg(test)]
pub(crate) fn sample_jpeg() -> Vec<u8> {
    fn u16le(buf: &mut Vec<u8>, v: u16) {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    fn u32le(buf: &mut Vec<u8>, v: u32) {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    fn entry(buf: &mut Vec<u8>, tag: u16, kind: u16, count: u32, value: u32) {
        u16le(buf, tag);
        u16le(buf, kind);
        u32le(buf, count);
        u32le(buf, value);
    }

    const LONG: u16 = 4;
    const RATIONAL: u16 = 5;
    const SHORT: u16 = 3;

    // Offsets are relative to the TIFF header.
    let mut tiff = b"II*\0".to_vec();
    u32le(&mut tiff, 8);

    // IFD0 at 8: one pointer to the Exif IFD at 26
    u16le(&mut tiff, 1);
    entry(&mut tiff, 0x8769, LONG, 1, 26);
    u32le(&mut tiff, 0);

    // Exif IFD at 26, rational payloads at 68 and 76
    u16le(&mut tiff, 3);
    entry(&mut tiff, 0x829A, RATIONAL, 1, 68);
    entry(&mut tiff, 0x829D, RATIONAL, 1, 76);
    entry(&mut tiff, 0x8827, SHORT, 1, 400);
    u32le(&mut tiff, 0);

    for v in [10, 2500, 28, 10] {
        u32le(&mut tiff, v);
    }

    let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
    jpeg.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
    jpeg.extend_from_slice(b"Exif\0\0");
    jpeg.extend_from_slice(&tiff);
    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    // ── describe_exposure_time ───────────────────────────────────────

    #[test]
    fn exposure_time_descriptions() {
        assert_eq!(describe_exposure_time(1, 250).as_deref(), Some("1/250"));
        assert_eq!(describe_exposure_time(10, 2500).as_deref(), Some("1/250"));
        assert_eq!(describe_exposure_time(9997, 1000000).as_deref(), Some("1/100"));
        assert_eq!(describe_exposure_time(5, 2).as_deref(), Some("2.5"));
        assert_eq!(describe_exposure_time(30, 1).as_deref(), Some("30"));
        assert_eq!(describe_exposure_time(0, 1), None);
        assert_eq!(describe_exposure_time(1, 0), None);
    }

    // ── to_record ────────────────────────────────────────────────────

    #[test]
    fn text_entry_to_record() {
        let rec = to_record("Make", &EntryValue::Text("Apple".into()));
        assert_eq!(rec.value, TagValue::Text("Apple".into()));
        assert!(rec.description.is_none());
    }

    #[test]
    fn integer_entry_to_record() {
        let rec = to_record("ISOSpeedRatings", &EntryValue::U16(454));
        assert_eq!(rec.value, TagValue::Scalar(454.0));
    }

    // ── decode_tags ──────────────────────────────────────────────────

    #[test]
    fn decode_non_image_bytes_fails() {
        assert!(decode_tags(b"definitely not an image").is_err());
        assert!(decode_tags(&[]).is_err());
    }

    #[test]
    fn decode_exposure_tags_from_jpeg() {
        let tags = decode_tags(&sample_jpeg()).unwrap();

        let exposure = &tags["ExposureTime"];
        assert_eq!(exposure.value, TagValue::Rational(10, 2500));
        assert_eq!(exposure.description.as_deref(), Some("1/250"));

        let aperture = &tags["FNumber"];
        assert_eq!(aperture.value, TagValue::Rational(28, 10));
        assert_eq!(aperture.description.as_deref(), Some("f/2.8"));

        assert_eq!(tags["ISOSpeedRatings"].value, TagValue::Scalar(400.0));
    }

    // ── read_source ──────────────────────────────────────────────────

    #[tokio::test]
    async fn read_source_returns_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.jpg");
        fs::write(&path, b"fake").unwrap();

        let bytes = read_source(&path).await.unwrap();
        assert_eq!(bytes, b"fake");
    }

    #[tokio::test]
    async fn read_source_missing_file_is_io_error() {
        let err = read_source(Path::new("/nonexistent/photo.jpg")).await.unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/photo.jpg"));
    }
}
