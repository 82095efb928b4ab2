use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw tag collection keyed by tag name (`"FNumber"`, `"ExposureTime"`, ...).
///
/// Keys are decoder-defined and any tag may be missing.
pub type RawTagCollection = BTreeMap<String, TagRecord>;

/// The machine value carried by a single metadata tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TagValue {
    /// An EXIF rational `num/den` (signed or unsigned in the source).
    Rational(i64, i64),
    /// Any plain number (integer or float in the source).
    Scalar(f64),
    /// A string, or a value that only has a textual rendering.
    Text(String),
}

/// One parsed metadata field: its value plus an optional human-readable rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagRecord {
    pub value: TagValue,
    pub description: Option<String>,
}

impl TagRecord {
    pub fn new(value: TagValue) -> Self {
        Self {
            value,
            description: None,
        }
    }

    pub fn rational(num: i64, den: i64) -> Self {
        Self::new(TagValue::Rational(num, den))
    }

    pub fn scalar(value: f64) -> Self {
        Self::new(TagValue::Scalar(value))
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new(TagValue::Text(value.into()))
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl TagValue {
    /// Text rendering of the value, `None` for an empty string.
    pub fn as_text(&self) -> Option<String> {
        match self {
            TagValue::Text(s) => {
                let s = s.trim().trim_end_matches('\0').trim();
                if s.is_empty() { None } else { Some(s.to_string()) }
            }
            TagValue::Scalar(v) => Some(format_number(*v)),
            TagValue::Rational(n, d) => Some(format!("{n}/{d}")),
        }
    }

    /// Numeric value; rationals are divided out, text is parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TagValue::Scalar(v) => Some(*v),
            TagValue::Rational(n, d) => rational_to_f64(*n, *d),
            TagValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }

    /// Non-negative integer value, for pixel sizes and ISO ratings.
    pub fn as_u32(&self) -> Option<u32> {
        let v = self.as_f64()?;
        if v.is_finite() && v >= 0.0 && v <= u32::MAX as f64 {
            Some(v as u32)
        } else {
            None
        }
    }
}

/// Convert a rational to a float, rejecting a zero denominator.
pub(crate) fn rational_to_f64(num: i64, den: i64) -> Option<f64> {
    if den == 0 {
        None
    } else {
        Some(num as f64 / den as f64)
    }
}

/// Render a float without a trailing `.0` for whole numbers.
pub(crate) fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_trimmed_and_nul_stripped() {
        assert_eq!(TagValue::Text(" Canon\0".into()).as_text().as_deref(), Some("Canon"));
        assert_eq!(TagValue::Text("  ".into()).as_text(), None);
    }

    #[test]
    fn scalar_text_rendering() {
        assert_eq!(TagValue::Scalar(400.0).as_text().as_deref(), Some("400"));
        assert_eq!(TagValue::Scalar(2.8).as_text().as_deref(), Some("2.8"));
    }

    #[test]
    fn rational_to_float() {
        assert_eq!(TagValue::Rational(28, 10).as_f64(), Some(2.8));
        assert_eq!(TagValue::Rational(1, 0).as_f64(), None);
        assert_eq!(rational_to_f64(100, 1), Some(100.0));
    }

    #[test]
    fn u32_conversion() {
        assert_eq!(TagValue::Scalar(4032.0).as_u32(), Some(4032));
        assert_eq!(TagValue::Text("200".into()).as_u32(), Some(200));
        assert_eq!(TagValue::Scalar(-1.0).as_u32(), None);
        assert_eq!(TagValue::Text("n/a".into()).as_u32(), None);
    }

    #[test]
    fn builder_sets_description() {
        let rec = TagRecord::rational(1, 250).with_description("1/250");
        assert_eq!(rec.value, TagValue::Rational(1, 250));
        assert_eq!(rec.description.as_deref(), Some("1/250"));
    }
}
