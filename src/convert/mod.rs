//! Exposure arithmetic: turning two exposure triples into a light ratio and stops.
//!
//! The total light reaching the sensor is modeled as
//!
//! ```text
//! factor = (f1² / f2²) × (t1 / t2) × (iso1 / iso2)
//! ```
//!
//! and `stops = log2(factor)`, rounded to two decimal places.
//!
//! # Example
//!
//! ```rust
//! use exposure_equiv::convert::{convert, ExposureTriple};
//!
//! let original = ExposureTriple::new(2.8, "1/100", 100u32);
//! let target = ExposureTriple::new(2.8, "1/100", 200u32);
//! let result = convert(&original, &target);
//! assert_eq!(result.stops, -1.0);
//! ```

mod parse;

pub use parse::{parse_decimal, parse_f_number, parse_integer};

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use crate::exif::tags::format_number;

/// An exposure setting as supplied by metadata or a user: a number or a string form
/// such as `"1/250"` or `"f/2.8"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExposureValue {
    Number(f64),
    Text(String),
}

impl ExposureValue {
    /// Parse as a decimal (f-number notation allowed).
    pub fn as_decimal(&self) -> Option<f64> {
        match self {
            ExposureValue::Number(n) => Some(*n),
            ExposureValue::Text(s) => parse_f_number(s),
        }
    }

    /// Parse as an integer, truncating any fractional part.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ExposureValue::Number(n) if n.is_finite() => Some(n.trunc() as i64),
            ExposureValue::Number(_) => None,
            ExposureValue::Text(s) => parse_integer(s),
        }
    }

    /// `true` for a blank string or a zero/NaN number, which cannot act as a source setting.
    pub fn is_blank(&self) -> bool {
        match self {
            ExposureValue::Number(n) => *n == 0.0 || n.is_nan(),
            ExposureValue::Text(s) => s.trim().is_empty(),
        }
    }
}

impl fmt::Display for ExposureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExposureValue::Number(n) => f.write_str(&format_number(*n)),
            ExposureValue::Text(s) => f.write_str(s),
        }
    }
}

/// Plain numbers become [`ExposureValue::Number`], everything else is kept as text.
impl FromStr for ExposureValue {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(ExposureValue::Number(n)),
            _ => Ok(ExposureValue::Text(trimmed.to_string())),
        }
    }
}

impl From<f64> for ExposureValue {
    fn from(v: f64) -> Self {
        ExposureValue::Number(v)
    }
}

impl From<u32> for ExposureValue {
    fn from(v: u32) -> Self {
        ExposureValue::Number(v as f64)
    }
}

impl From<i32> for ExposureValue {
    fn from(v: i32) -> Self {
        ExposureValue::Number(v as f64)
    }
}

impl From<&str> for ExposureValue {
    fn from(v: &str) -> Self {
        ExposureValue::Text(v.to_string())
    }
}

impl From<String> for ExposureValue {
    fn from(v: String) -> Self {
        ExposureValue::Text(v)
    }
}

/// Aperture, exposure time and sensitivity together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExposureTriple {
    pub f_number: ExposureValue,
    pub exposure_time: ExposureValue,
    pub iso: ExposureValue,
}

impl ExposureTriple {
    pub fn new(
        f_number: impl Into<ExposureValue>,
        exposure_time: impl Into<ExposureValue>,
        iso: impl Into<ExposureValue>,
    ) -> Self {
        Self {
            f_number: f_number.into(),
            exposure_time: exposure_time.into(),
            iso: iso.into(),
        }
    }
}

impl fmt::Display for ExposureTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "f/{} {}s ISO {}",
            self.f_number.to_string().trim_start_matches("f/"),
            self.exposure_time,
            self.iso
        )
    }
}

/// The outcome of comparing an original exposure against a target.
///
/// `factor > 1` means the original gathered more light than the target will, so the
/// target is darker by `stops` stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub factor: f64,
    pub stops: f64,
    pub original: ExposureTriple,
    pub target: ExposureTriple,
}

/// Convert an exposure time to seconds.
///
/// Numbers pass through unchanged. `"n/d"` strings are divided out and other strings are
/// read as decimals. Anything unparsable yields `0.0`, which callers treat as unusable.
pub fn parse_exposure_time(value: &ExposureValue) -> f64 {
    match value {
        ExposureValue::Number(n) => *n,
        ExposureValue::Text(s) => {
            if let Some((num, den)) = s.split_once('/') {
                // "1/250/x" keeps the first two components
                let den = den.split('/').next().unwrap_or(den);
                match (parse_decimal(num), parse_decimal(den)) {
                    (Some(n), Some(d)) => n / d,
                    _ => 0.0,
                }
            } else {
                parse_decimal(s).unwrap_or(0.0)
            }
        }
    }
}

/// Light ratio between a source (`*1`) and a target (`*2`) exposure.
///
/// Never fails: unparsable f-numbers or ISOs produce `NaN`, and a zero target
/// time or ISO produces an infinite or `NaN` factor.
pub fn compute_factor(
    f_number1: &ExposureValue,
    f_number2: &ExposureValue,
    exposure_time1: &ExposureValue,
    exposure_time2: &ExposureValue,
    iso1: &ExposureValue,
    iso2: &ExposureValue,
) -> f64 {
    let f1 = f_number1.as_decimal().unwrap_or(f64::NAN);
    let f2 = f_number2.as_decimal().unwrap_or(f64::NAN);

    let t1 = parse_exposure_time(exposure_time1);
    let t2 = parse_exposure_time(exposure_time2);

    let iso1 = iso1.as_integer().map_or(f64::NAN, |v| v as f64);
    let iso2 = iso2.as_integer().map_or(f64::NAN, |v| v as f64);

    (f1.powi(2) / f2.powi(2)) * (t1 / t2) * (iso1 / iso2)
}

/// Express a light ratio in stops, rounded to two decimal places.
pub fn stops(factor: f64) -> f64 {
    (factor.log2() * 100.0).round() / 100.0
}

/// Compare two exposure triples. Both are echoed verbatim in the result.
pub fn convert(original: &ExposureTriple, target: &ExposureTriple) -> ConversionResult {
    let factor = compute_factor(
        &original.f_number,
        &target.f_number,
        &original.exposure_time,
        &target.exposure_time,
        &original.iso,
        &target.iso,
    );
    log::debug!("Conversion {original} -> {target}: factor {factor}");

    ConversionResult {
        factor,
        stops: stops(factor),
        original: original.clone(),
        target: target.clone(),
    }
}
