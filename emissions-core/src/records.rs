//! Normalized record types shared by the loader and the aggregation engine.
//!
//! Every table in the crate uses the canonical field names `country`,
//! `code`, `year` and `co2`, so downstream consumers never need to know the
//! column names of the raw sources.

use serde::{Deserialize, Serialize};

/// Value type used for emission quantities.
pub type FloatValue = f64;

/// One normalized emissions row: a (country, year) pair with an optional
/// measured quantity.
///
/// `co2` is `None` when the source had no measurement for that pair. Absent
/// values are excluded from every aggregate; they are never treated as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionRecord {
    /// Display name of the reporting territory (e.g. "Chile")
    pub country: String,
    /// Three-letter uppercase ISO territorial code, the geography join key
    pub code: String,
    /// Calendar year of the measurement
    pub year: i32,
    /// Territorial CO₂ emissions in tonnes, if reported
    pub co2: Option<FloatValue>,
}

impl EmissionRecord {
    pub fn new(
        country: impl Into<String>,
        code: impl Into<String>,
        year: i32,
        co2: Option<FloatValue>,
    ) -> Self {
        Self {
            country: country.into(),
            code: code.into(),
            year,
            co2,
        }
    }
}

/// One country's geometry row.
///
/// The boundary is an opaque blob (typically WKT or GeoJSON text) handed
/// through to the renderer; the core never interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryGeometry {
    /// Three-letter uppercase ISO territorial code
    pub code: String,
    /// Display name of the territory
    pub country: String,
    /// Opaque geometry blob, passed through uninterpreted
    pub boundary: String,
}

impl CountryGeometry {
    pub fn new(
        code: impl Into<String>,
        country: impl Into<String>,
        boundary: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            country: country.into(),
            boundary: boundary.into(),
        }
    }
}
