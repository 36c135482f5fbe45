//! Core data types for ring-width records
//!
//! This module defines the types every other layer works with:
//! - `RecordMeta`: the fields shared by every parsed record
//! - `Series`: a single specimen, optionally carrying one derived `Product`
//! - `Chronology`: an aggregate reference curve used for fitting
//! - `Encoding` and `ProductKind`: classification enums

use crate::error::{TreeringError, TreeringResult};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

/// Payload layout announced on a record's `DATA:` line
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// One value per year
    Single,
    /// Interleaved value / sample depth pairs
    Double,
    /// Four values per year (not implemented)
    Quad,
}

impl Encoding {
    /// Look up an encoding by its label in the `DATA:` line
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Single" => Some(Encoding::Single),
            "Double" => Some(Encoding::Double),
            "Quad" => Some(Encoding::Quad),
            _ => None,
        }
    }

    /// Label as written in the file
    pub fn label(&self) -> &'static str {
        match self {
            Encoding::Single => "Single",
            Encoding::Double => "Double",
            Encoding::Quad => "Quad",
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.label())
    }
}

/// Fields shared by series and chronologies
#[derive(Debug, Clone, PartialEq)]
pub struct RecordMeta {
    /// File the record was read from
    pub source_file: PathBuf,
    /// Header lines from `HEADER` through `DATA` inclusive, verbatim
    pub raw_header: Vec<String>,
    /// First year (inclusive)
    pub begin: i32,
    /// Last year (inclusive)
    pub end: i32,
    /// Measurement unit label
    pub unit: String,
    /// Site or specimen identifier
    pub key: String,
    /// One measurement per year
    pub data: Vec<i64>,
    /// Samples contributing to each year (Double payloads only)
    pub sample_depth: Option<Vec<i64>>,
    /// Payload layout the record was decoded from
    pub encoding: Encoding,
}

impl RecordMeta {
    /// Create record metadata, checking the year range against the data
    ///
    /// Fails when `end - begin + 1` differs from the number of values or
    /// when a sample depth vector has a different length than the data.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source_file: impl Into<PathBuf>,
        raw_header: Vec<String>,
        begin: i32,
        end: i32,
        unit: impl Into<String>,
        key: impl Into<String>,
        data: Vec<i64>,
        sample_depth: Option<Vec<i64>>,
    ) -> TreeringResult<Self> {
        let source_file = source_file.into();
        let key = key.into();
        let expected = i64::from(end) - i64::from(begin) + 1;

        if expected != data.len() as i64 {
            return Err(TreeringError::format(
                &source_file,
                Some(&key),
                format!(
                    "year range {begin}-{end} spans {expected} years but {} values are present",
                    data.len()
                ),
            ));
        }

        if let Some(depth) = &sample_depth {
            if depth.len() != data.len() {
                return Err(TreeringError::format(
                    &source_file,
                    Some(&key),
                    format!(
                        "sample depth has {} values but data has {}",
                        depth.len(),
                        data.len()
                    ),
                ));
            }
        }

        let encoding = if sample_depth.is_some() {
            Encoding::Double
        } else {
            Encoding::Single
        };

        Ok(Self {
            source_file,
            raw_header,
            begin,
            end,
            unit: unit.into(),
            key,
            data,
            sample_depth,
            encoding,
        })
    }
}

/// Capabilities common to every ring-width record
pub trait TreeringRecord {
    /// Shared record fields
    fn meta(&self) -> &RecordMeta;

    fn key(&self) -> &str {
        &self.meta().key
    }

    fn unit(&self) -> &str {
        &self.meta().unit
    }

    fn begin(&self) -> i32 {
        self.meta().begin
    }

    fn end(&self) -> i32 {
        self.meta().end
    }

    fn data(&self) -> &[i64] {
        &self.meta().data
    }

    fn sample_depth(&self) -> Option<&[i64]> {
        self.meta().sample_depth.as_deref()
    }

    fn source_file(&self) -> &Path {
        &self.meta().source_file
    }

    fn raw_header(&self) -> &[String] {
        &self.meta().raw_header
    }

    fn encoding(&self) -> Encoding {
        self.meta().encoding
    }

    /// Number of years covered
    fn len(&self) -> usize {
        self.meta().data.len()
    }

    fn is_empty(&self) -> bool {
        self.meta().data.is_empty()
    }

    /// The record's native year axis
    fn years(&self) -> RangeInclusive<i32> {
        self.meta().begin..=self.meta().end
    }
}

/// Which derived product a series carries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    Corrected,
    Fitted,
}

impl ProductKind {
    /// Filename suffix used when no output path is given
    pub fn default_suffix(&self) -> &'static str {
        match self {
            ProductKind::Corrected => "_corrected",
            ProductKind::Fitted => "_fitted",
        }
    }
}

impl std::fmt::Display for ProductKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductKind::Corrected => write!(f, "corrected"),
            ProductKind::Fitted => write!(f, "fitted"),
        }
    }
}

/// Result of an altitude correction
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    pub factor: f64,
    pub offset: f64,
    pub data: Vec<f64>,
}

/// Result of fitting a series against a chronology
#[derive(Debug, Clone, PartialEq)]
pub struct Fitting {
    pub fit_factor: f64,
    /// Key of the chronology the factor was derived from
    pub chronology_key: String,
    pub data: Vec<f64>,
}

/// Derived product attached to a series
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Product {
    #[default]
    None,
    Corrected(Correction),
    Fitted(Fitting),
}

impl Product {
    pub fn kind(&self) -> Option<ProductKind> {
        match self {
            Product::None => None,
            Product::Corrected(_) => Some(ProductKind::Corrected),
            Product::Fitted(_) => Some(ProductKind::Fitted),
        }
    }

    /// Transformed values, if a product is present
    pub fn data(&self) -> Option<&[f64]> {
        match self {
            Product::None => None,
            Product::Corrected(c) => Some(&c.data),
            Product::Fitted(f) => Some(&f.data),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Product::None)
    }
}

/// A single specimen's measured ring-width series
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    meta: RecordMeta,
    product: Product,
}

impl Series {
    /// Wrap record metadata as a series with no derived product
    pub fn new(meta: RecordMeta) -> Self {
        Self {
            meta,
            product: Product::None,
        }
    }

    /// The derived product currently attached
    pub fn product(&self) -> &Product {
        &self.product
    }

    /// Replace the attached product
    pub(crate) fn set_product(&mut self, product: Product) {
        self.product = product;
    }

    /// Drop the derived product, returning the series to its parsed state
    pub fn clear_product(&mut self) -> Product {
        std::mem::take(&mut self.product)
    }
}

impl TreeringRecord for Series {
    fn meta(&self) -> &RecordMeta {
        &self.meta
    }
}

/// An aggregate reference curve (site or regional master)
#[derive(Debug, Clone, PartialEq)]
pub struct Chronology {
    meta: RecordMeta,
}

impl Chronology {
    pub fn new(meta: RecordMeta) -> Self {
        Self { meta }
    }
}

impl TreeringRecord for Chronology {
    fn meta(&self) -> &RecordMeta {
        &self.meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(begin: i32, end: i32, data: Vec<i64>) -> TreeringResult<RecordMeta> {
        RecordMeta::new("test.fh", Vec::new(), begin, end, "1/100 mm", "T01", data, None)
    }

    #[test]
    fn test_meta_accepts_matching_range() {
        let m = meta(1900, 1904, vec![10, 20, 30, 40, 50]).unwrap();
        let series = Series::new(m);

        assert_eq!(series.len(), 5);
        assert_eq!(series.years(), 1900..=1904);
        assert_eq!(series.encoding(), Encoding::Single);
        assert!(series.product().is_none());
    }

    #[test]
    fn test_meta_rejects_range_mismatch() {
        let err = meta(1900, 1910, vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, TreeringError::Format { .. }));
    }

    #[test]
    fn test_meta_rejects_depth_mismatch() {
        let err = RecordMeta::new(
            "test.fh",
            Vec::new(),
            2000,
            2001,
            "mm",
            "D",
            vec![1, 2],
            Some(vec![1]),
        )
        .unwrap_err();
        assert!(matches!(err, TreeringError::Format { .. }));
    }

    #[test]
    fn test_depth_marks_double_encoding() {
        let m = RecordMeta::new(
            "test.fh",
            Vec::new(),
            2000,
            2001,
            "mm",
            "D",
            vec![1, 2],
            Some(vec![3, 4]),
        )
        .unwrap();
        assert_eq!(m.encoding, Encoding::Double);
    }

    #[test]
    fn test_encoding_labels() {
        for enc in [Encoding::Single, Encoding::Double, Encoding::Quad] {
            assert_eq!(Encoding::from_label(enc.label()), Some(enc));
        }
        assert_eq!(Encoding::from_label(" Double "), Some(Encoding::Double));
        assert_eq!(Encoding::from_label("Triple"), None);
    }

    #[test]
    fn test_product_kind() {
        let mut series = Series::new(meta(1900, 1900, vec![5]).unwrap());
        series.set_product(Product::Fitted(Fitting {
            fit_factor: 2.0,
            chronology_key: "CHR".to_string(),
            data: vec![10.0],
        }));

        assert_eq!(series.product().kind(), Some(ProductKind::Fitted));
        assert_eq!(series.product().data(), Some(&[10.0][..]));

        let taken = series.clear_product();
        assert_eq!(taken.kind(), Some(ProductKind::Fitted));
        assert!(series.product().is_none());
    }
}
