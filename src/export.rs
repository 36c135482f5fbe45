//! Record Export
//!
//! Flat exports of parsed records for use outside the Heidelberg toolchain:
//! - per-record summaries as JSON
//! - per-year values as CSV (one row per record and year)

use serde::Serialize;
use std::io::Write;

use crate::analysis::stats::mean;
use crate::error::TreeringResult;
use crate::record::{Encoding, ProductKind, Series, TreeringRecord};

/// Summary of one series
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecordSummary {
    pub key: String,
    pub unit: String,
    pub begin: i32,
    pub end: i32,
    pub length: usize,
    pub encoding: Encoding,
    /// Mean of the raw measurements
    pub mean: f64,
    pub product: Option<ProductKind>,
}

impl RecordSummary {
    pub fn from_series(series: &Series) -> Self {
        Self {
            key: series.key().to_string(),
            unit: series.unit().to_string(),
            begin: series.begin(),
            end: series.end(),
            length: series.len(),
            encoding: series.encoding(),
            mean: mean(series.data()),
            product: series.product().kind(),
        }
    }
}

impl std::fmt::Display for RecordSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:<12} {:>5}-{:<5} {:>5} yrs  {:<7} mean={:>8.2}  unit={}",
            self.key, self.begin, self.end, self.length, self.encoding, self.mean, self.unit
        )
    }
}

/// Summaries of a list of series
pub fn summarize(records: &[Series]) -> Vec<RecordSummary> {
    records.iter().map(RecordSummary::from_series).collect()
}

/// Pretty-printed JSON array of record summaries
pub fn summaries_to_json(records: &[Series]) -> TreeringResult<String> {
    Ok(serde_json::to_string_pretty(&summarize(records))?)
}

#[derive(Serialize)]
struct YearRow<'a> {
    key: &'a str,
    year: i32,
    value: i64,
    sample_depth: Option<i64>,
    product_value: Option<f64>,
}

/// Write one CSV row per record and year
///
/// Columns: `key,year,value,sample_depth,product_value`. The last two are
/// empty when the record has no sample depth or no derived product.
pub fn write_csv<W: Write>(writer: W, records: &[Series]) -> TreeringResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for series in records {
        let depth = series.sample_depth();
        let product = series.product().data();

        for (idx, (year, &value)) in series.years().zip(series.data()).enumerate() {
            csv_writer.serialize(YearRow {
                key: series.key(),
                year,
                value,
                sample_depth: depth.and_then(|d| d.get(idx).copied()),
                product_value: product.and_then(|p| p.get(idx).copied()),
            })?;
        }
    }

    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heidelberg::parse_series;

    const TWO_RECORDS: &str = "HEADER:\nKeyCode=A1\nDateBegin=2001\nDateEnd=2003\nLength=3\nUnit=mm\nDATA:Single\n10 20 30\nHEADER:\nKeyCode=B2\nDateBegin=1990\nDateEnd=1991\nLength=2\nUnit=mm\nDATA:Double\n7 2 9 3\n";

    #[test]
    fn test_summaries() {
        let mut series = parse_series(TWO_RECORDS, "two.fh").unwrap();
        series[0].altitude_correction(2.0, 0.0);

        let summaries = summarize(&series);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].key, "A1");
        assert_eq!(summaries[0].mean, 20.0);
        assert_eq!(summaries[0].product, Some(ProductKind::Corrected));
        assert_eq!(summaries[1].encoding, Encoding::Double);
        assert_eq!(summaries[1].product, None);
    }

    #[test]
    fn test_summaries_json() {
        let series = parse_series(TWO_RECORDS, "two.fh").unwrap();
        let json = summaries_to_json(&series).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["key"], "A1");
        assert_eq!(value[1]["encoding"], "Double");
        assert!(value[1]["product"].is_null());
    }

    #[test]
    fn test_csv_rows() {
        let mut series = parse_series(TWO_RECORDS, "two.fh").unwrap();
        series[0].altitude_correction(1.0, 0.5);

        let mut buf = Vec::new();
        write_csv(&mut buf, &series).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "key,year,value,sample_depth,product_value");
        assert_eq!(lines[1], "A1,2001,10,,10.5");
        assert_eq!(lines[4], "B2,1990,7,2,");
        assert_eq!(lines.len(), 6);
    }
}
