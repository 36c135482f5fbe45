//! Heidelberg Writer
//!
//! Emits processed series back to Heidelberg text. Only derived products are
//! written: every series handed to the writer must carry a correction or a
//! fitting result.
//!
//! Each record is written as its original header with two provenance lines
//! inserted before the `DATA` line, followed by the product values in rows of
//! ten right-aligned integer fields.
//!
//! The header is copied as parsed, so a `DATA:Double` line is kept even though
//! only the product values are written. Sample depth is not re-interleaved,
//! which means output from a Double record does not parse back.

use std::path::{Path, PathBuf};

use crate::config::CodecConfig;
use crate::error::{TreeringError, TreeringResult};
use crate::record::{Product, ProductKind, Series, TreeringRecord};

/// Values per payload row
pub const VALUES_PER_ROW: usize = 10;

/// Width of each right-aligned payload field
pub const FIELD_WIDTH: usize = 6;

/// Serialize series to Heidelberg text
///
/// Fails before producing any output if a series has no derived product.
pub fn serialize(records: &[Series]) -> TreeringResult<String> {
    for series in records {
        if series.product().is_none() {
            return Err(missing_product(series));
        }
    }

    let mut out = String::new();
    for series in records {
        write_record(&mut out, series)?;
    }
    Ok(out)
}

/// Serialize series and write them to a file
///
/// Without an explicit `path` the output name is derived from the first
/// series (see [`default_output_path`]). Returns the path written.
pub fn write_file(records: &[Series], path: Option<&Path>) -> TreeringResult<PathBuf> {
    write_file_with(records, path, &CodecConfig::default())
}

/// Same as [`write_file`], naming default outputs from `config`
pub fn write_file_with(
    records: &[Series],
    path: Option<&Path>,
    config: &CodecConfig,
) -> TreeringResult<PathBuf> {
    let first = records
        .first()
        .ok_or_else(|| TreeringError::Precondition("no series to write".to_string()))?;

    let target = match path {
        Some(p) => p.to_path_buf(),
        None => default_output_path_with(first, config)?,
    };

    let text = serialize(records)?;
    std::fs::write(&target, text).map_err(|e| TreeringError::io(&target, e))?;

    tracing::info!(file = %target.display(), records = records.len(), "Wrote Heidelberg file");
    Ok(target)
}

/// Output path derived from a series' source file and its product kind
///
/// `site.fh` becomes `site_corrected.fh` or `site_fitted.fh`.
pub fn default_output_path(series: &Series) -> TreeringResult<PathBuf> {
    default_output_path_with(series, &CodecConfig::default())
}

/// Output path derived using the suffixes and extension from `config`
pub fn default_output_path_with(series: &Series, config: &CodecConfig) -> TreeringResult<PathBuf> {
    let suffix = match series.product().kind() {
        Some(ProductKind::Corrected) => &config.corrected_suffix,
        Some(ProductKind::Fitted) => &config.fitted_suffix,
        None => return Err(missing_product(series)),
    };

    let source = series.source_file();
    let has_format_ext = source
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(&config.extension));

    let (base, ext) = if has_format_ext {
        let ext = source
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| config.extension.clone());
        (source.file_stem(), ext)
    } else {
        (source.file_name(), config.extension.clone())
    };

    let base = base.map(|b| b.to_string_lossy().into_owned()).ok_or_else(|| {
        TreeringError::Precondition(format!(
            "cannot derive an output name from '{}'",
            source.display()
        ))
    })?;

    Ok(source.with_file_name(format!("{base}{suffix}.{ext}")))
}

fn missing_product(series: &Series) -> TreeringError {
    TreeringError::Precondition(format!(
        "series {} has no corrected or fitted data to write",
        series.key()
    ))
}

fn write_record(out: &mut String, series: &Series) -> TreeringResult<()> {
    let (provenance, values) = match series.product() {
        Product::Corrected(c) => (
            [
                format!("CorrectionFactor={:.5}", c.factor),
                format!("CorrectionOffset={:.5}", c.offset),
            ],
            &c.data,
        ),
        Product::Fitted(f) => (
            [
                format!("FittingFactor={:.5}", f.fit_factor),
                format!("ChronologyUsed={}", f.chronology_key),
            ],
            &f.data,
        ),
        Product::None => return Err(missing_product(series)),
    };

    match series.raw_header().split_last() {
        Some((last, rest)) => {
            for line in rest {
                out.push_str(line);
                out.push('\n');
            }
            for line in &provenance {
                out.push_str(line);
                out.push('\n');
            }
            out.push_str(last);
            out.push('\n');
        }
        None => {
            for line in &provenance {
                out.push_str(line);
                out.push('\n');
            }
        }
    }

    for row in values.chunks(VALUES_PER_ROW) {
        out.push_str(&format_row(row)?);
    }
    Ok(())
}

/// Format one payload row, zero-padding it to `VALUES_PER_ROW` fields
///
/// Values are truncated toward zero. A row longer than `VALUES_PER_ROW`
/// is an invariant violation.
pub fn format_row(values: &[f64]) -> TreeringResult<String> {
    if values.len() > VALUES_PER_ROW {
        return Err(TreeringError::Invariant(format!(
            "{} values pending for a {VALUES_PER_ROW}-value row",
            values.len()
        )));
    }

    let mut row = String::with_capacity(VALUES_PER_ROW * FIELD_WIDTH + 1);
    for i in 0..VALUES_PER_ROW {
        let value = values.get(i).map(|v| v.trunc() as i64).unwrap_or(0);
        row.push_str(&format!("{value:>width$}", width = FIELD_WIDTH));
    }
    row.push('\n');
    Ok(row)
}
