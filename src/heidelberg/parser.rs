//! Heidelberg Reader
//!
//! Turns the text of a `.fh` file into records. A file holds one or more
//! records, each laid out as:
//!
//! ```text
//! HEADER:
//! KeyCode=ABC01
//! DateBegin=1901
//! DateEnd=1912
//! Length=12
//! Unit=1/100 mm
//! DATA:Single
//!    120   134    98   101   143   150   122   119   131   140
//!    127   133     0     0     0     0     0     0     0     0
//! ```
//!
//! Records are first cut into `RecordSpan`s by their `HEADER` and `DATA`
//! marker lines, then each span is validated and decoded on its own.

use nom::{
    bytes::complete::{tag, take_till, take_till1, take_until},
    character::complete::char,
    combinator::rest,
    sequence::separated_pair,
    IResult,
};
use std::path::Path;

use crate::error::{TreeringError, TreeringResult};
use crate::record::{Chronology, Encoding, RecordMeta, Series};

/// Substring that opens a record's header block
pub const HEADER_MARKER: &str = "HEADER";

/// Substring that closes a header block and names the payload encoding
pub const DATA_MARKER: &str = "DATA";

/// What `parse_str` should build from the records in a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// One `Series` per record
    Series,
    /// A single `Chronology`; the file must hold exactly one record
    Chronology,
}

/// Output of `parse_str`, shaped by the requested `ParseMode`
#[derive(Debug, Clone)]
pub enum Parsed {
    Series(Vec<Series>),
    Chronology(Chronology),
}

impl Parsed {
    pub fn into_series(self) -> Option<Vec<Series>> {
        match self {
            Parsed::Series(series) => Some(series),
            Parsed::Chronology(_) => None,
        }
    }

    pub fn into_chronology(self) -> Option<Chronology> {
        match self {
            Parsed::Chronology(chronology) => Some(chronology),
            Parsed::Series(_) => None,
        }
    }
}

/// Lines belonging to one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSpan<'a> {
    /// Position of the record in the file (0-based)
    pub index: usize,
    /// `HEADER` line through `DATA` line inclusive
    pub header: Vec<&'a str>,
    /// Lines after `DATA` up to the next `HEADER` or end of input
    pub payload: Vec<&'a str>,
}

/// Parse Heidelberg text in the given mode
pub fn parse_str(text: &str, source: impl AsRef<Path>, mode: ParseMode) -> TreeringResult<Parsed> {
    let source = source.as_ref();
    let metas = parse_records(text, source)?;

    match mode {
        ParseMode::Series => Ok(Parsed::Series(metas.into_iter().map(Series::new).collect())),
        ParseMode::Chronology => single_chronology(metas, source).map(Parsed::Chronology),
    }
}

/// Parse every record in the text as a `Series`
pub fn parse_series(text: &str, source: impl AsRef<Path>) -> TreeringResult<Vec<Series>> {
    let metas = parse_records(text, source.as_ref())?;
    Ok(metas.into_iter().map(Series::new).collect())
}

/// Parse a single-record text as a `Chronology`
pub fn parse_chronology(text: &str, source: impl AsRef<Path>) -> TreeringResult<Chronology> {
    let source = source.as_ref();
    single_chronology(parse_records(text, source)?, source)
}

/// Read and parse a Heidelberg file
pub fn read_file(path: impl AsRef<Path>, mode: ParseMode) -> TreeringResult<Parsed> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| TreeringError::io(path, e))?;
    let parsed = parse_str(&text, path, mode)?;

    match &parsed {
        Parsed::Series(series) => {
            tracing::info!(file = %path.display(), records = series.len(), "Read Heidelberg series")
        }
        Parsed::Chronology(_) => {
            tracing::info!(file = %path.display(), "Read Heidelberg chronology")
        }
    }

    Ok(parsed)
}

/// Read every record of a file as a `Series`
pub fn read_series(path: impl AsRef<Path>) -> TreeringResult<Vec<Series>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| TreeringError::io(path, e))?;
    let series = parse_series(&text, path)?;
    tracing::info!(file = %path.display(), records = series.len(), "Read Heidelberg series");
    Ok(series)
}

/// Read a single-record file as a `Chronology`
pub fn read_chronology(path: impl AsRef<Path>) -> TreeringResult<Chronology> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| TreeringError::io(path, e))?;
    let chronology = parse_chronology(&text, path)?;
    tracing::info!(file = %path.display(), "Read Heidelberg chronology");
    Ok(chronology)
}

fn single_chronology(metas: Vec<RecordMeta>, source: &Path) -> TreeringResult<Chronology> {
    let count = metas.len();
    match <[RecordMeta; 1]>::try_from(metas) {
        Ok([meta]) => Ok(Chronology::new(meta)),
        Err(_) => Err(TreeringError::format(
            source,
            None,
            format!("a chronology file must hold exactly one record, found {count}"),
        )),
    }
}

fn parse_records(text: &str, source: &Path) -> TreeringResult<Vec<RecordMeta>> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let spans = record_spans(&lines, source)?;
    tracing::debug!(file = %source.display(), records = spans.len(), "Located record spans");

    spans.iter().map(|span| decode_span(span, source)).collect()
}

/// Cut non-blank lines into per-record spans
///
/// Every `HEADER` marker must be followed by its own `DATA` marker before
/// the next `HEADER` begins.
pub fn record_spans<'a>(lines: &[&'a str], source: &Path) -> TreeringResult<Vec<RecordSpan<'a>>> {
    let headers: Vec<usize> = marker_lines(lines, HEADER_MARKER);
    let data: Vec<usize> = marker_lines(lines, DATA_MARKER);

    if headers.is_empty() {
        return Err(TreeringError::format(source, None, "no HEADER marker found"));
    }
    if headers.len() != data.len() {
        return Err(TreeringError::format(
            source,
            None,
            format!(
                "found {} HEADER markers but {} DATA markers",
                headers.len(),
                data.len()
            ),
        ));
    }

    let mut spans = Vec::with_capacity(headers.len());
    for (index, (&head, &data_line)) in headers.iter().zip(&data).enumerate() {
        let next_head = headers.get(index + 1).copied().unwrap_or(lines.len());

        if data_line < head || data_line >= next_head {
            return Err(TreeringError::format(
                source,
                None,
                format!("record {} has its DATA marker outside its header block", index + 1),
            ));
        }

        spans.push(RecordSpan {
            index,
            header: lines[head..=data_line].to_vec(),
            payload: lines[data_line + 1..next_head].to_vec(),
        });
    }

    Ok(spans)
}

fn marker_lines(lines: &[&str], marker: &str) -> Vec<usize> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.contains(marker))
        .map(|(idx, _)| idx)
        .collect()
}

/// Validate and decode one record span
fn decode_span(span: &RecordSpan<'_>, source: &Path) -> TreeringResult<RecordMeta> {
    let fields = HeaderFields::new(&span.header);

    let key = fields
        .get("KeyCode")
        .ok_or_else(|| {
            TreeringError::format(
                source,
                None,
                format!("record {} is missing header field KeyCode", span.index + 1),
            )
        })?
        .to_string();
    let ctx = RecordContext {
        source,
        key: &key,
    };

    let begin: i32 = ctx.integer_field(&fields, "DateBegin")?;
    let end: i32 = ctx.integer_field(&fields, "DateEnd")?;
    let length: i64 = ctx.integer_field(&fields, "Length")?;
    let unit = ctx.required_field(&fields, "Unit")?.to_string();

    if i64::from(begin) + length - 1 != i64::from(end) {
        return Err(ctx.error(format!(
            "dates do not match: DateBegin {begin} + Length {length} - 1 != DateEnd {end}"
        )));
    }

    let encoding = ctx.encoding(&span.header)?;
    if encoding == Encoding::Quad {
        return Err(TreeringError::UnsupportedEncoding {
            file: source.to_path_buf(),
            key: key.clone(),
            encoding: encoding.label().to_string(),
        });
    }

    let mut values = ctx.tokenize(&span.payload)?;
    strip_trailing_zeros(&mut values).map_err(|msg| ctx.error(msg))?;
    let (data, sample_depth) = split_payload(values, encoding).map_err(|msg| ctx.error(msg))?;

    if data.len() as i64 != length {
        return Err(ctx.error(format!(
            "payload holds {} values but Length is {length}",
            data.len()
        )));
    }

    tracing::debug!(key = %key, begin, end, encoding = %encoding, "Decoded record");

    RecordMeta::new(
        source,
        span.header.iter().map(|l| l.to_string()).collect(),
        begin,
        end,
        unit,
        key.clone(),
        data,
        sample_depth,
    )
}

/// Remove the zero padding at the end of a payload
///
/// Zeros are only allowed as one contiguous block running to the last value.
pub fn strip_trailing_zeros(values: &mut Vec<i64>) -> Result<(), String> {
    if let Some(first_zero) = values.iter().position(|&v| v == 0) {
        if values[first_zero..].iter().any(|&v| v != 0) {
            return Err(format!(
                "zeros not a trailing suffix (zero at position {first_zero} followed by data)"
            ));
        }
        values.truncate(first_zero);
    }
    Ok(())
}

/// Split a flat payload into data and optional sample depth
pub fn split_payload(
    values: Vec<i64>,
    encoding: Encoding,
) -> Result<(Vec<i64>, Option<Vec<i64>>), String> {
    match encoding {
        Encoding::Single => Ok((values, None)),
        Encoding::Double => {
            let data: Vec<i64> = values.iter().step_by(2).copied().collect();
            let depth: Vec<i64> = values.iter().skip(1).step_by(2).copied().collect();
            if data.len() != depth.len() {
                return Err(format!(
                    "length of data ({}) and sample depth ({}) do not match",
                    data.len(),
                    depth.len()
                ));
            }
            Ok((data, Some(depth)))
        }
        Encoding::Quad => Err("Quad payloads are not supported".to_string()),
    }
}

/// Rebuild the flat Double payload from data and sample depth
pub fn interleave(data: &[i64], depth: &[i64]) -> Vec<i64> {
    data.iter()
        .zip(depth)
        .flat_map(|(&value, &count)| [value, count])
        .collect()
}

/// `Key=Value` entries found in a header block
struct HeaderFields<'a> {
    entries: Vec<(&'a str, &'a str)>,
}

impl<'a> HeaderFields<'a> {
    fn new(lines: &[&'a str]) -> Self {
        let entries = lines
            .iter()
            .copied()
            .filter_map(|line| key_value(line).ok())
            .map(|(_, (k, v))| (k.trim(), v.trim()))
            .collect();
        Self { entries }
    }

    /// First value recorded for `name`
    fn get(&self, name: &str) -> Option<&'a str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| *v)
    }
}

/// Error context while decoding one record
struct RecordContext<'a> {
    source: &'a Path,
    key: &'a str,
}

impl RecordContext<'_> {
    fn error(&self, message: impl Into<String>) -> TreeringError {
        TreeringError::format(self.source, Some(self.key), message)
    }

    fn required_field<'f>(&self, fields: &HeaderFields<'f>, name: &str) -> TreeringResult<&'f str> {
        fields
            .get(name)
            .ok_or_else(|| self.error(format!("missing header field {name}")))
    }

    fn integer_field<T: std::str::FromStr>(
        &self,
        fields: &HeaderFields<'_>,
        name: &str,
    ) -> TreeringResult<T> {
        let raw = self.required_field(fields, name)?;
        raw.parse()
            .map_err(|_| self.error(format!("header field {name} is not an integer: '{raw}'")))
    }

    fn encoding(&self, header: &[&str]) -> TreeringResult<Encoding> {
        let line = header.last().copied().unwrap_or_default();
        let (_, label) = data_marker(line)
            .map_err(|_| self.error(format!("malformed DATA line: '{line}'")))?;
        Encoding::from_label(label)
            .ok_or_else(|| self.error(format!("unknown payload encoding '{}'", label.trim())))
    }

    fn tokenize(&self, payload: &[&str]) -> TreeringResult<Vec<i64>> {
        payload
            .iter()
            .flat_map(|line| line.split_whitespace())
            .map(|tok| {
                tok.parse::<i64>()
                    .map_err(|_| self.error(format!("payload value '{tok}' is not an integer")))
            })
            .collect()
    }
}

/// Parse a `Key=Value` header line
fn key_value(input: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(take_till1(|c| c == '='), char('='), rest)(input)
}

/// Parse a `DATA:<encoding>` marker line, yielding the encoding label
fn data_marker(input: &str) -> IResult<&str, &str> {
    let (input, _) = take_until(DATA_MARKER)(input)?;
    let (input, _) = tag(DATA_MARKER)(input)?;
    let (input, _) = take_till(|c| c == ':')(input)?;
    let (input, _) = char(':')(input)?;
    take_till(|c| c == ':')(input)
}
