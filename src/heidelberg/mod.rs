//! Heidelberg (`.fh`) format codec
//!
//! - **parser**: text → `Series` list or a single `Chronology`
//! - **writer**: processed `Series` → text, with provenance header lines
//!
//! # Data flow
//!
//! ```text
//! .fh text → record spans → validated RecordMeta → Series / Chronology
//!                                                       │
//!                                  correction / fitting ▼
//! .fh text ← header + provenance + fixed-width rows ← Series with Product
//! ```

pub mod parser;
pub mod writer;

pub use parser::{
    interleave, parse_chronology, parse_series, parse_str, read_chronology, read_file,
    read_series, record_spans, split_payload, strip_trailing_zeros, ParseMode, Parsed,
    RecordSpan, DATA_MARKER, HEADER_MARKER,
};
pub use writer::{
    default_output_path, default_output_path_with, format_row, serialize, write_file,
    write_file_with, FIELD_WIDTH, VALUES_PER_ROW,
};
