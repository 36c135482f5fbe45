//! Ring-width record model
//!
//! A parsed Heidelberg record is either a `Series` (one specimen) or a
//! `Chronology` (a reference curve). Both expose the `TreeringRecord`
//! capabilities; only a series can carry a derived `Product`.

pub mod types;

pub use types::{
    Chronology, Correction, Encoding, Fitting, Product, ProductKind, RecordMeta, Series,
    TreeringRecord,
};
