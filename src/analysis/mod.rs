//! Statistics and transforms on parsed records
//!
//! - **stats**: year-range mean/variance on a `Chronology`
//! - **transform**: altitude correction and chronology fitting on a `Series`

pub mod stats;
pub mod transform;

pub use stats::{mean, sample_variance};
