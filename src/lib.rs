//! # ringwidth
//!
//! Tree-ring width series toolkit: read, transform and write dendrochronology
//! measurement files in the Heidelberg (`.fh`) exchange format.
//!
//! ## Features
//!
//! - **Heidelberg codec**: multi-record files, `Single` and `Double` payloads
//! - **Altitude correction**: linear `value * factor + offset` adjustment
//! - **Chronology fitting**: scale a specimen to a reference curve's mean
//! - **Exports**: JSON summaries and per-year CSV
//!
//! ## Modules
//!
//! - [`record`]: `Series`, `Chronology` and their derived products
//! - [`analysis`]: year-range statistics and transforms
//! - [`heidelberg`]: format parser and writer
//! - [`export`]: CSV/JSON exports
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ringwidth::heidelberg;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let chronology = heidelberg::read_chronology("master.fh")?;
//!     let mut series = heidelberg::read_series("site.fh")?;
//!
//!     for s in &mut series {
//!         s.altitude_fitting(&chronology)?;
//!     }
//!
//!     // Writes site_fitted.fh next to the input
//!     let written = heidelberg::write_file(&series, None)?;
//!     println!("wrote {}", written.display());
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod export;
pub mod heidelberg;
pub mod record;

// Re-export top-level types for convenience
pub use error::{TreeringError, TreeringResult};

pub use record::{
    Chronology, Correction, Encoding, Fitting, Product, ProductKind, RecordMeta, Series,
    TreeringRecord,
};

pub use heidelberg::{ParseMode, Parsed};

pub use config::{CodecConfig, Config, ConfigError, CorrectionConfig, LoggingConfig};

pub use export::RecordSummary;
