//! Loading and cleaning formant measurements.
//!
//! The input is one CSV file with a header naming the nine fields subject,
//! item, vowel, vowel type, condition, gender, duration, F1 and F2. Display
//! headers are accepted (`Speaker`, `F1 (Hz)`, `Duration (ms)`, ...).
//!
//! # Example
//!
//! ```ignore
//! use vowelspace::data::load_tokens;
//! use std::path::Path;
//!
//! let data = load_tokens(Path::new("formants.csv"))?;
//! println!("{} tokens over {} items", data.tokens.len(), data.items.len());
//! ```

mod clean;
mod columns;
mod csv;

pub use self::clean::{clean, CleanedData, ItemIndex};
pub use self::columns::{normalize_header, ColumnMap, Field};
pub use self::csv::{load_raw_records, read_raw_records, RawData, RawRecord};

use std::path::Path;

use crate::error::Result;

/// Read and clean a measurement file.
pub fn load_tokens(path: &Path) -> Result<CleanedData> {
    clean(load_raw_records(path)?)
}
