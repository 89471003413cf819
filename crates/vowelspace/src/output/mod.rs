//! Output formatting: coloured terminal report, JSON and CSV tables.

mod json;
pub mod tables;
mod terminal;

pub use json::{to_json, to_json_pretty};
pub use tables::{write_all, Tables};
pub use terminal::{format_descriptive, format_model, format_report};
