//! CSV parsing for formant measurement tables.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, warn};
use vowelspace_core::{Condition, Gender, VowelType};

use super::columns::{ColumnMap, Field};
use crate::error::{PipelineError, Result};

/// One parsed input row, before cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// 1-based line in the input.
    pub line: u64,
    /// Speaker identifier.
    pub subject: String,
    /// Lexical item label as written in the file.
    pub item_label: String,
    /// Vowel category.
    pub vowel: String,
    /// Monophthong or diphthong.
    pub vowel_type: VowelType,
    /// Speech register.
    pub condition: Condition,
    /// Speaker gender.
    pub gender: Gender,
    /// Duration in ms.
    pub duration_ms: f64,
    /// F1 in Hz.
    pub f1_hz: f64,
    /// F2 in Hz.
    pub f2_hz: f64,
}

/// Parsed rows and the number of rows skipped for missing cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawData {
    /// Rows with every cell present.
    pub records: Vec<RawRecord>,
    /// Rows dropped because a cell was empty or `NA`.
    pub dropped_missing: usize,
}

/// Load a measurement table from a CSV file.
///
/// # Errors
/// - `Schema` if a required column cannot be matched
/// - `InvalidValue` for unparsable, non-positive or unrecognised cells
/// - `Io`/`Csv` if the file cannot be read
pub fn load_raw_records(path: &Path) -> Result<RawData> {
    let file = File::open(path).map_err(|e| PipelineError::io(path, e))?;
    debug!(path = %path.display(), "reading measurements");
    read_raw_records(file)
}

/// Parse a measurement table from any reader.
pub fn read_raw_records<R: Read>(reader: R) -> Result<RawData> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    let columns = ColumnMap::resolve(rdr.headers()?.iter())?;

    let mut data = RawData::default();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        if record.iter().all(str::is_empty) {
            continue;
        }
        match parse_record(&record, &columns, line)? {
            Some(r) => data.records.push(r),
            None => data.dropped_missing += 1,
        }
    }

    if data.dropped_missing > 0 {
        warn!(
            rows = data.dropped_missing,
            "dropped rows with missing values"
        );
    }
    Ok(data)
}

/// Cells treated as missing.
fn is_missing(cell: &str) -> bool {
    cell.is_empty() || cell.eq_ignore_ascii_case("na") || cell.eq_ignore_ascii_case("nan")
}

fn parse_record(record: &StringRecord, columns: &ColumnMap, line: u64) -> Result<Option<RawRecord>> {
    let cell = |field: Field| record.get(columns.index(field)).unwrap_or("");

    if let Some(field) = Field::ALL.into_iter().find(|&f| is_missing(cell(f))) {
        debug!(line, column = %field, "missing cell, row dropped");
        return Ok(None);
    }

    let invalid = |field: Field| PipelineError::InvalidValue {
        line,
        column: field.canonical().to_string(),
        value: cell(field).to_string(),
    };
    let positive = |field: Field| -> Result<f64> {
        match cell(field).parse::<f64>() {
            Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
            _ => Err(invalid(field)),
        }
    };

    Ok(Some(RawRecord {
        line,
        subject: cell(Field::Subject).to_string(),
        item_label: cell(Field::Item).to_string(),
        vowel: cell(Field::Vowel).to_string(),
        vowel_type: VowelType::parse(cell(Field::VowelType))
            .ok_or_else(|| invalid(Field::VowelType))?,
        condition: Condition::parse(cell(Field::Condition))
            .ok_or_else(|| invalid(Field::Condition))?,
        gender: Gender::parse(cell(Field::Gender)).ok_or_else(|| invalid(Field::Gender))?,
        duration_ms: positive(Field::Duration)?,
        f1_hz: positive(Field::F1)?,
        f2_hz: positive(Field::F2)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Speaker,Word,Vowel,Vowel Type,Condition,Gender,Duration (ms),F1 (Hz),F2 (Hz)\n";

    fn parse(body: &str) -> Result<RawData> {
        read_raw_records(format!("{}{}", HEADER, body).as_bytes())
    }

    #[test]
    fn test_parse_display_headers() {
        let data = parse("S1,bat,a,mono,Casual,F,95.5,700,1500\n").unwrap();
        assert_eq!(data.records.len(), 1);
        let r = &data.records[0];
        assert_eq!(r.subject, "S1");
        assert_eq!(r.item_label, "bat");
        assert_eq!(r.condition, Condition::Casual);
        assert_eq!(r.gender, Gender::Female);
        assert_eq!(r.vowel_type, VowelType::Monophthong);
        assert_eq!(r.duration_ms, 95.5);
        assert_eq!(r.line, 2);
    }

    #[test]
    fn test_missing_cells_drop_row() {
        let data = parse(
            "S1,bat,a,mono,casual,F,NA,700,1500\n\
             S1,bit,i,mono,casual,F,80,,2200\n\
             S1,but,u,mono,casual,F,85,400,900\n",
        )
        .unwrap();
        assert_eq!(data.records.len(), 1);
        assert_eq!(data.dropped_missing, 2);
    }

    #[test]
    fn test_non_positive_is_invalid() {
        let err = parse("S1,bat,a,mono,casual,F,90,-3,1500\n").unwrap_err();
        match err {
            PipelineError::InvalidValue { line, column, value } => {
                assert_eq!(line, 2);
                assert_eq!(column, "f1");
                assert_eq!(value, "-3");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_unknown_condition_is_invalid() {
        let err = parse("S1,bat,a,mono,formal,F,90,700,1500\n").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidValue { ref column, .. } if column == "condition"));
    }

    #[test]
    fn test_schema_error() {
        let err = read_raw_records("subject,vowel\nS1,a\n".as_bytes()).unwrap_err();
        assert!(matches!(err, PipelineError::Schema(_)));
    }
}
