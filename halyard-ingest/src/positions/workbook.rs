//! Extraction and reshaping of the HR positions workbook.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use serde_json::{Map, Value, json};

use crate::IngestError;

/// Read the rows of the named worksheet.
///
/// A workbook without the worksheet yields no rows; only an unreadable
/// workbook is an error. That matches how the roster is maintained by
/// hand: a renamed tab means "nothing to import", not an outage.
pub(crate) fn read_worksheet_rows(
    path: &Path,
    worksheet: &str,
) -> Result<Vec<Vec<Value>>, IngestError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| IngestError::Sheet(e.to_string()))?;

    if !workbook.sheet_names().iter().any(|name| name == worksheet) {
        return Ok(Vec::new());
    }

    let range = workbook
        .worksheet_range(worksheet)
        .map_err(|e| IngestError::Sheet(e.to_string()))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_value).collect())
        .collect())
}

fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) => json!(s),
        Data::Float(f) => json!(f),
        Data::Int(i) => json!(i),
        Data::Bool(b) => json!(b),
        other => json!(other.to_string()),
    }
}

/// Reshape worksheet rows into one JSON record per data row.
///
/// The first row is the header; its cells become the field names
/// (blank headers get positional names). Rows with no values at all are
/// dropped.
#[must_use]
pub fn records_from_rows(rows: &[Vec<Value>]) -> Vec<Value> {
    let Some((header, data_rows)) = rows.split_first() else {
        return Vec::new();
    };

    let fields: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, cell)| match cell {
            Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
            Value::Null => format!("column_{i}"),
            other => {
                let text = other.to_string().trim_matches('"').trim().to_string();
                if text.is_empty() {
                    format!("column_{i}")
                } else {
                    text
                }
            }
        })
        .collect();

    data_rows
        .iter()
        .filter(|row| row.iter().any(|cell| !cell.is_null()))
        .map(|row| {
            let mut record = Map::new();
            for (field, cell) in fields.iter().zip(row.iter()) {
                record.insert(field.clone(), cell.clone());
            }
            Value::Object(record)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_become_records_keyed_by_header() {
        let rows = vec![
            vec![json!("Title"), json!("Department"), json!("Grade")],
            vec![json!("Registrar"), json!("Collections"), json!(7.0)],
            vec![json!("Educator"), json!("Programs"), Value::Null],
        ];

        let records = records_from_rows(&rows);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["Title"], json!("Registrar"));
        assert_eq!(records[0]["Grade"], json!(7.0));
        assert_eq!(records[1]["Department"], json!("Programs"));
        assert_eq!(records[1]["Grade"], Value::Null);
    }

    #[test]
    fn blank_headers_get_positional_names() {
        let rows = vec![
            vec![json!("Title"), Value::Null, json!("  ")],
            vec![json!("Registrar"), json!("x"), json!("y")],
        ];

        let records = records_from_rows(&rows);
        assert_eq!(records[0]["column_1"], json!("x"));
        assert_eq!(records[0]["column_2"], json!("y"));
    }

    #[test]
    fn empty_rows_are_dropped() {
        let rows = vec![
            vec![json!("Title")],
            vec![Value::Null],
            vec![json!("Registrar")],
        ];

        assert_eq!(records_from_rows(&rows).len(), 1);
    }

    #[test]
    fn a_headerless_sheet_yields_nothing() {
        assert!(records_from_rows(&[]).is_empty());
    }

    #[test]
    fn numeric_and_boolean_cells_convert_losslessly() {
        assert_eq!(cell_to_value(&Data::Float(7.5)), json!(7.5));
        assert_eq!(cell_to_value(&Data::Int(12)), json!(12));
        assert_eq!(cell_to_value(&Data::Bool(true)), json!(true));
        assert_eq!(cell_to_value(&Data::Empty), Value::Null);
        assert_eq!(
            cell_to_value(&Data::String("Registrar".into())),
            json!("Registrar")
        );
    }
}
