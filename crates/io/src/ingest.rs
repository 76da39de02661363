// Tabular file import (xlsx, xls, ods via calamine; csv/tsv via csv).
//
// Only the first sheet of a workbook is read. The first row is the header
// row; blank and duplicate header cells are dropped (first occurrence wins)
// so every record key is unambiguous.

use std::io::Read;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use claimflow_engine::record::{CellValue, RawRecord};

/// Read records from a file, picking the format by extension. CSV for
/// `.csv`/`.tsv`/`.txt`, spreadsheet formats otherwise.
pub fn read_records(path: &Path) -> Result<Vec<RawRecord>, String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" | "tsv" | "txt" => read_csv_file(path),
        _ => read_xlsx_records(path),
    }
}

/// Read the first sheet of a workbook into header-keyed records.
pub fn read_xlsx_records(path: &Path) -> Result<Vec<RawRecord>, String> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let first = sheet_names
        .first()
        .ok_or_else(|| format!("{} contains no sheets", path.display()))?
        .clone();

    let range = workbook
        .worksheet_range(&first)
        .map_err(|e| format!("Failed to read sheet '{first}': {e}"))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(row) => row.iter().map(header_text).collect(),
        None => return Ok(Vec::new()),
    };

    let records = rows
        .map(|row| row.iter().map(convert_cell).collect::<Vec<_>>())
        .collect::<Vec<_>>();

    Ok(build_records(headers, records))
}

fn read_csv_file(path: &Path) -> Result<Vec<RawRecord>, String> {
    let file = std::fs::File::open(path)
        .map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;
    read_csv_records(file)
}

/// Read CSV data into header-keyed records. Cell values stay textual; the
/// engine's safe numeric parsing handles the rest.
pub fn read_csv_records<R: Read>(reader: R) -> Result<Vec<RawRecord>, String> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .map_err(|e| format!("Failed to read CSV headers: {e}"))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row.map_err(|e| format!("Failed to read CSV row: {e}"))?;
        records.push(
            row.iter()
                .map(|value| {
                    if value.trim().is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::Text(value.to_string())
                    }
                })
                .collect::<Vec<_>>(),
        );
    }

    Ok(build_records(headers, records))
}

/// Pair each row up with the usable headers. Blank headers and repeats of
/// an already-seen header are dropped; empty cells are not stored.
fn build_records(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Vec<RawRecord> {
    let mut seen: Vec<&str> = Vec::new();
    let usable: Vec<Option<String>> = headers
        .iter()
        .map(|h| {
            let trimmed = h.trim();
            if trimmed.is_empty() || seen.contains(&trimmed) {
                None
            } else {
                seen.push(trimmed);
                Some(trimmed.to_string())
            }
        })
        .collect();

    rows.into_iter()
        .map(|row| {
            let mut record = RawRecord::new();
            for (i, value) in row.into_iter().enumerate() {
                if let Some(Some(header)) = usable.get(i) {
                    if !matches!(value, CellValue::Empty) {
                        record.insert(header.clone(), value);
                    }
                }
            }
            record
        })
        .collect()
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Empty => String::new(),
        other => format!("{other}"),
    }
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => {
            if s.is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(s.clone())
            }
        }
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(e) => CellValue::Text(format!("#{e:?}")),
        // Keep the raw serial; the engine treats dates as opaque values
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) => CellValue::Text(s.clone()),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_rows_become_header_keyed_records() {
        let csv = "\
Claim Number,Days Old,Net Pay
C-1,10,250.00
C-2,20,
";
        let records = read_csv_records(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0]["Claim Number"],
            CellValue::Text("C-1".to_string())
        );
        assert_eq!(records[0]["Net Pay"], CellValue::Text("250.00".to_string()));
        // Empty cell is simply absent
        assert!(!records[1].contains_key("Net Pay"));
    }

    #[test]
    fn blank_and_duplicate_headers_are_dropped() {
        let csv = "\
Claim Number,,Days Old,Claim Number
C-1,ignored,10,shadowed
";
        let records = read_csv_records(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        // First occurrence of the duplicated header wins
        assert_eq!(
            records[0]["Claim Number"],
            CellValue::Text("C-1".to_string())
        );
        assert_eq!(records[0].len(), 2);
    }

    #[test]
    fn short_rows_are_tolerated() {
        let csv = "\
A,B,C
1,2
";
        let records = read_csv_records(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].len(), 2);
        assert!(!records[0].contains_key("C"));
    }

    #[test]
    fn header_whitespace_is_trimmed() {
        let csv = " Claim Number , Days Old\nC-1,10\n";
        let records = read_csv_records(csv.as_bytes()).unwrap();
        assert!(records[0].contains_key("Claim Number"));
        assert!(records[0].contains_key("Days Old"));
    }
}
