// Workbook export for generated report tables.
//
// Presentation snapshot for hand-off to the teams working the queue, not a
// round-trip format.

use std::io::Write;
use std::path::Path;

use rust_xlsxwriter::Workbook as XlsxWorkbook;

use claimflow_engine::report::{ReportTable, ReportValue};

/// Write one worksheet per table: header row first, then data rows.
pub fn write_workbook(path: &Path, tables: &[ReportTable]) -> Result<(), String> {
    if tables.is_empty() {
        return Err("no tables to export".to_string());
    }

    let mut workbook = XlsxWorkbook::new();

    for table in tables {
        let worksheet = workbook
            .add_worksheet()
            .set_name(&table.sheet_name)
            .map_err(|e| format!("Failed to create sheet '{}': {}", table.sheet_name, e))?;

        for (col, header) in table.columns.iter().enumerate() {
            worksheet
                .write_string(0, col as u16, header.as_str())
                .map_err(|e| format!("Failed to write header '{header}': {e}"))?;
        }

        for (row_idx, row) in table.rows.iter().enumerate() {
            for (col, value) in row.iter().enumerate() {
                let (row_n, col_n) = (row_idx as u32 + 1, col as u16);
                match value {
                    ReportValue::Text(s) => worksheet.write_string(row_n, col_n, s.as_str()),
                    ReportValue::Int(n) => worksheet.write_number(row_n, col_n, *n as f64),
                    ReportValue::Float(n) => worksheet.write_number(row_n, col_n, *n),
                    ReportValue::Empty => continue,
                }
                .map_err(|e| format!("Failed to write cell: {e}"))?;
            }
        }
    }

    workbook
        .save(path)
        .map_err(|e| format!("Failed to save {}: {}", path.display(), e))
}

/// Write one table as CSV.
pub fn write_csv<W: Write>(writer: W, table: &ReportTable) -> Result<(), String> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer
        .write_record(&table.columns)
        .map_err(|e| format!("Failed to write CSV header: {e}"))?;

    for row in &table.rows {
        let fields: Vec<String> = row.iter().map(ReportValue::to_display).collect();
        csv_writer
            .write_record(&fields)
            .map_err(|e| format!("Failed to write CSV row: {e}"))?;
    }

    csv_writer
        .flush()
        .map_err(|e| format!("Failed to flush CSV output: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ReportTable {
        ReportTable {
            sheet_name: "W9 Needed".into(),
            columns: vec!["Claim ID".into(), "Age (in days)".into()],
            rows: vec![
                vec![ReportValue::Text("C-1".into()), ReportValue::Int(10)],
                vec![ReportValue::Text("C-2".into()), ReportValue::Empty],
            ],
        }
    }

    #[test]
    fn workbook_round_trips_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        write_workbook(&path, &[table()]).unwrap();
        assert!(path.exists());

        let records = crate::ingest::read_xlsx_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0]["Claim ID"],
            claimflow_engine::record::CellValue::Text("C-1".into())
        );
        assert_eq!(
            records[0]["Age (in days)"],
            claimflow_engine::record::CellValue::Number(10.0)
        );
        // Empty cell was skipped on write
        assert!(!records[1].contains_key("Age (in days)"));
    }

    #[test]
    fn empty_export_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.xlsx");
        assert!(write_workbook(&path, &[]).is_err());
    }

    #[test]
    fn csv_output_renders_display_values() {
        let mut buffer = Vec::new();
        write_csv(&mut buffer, &table()).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Claim ID,Age (in days)");
        assert_eq!(lines[1], "C-1,10");
        assert_eq!(lines[2], "C-2,");
    }
}
