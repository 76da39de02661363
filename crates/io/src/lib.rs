//! `claimflow-io` — spreadsheet ingestion and workbook export.
//!
//! Converts uploaded tabular files into the engine's header-keyed records
//! and writes generated report tables back out. One-way in both directions;
//! nothing here is a round-trip format.

pub mod export;
pub mod ingest;

pub use export::{write_csv, write_workbook};
pub use ingest::{read_csv_records, read_records, read_xlsx_records};
