//! `claimflow-engine` — claim categorization, prioritization, and
//! aggregation engine.
//!
//! Pure engine crate: receives pre-loaded records, returns classified,
//! scored, and aggregated results. No CLI or IO dependencies.

pub mod analyze;
pub mod config;
pub mod error;
pub mod fields;
pub mod queue;
pub mod record;
pub mod report;
pub mod rules;
pub mod score;
pub mod triage;

pub use analyze::{analyze, AnalysisResult, ProcessedClaim};
pub use config::{Catalog, ColumnMapping};
pub use error::EngineError;
pub use record::{CellValue, RawRecord};
pub use report::ReportTable;
pub use rules::RuleIndex;
