use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::ColumnMapping;

// ---------------------------------------------------------------------------
// Cells and records
// ---------------------------------------------------------------------------

/// One spreadsheet cell as handed over by the ingestion layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(_) => false,
        }
    }

    /// Display form: whole numbers render without a decimal point.
    pub fn to_display(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{n}")
                }
            }
            Self::Empty => String::new(),
        }
    }
}

/// One input row, keyed by physical column header. Immutable once ingested;
/// empty cells are simply absent.
pub type RawRecord = BTreeMap<String, CellValue>;

// ---------------------------------------------------------------------------
// Field resolution
// ---------------------------------------------------------------------------

/// Look a standard field up on a record through the client's column mapping.
/// `None` when the field is unmapped or the header is absent from the row.
pub fn resolve<'a>(
    record: &'a RawRecord,
    mapping: &ColumnMapping,
    key: &str,
) -> Option<&'a CellValue> {
    let header = mapping.get(key)?;
    record.get(header)
}

/// Resolved display text, or `default` when unmapped, absent, or blank.
pub fn display_or(value: Option<&CellValue>, default: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_display(),
        _ => default.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Safe numeric parsing
// ---------------------------------------------------------------------------
// Client data is heterogeneous; unparsable numerics silently count as zero.
// All default-to-zero behavior lives here so it stays testable in one place.

pub fn int_or_zero(value: Option<&CellValue>) -> i64 {
    match value {
        Some(CellValue::Number(n)) if n.is_finite() => n.trunc() as i64,
        Some(CellValue::Text(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.trunc() as i64))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

pub fn float_or_zero(value: Option<&CellValue>) -> f64 {
    match value {
        Some(CellValue::Number(n)) if n.is_finite() => *n,
        Some(CellValue::Text(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}
