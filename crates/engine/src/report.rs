//! Report aggregation — projects processed claims through a report layout
//! into exportable tables.
//!
//! Two modes: ungrouped (one row per claim, selected columns resolved
//! through the layout's *source* configuration mapping, which may belong to
//! a different client than the one the claims were classified under) and
//! grouped (rows keyed by the concatenated group-by values, with derived
//! metrics per group).

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::analyze::ProcessedClaim;
use crate::config::{Catalog, ColumnMapping, ReportLayout};
use crate::error::EngineError;
use crate::fields::{display_name, METRICS};
use crate::record::{int_or_zero, resolve, CellValue, RawRecord};

// ---------------------------------------------------------------------------
// Output model
// ---------------------------------------------------------------------------

/// One exportable cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportValue {
    Text(String),
    Int(i64),
    Float(f64),
    Empty,
}

impl ReportValue {
    pub fn to_display(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Int(n) => n.to_string(),
            Self::Float(n) => n.to_string(),
            Self::Empty => String::new(),
        }
    }
}

/// One export sheet: header row + data rows, in column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTable {
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<ReportValue>>,
}

/// Blank tracking columns appended to every team report sheet.
const WORKFLOW_COLUMNS: &[&str] = &["Prov Ops Team Mbr", "PV Updated (Y/N)", "Notes"];

fn report_value(value: Option<&CellValue>) -> ReportValue {
    match value {
        Some(CellValue::Text(s)) => ReportValue::Text(s.clone()),
        Some(CellValue::Number(n)) => ReportValue::Float(*n),
        Some(CellValue::Empty) | None => ReportValue::Empty,
    }
}

fn report_value_or_na(value: Option<&CellValue>) -> ReportValue {
    match value {
        Some(v) if !v.is_empty() => report_value(Some(v)),
        _ => ReportValue::Text("N/A".into()),
    }
}

fn group_key_part(value: Option<&CellValue>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_display(),
        _ => "N/A".into(),
    }
}

/// Union of keys, first occurrence wins.
fn dedup_keys<'a>(lists: &[&'a [String]]) -> Vec<&'a str> {
    let mut seen = BTreeSet::new();
    let mut keys = Vec::new();
    for list in lists {
        for key in *list {
            if seen.insert(key.as_str()) {
                keys.push(key.as_str());
            }
        }
    }
    keys
}

// ---------------------------------------------------------------------------
// Layout-driven reports
// ---------------------------------------------------------------------------

/// Project a set of claims through a report layout. Assumes the layout has
/// already passed `validate_layout`; in particular a layout with metrics
/// has at least one group-by column.
pub fn build_report(
    sheet_name: &str,
    claims: &[&ProcessedClaim],
    layout: &ReportLayout,
    source_mapping: &ColumnMapping,
) -> ReportTable {
    if layout.group_by.is_empty() {
        build_ungrouped(sheet_name, claims, layout, source_mapping)
    } else {
        build_grouped(sheet_name, claims, layout, source_mapping)
    }
}

fn build_ungrouped(
    sheet_name: &str,
    claims: &[&ProcessedClaim],
    layout: &ReportLayout,
    source_mapping: &ColumnMapping,
) -> ReportTable {
    let keys = dedup_keys(&[&layout.data_columns, &layout.group_by, &layout.metrics]);
    let columns: Vec<String> = keys.iter().map(|k| display_name(k).to_string()).collect();

    let rows = claims
        .iter()
        .map(|claim| {
            keys.iter()
                .map(|key| report_value(resolve(&claim.original, source_mapping, key)))
                .collect()
        })
        .collect();

    ReportTable { sheet_name: sheet_name.to_string(), columns, rows }
}

struct GroupAcc {
    first_seen: Vec<ReportValue>,
    count: usize,
    total_age: i64,
    total_clean_age: i64,
}

fn build_grouped(
    sheet_name: &str,
    claims: &[&ProcessedClaim],
    layout: &ReportLayout,
    source_mapping: &ColumnMapping,
) -> ReportTable {
    let leading = dedup_keys(&[&layout.data_columns, &layout.group_by]);

    // Groups are formed only from existing claims, so an empty group is
    // never emitted. BTreeMap keeps the rows in deterministic key order.
    let mut groups: BTreeMap<String, GroupAcc> = BTreeMap::new();
    for claim in claims {
        let key = layout
            .group_by
            .iter()
            .map(|k| group_key_part(resolve(&claim.original, source_mapping, k)))
            .collect::<Vec<_>>()
            .join("|");

        let acc = groups.entry(key).or_insert_with(|| GroupAcc {
            first_seen: leading
                .iter()
                .map(|k| report_value_or_na(resolve(&claim.original, source_mapping, k)))
                .collect(),
            count: 0,
            total_age: 0,
            total_clean_age: 0,
        });
        acc.count += 1;
        acc.total_age += int_or_zero(resolve(&claim.original, source_mapping, "age"));
        acc.total_clean_age += int_or_zero(resolve(&claim.original, source_mapping, "cleanAge"));
    }

    // Metric columns come out in catalog order regardless of how the layout
    // lists them.
    let metrics: Vec<&'static str> = METRICS
        .iter()
        .map(|m| m.key)
        .filter(|key| layout.metrics.iter().any(|m| m == key))
        .collect();

    let mut columns: Vec<String> = leading.iter().map(|k| display_name(k).to_string()).collect();
    columns.extend(metrics.iter().map(|k| display_name(k).to_string()));

    let rows = groups
        .into_values()
        .map(|group| {
            let mut row = group.first_seen;
            for metric in &metrics {
                row.push(match *metric {
                    "count" => ReportValue::Int(group.count as i64),
                    "avgAge" => average(group.total_age, group.count),
                    "avgCleanAge" => average(group.total_clean_age, group.count),
                    _ => ReportValue::Empty,
                });
            }
            row
        })
        .collect();

    ReportTable { sheet_name: sheet_name.to_string(), columns, rows }
}

/// One-decimal average; `0` rather than a division by zero.
fn average(total: i64, count: usize) -> ReportValue {
    if count > 0 {
        ReportValue::Text(format!("{:.1}", total as f64 / count as f64))
    } else {
        ReportValue::Int(0)
    }
}

// ---------------------------------------------------------------------------
// Team report generation
// ---------------------------------------------------------------------------

/// Distinct team names across actionable claims, sorted. One export
/// workbook is offered per team.
pub fn team_names(claims: &[ProcessedClaim]) -> Vec<String> {
    let mut names: Vec<String> = claims
        .iter()
        .filter(|c| c.is_actionable)
        .filter_map(|c| c.team_name.clone())
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Build one team's export: the team's actionable claims partitioned by the
/// custom layout saved for (team, category) when one exists, else by the
/// claim's category. One table per partition, sheets sorted by name.
pub fn team_report_tables(
    team_name: &str,
    claims: &[ProcessedClaim],
    catalog: &Catalog,
) -> Result<Vec<ReportTable>, EngineError> {
    #[derive(PartialEq, Eq, PartialOrd, Ord)]
    enum PartKey {
        Config(i64),
        Category(String),
    }

    let mut partitions: BTreeMap<PartKey, Vec<&ProcessedClaim>> = BTreeMap::new();
    for claim in claims
        .iter()
        .filter(|c| c.is_actionable && c.team_name.as_deref() == Some(team_name))
    {
        let key = match (claim.team_id, claim.category_id) {
            (Some(team_id), Some(category_id)) => {
                match catalog.report_config_for(team_id, category_id) {
                    Some(rc) => PartKey::Config(rc.id),
                    None => PartKey::Category(claim.category.clone()),
                }
            }
            _ => PartKey::Category(claim.category.clone()),
        };
        partitions.entry(key).or_default().push(claim);
    }

    let mut tables = Vec::new();
    for (key, group) in &partitions {
        let sheet_name = sanitize_sheet_name(&group[0].category);
        let table = match key {
            PartKey::Config(id) => {
                // The id came from this catalog moments ago.
                let Some(rc) = catalog.report_config_by_id(*id) else { continue };
                let layout = &rc.report_config_data;
                let source = catalog.client_by_id(layout.source_config_id).ok_or_else(|| {
                    EngineError::CatalogValidation(format!(
                        "report layout {} references unknown source config {}",
                        rc.id, layout.source_config_id
                    ))
                })?;
                build_report(&sheet_name, group, layout, &source.config_data.column_mappings)
            }
            PartKey::Category(_) => default_table(&sheet_name, group),
        };
        if table.rows.is_empty() {
            continue;
        }
        tables.push(append_workflow_columns(table));
    }

    tables.sort_by(|a, b| a.sheet_name.cmp(&b.sheet_name));
    Ok(tables)
}

/// Default partition: every original column plus the assigned category and
/// team. Column set is the union of headers across the group, sorted.
fn default_table(sheet_name: &str, group: &[&ProcessedClaim]) -> ReportTable {
    let headers: BTreeSet<&str> = group
        .iter()
        .flat_map(|c| c.original.keys().map(String::as_str))
        .collect();

    let mut columns: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    columns.push("Category".into());
    columns.push("Assigned Team".into());

    let rows = group
        .iter()
        .map(|claim| {
            let mut row: Vec<ReportValue> = headers
                .iter()
                .map(|h| report_value(claim.original.get(*h)))
                .collect();
            row.push(ReportValue::Text(claim.category.clone()));
            row.push(ReportValue::Text(
                claim.team_name.clone().unwrap_or_else(|| "N/A".into()),
            ));
            row
        })
        .collect();

    ReportTable { sheet_name: sheet_name.to_string(), columns, rows }
}

/// One table straight from raw records: union of headers, sorted.
pub fn table_from_records(sheet_name: &str, records: &[&RawRecord]) -> ReportTable {
    let headers: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.keys().map(String::as_str))
        .collect();

    let columns: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    let rows = records
        .iter()
        .map(|record| headers.iter().map(|h| report_value(record.get(*h))).collect())
        .collect();

    ReportTable { sheet_name: sheet_name.to_string(), columns, rows }
}

fn append_workflow_columns(mut table: ReportTable) -> ReportTable {
    for column in WORKFLOW_COLUMNS {
        table.columns.push(column.to_string());
    }
    for row in &mut table.rows {
        for _ in WORKFLOW_COLUMNS {
            row.push(ReportValue::Empty);
        }
    }
    table
}

/// Worksheet names cannot contain `/ \ ? * [ ]` and cap at 31 characters.
pub fn sanitize_sheet_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '/' | '\\' | '?' | '*' | '[' | ']'))
        .take(31)
        .collect()
}

// ---------------------------------------------------------------------------
// L1 monitor specialty report
// ---------------------------------------------------------------------------

/// Fixed-column specialty report for claims whose category routes to the
/// L1 monitor queue.
pub fn l1_monitor_table(claims: &[ProcessedClaim], mapping: &ColumnMapping) -> ReportTable {
    let columns = vec![
        "Claim ID".to_string(),
        "Category".to_string(),
        "Assigned Team".to_string(),
        "Age (Days)".to_string(),
        "Amount at Risk".to_string(),
        "Billing Provider Name".to_string(),
        "Billing Provider Tax ID".to_string(),
    ];

    let rows = claims
        .iter()
        .filter(|c| c.is_actionable && c.send_to_l1_monitor)
        .map(|claim| {
            vec![
                ReportValue::Text(claim.claim_id.clone()),
                ReportValue::Text(claim.category.clone()),
                ReportValue::Text(claim.team_name.clone().unwrap_or_else(|| "N/A".into())),
                ReportValue::Int(claim.age),
                ReportValue::Float(claim.net_payment),
                ReportValue::Text(claim.provider_name.clone()),
                report_value(resolve(&claim.original, mapping, "billingProviderTaxId")),
            ]
        })
        .collect();

    ReportTable { sheet_name: "L1 Monitor Items".to_string(), columns, rows }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
