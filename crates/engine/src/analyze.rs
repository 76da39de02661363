use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::ColumnMapping;
use crate::record::{display_or, float_or_zero, int_or_zero, resolve, CellValue, RawRecord};
use crate::rules::{classify, MatchSource, RuleIndex};
use crate::score::{priority_score, NOT_SCORED};

/// Workflow states that require human action. Only claims in one of these
/// states are categorized and scored.
pub const ACTIONABLE_STATES: &[&str] = &["PEND", "ONHOLD", "MANAGEMENTREVIEW"];

// ---------------------------------------------------------------------------
// Output model
// ---------------------------------------------------------------------------

/// One classified, scored claim derived from a raw input row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedClaim {
    pub claim_id: String,
    pub state: String,
    pub status: String,
    pub age: i64,
    pub net_payment: f64,
    pub provider_name: String,
    pub is_actionable: bool,
    pub category: String,
    pub category_id: Option<i64>,
    pub team_id: Option<i64>,
    pub team_name: Option<String>,
    pub send_to_l1_monitor: bool,
    pub source: Option<MatchSource>,
    pub priority_score: i64,
    /// Back-reference to the ingested row; exports re-derive fields from it.
    pub original: RawRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisMetrics {
    pub total_claims: usize,
    pub total_net_payment: f64,
    pub claims_by_status: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisMeta {
    pub client_name: String,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub meta: AnalysisMeta,
    pub claims: Vec<ProcessedClaim>,
    pub metrics: AnalysisMetrics,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run the full analysis over one uploaded dataset: normalize, accumulate
/// metrics, classify and score actionable claims. Single pass; the output
/// claim order matches the input order. A malformed row is coerced to
/// defaults, never an error.
pub fn analyze(
    records: &[RawRecord],
    mapping: &ColumnMapping,
    index: &RuleIndex,
    client_name: &str,
) -> AnalysisResult {
    let mut metrics = AnalysisMetrics::default();
    let mut claims = Vec::with_capacity(records.len());

    for record in records {
        let state = upper_or_unknown(resolve(record, mapping, "state"));
        let status = upper_or_unknown(resolve(record, mapping, "status"));
        let age = int_or_zero(resolve(record, mapping, "age"));
        let net_payment = float_or_zero(resolve(record, mapping, "netPayment"));

        metrics.total_claims += 1;
        if !net_payment.is_nan() {
            metrics.total_net_payment += net_payment;
        }
        *metrics.claims_by_status.entry(status.clone()).or_insert(0) += 1;

        let is_actionable = ACTIONABLE_STATES.contains(&state.as_str());

        let mut claim = ProcessedClaim {
            claim_id: display_or(resolve(record, mapping, "claimId"), "N/A"),
            provider_name: display_or(resolve(record, mapping, "providerName"), "Unknown"),
            state,
            status,
            age,
            net_payment,
            is_actionable,
            category: "N/A".into(),
            category_id: None,
            team_id: None,
            team_name: None,
            send_to_l1_monitor: false,
            source: None,
            priority_score: NOT_SCORED,
            original: record.clone(),
        };

        if is_actionable {
            let c = classify(record, mapping, index);
            claim.priority_score = priority_score(record, mapping, &claim.status, claim.age);
            claim.category = c.category;
            claim.category_id = c.category_id;
            claim.team_id = c.team_id;
            claim.team_name = c.team_name;
            claim.send_to_l1_monitor = c.send_to_l1_monitor;
            claim.source = Some(c.source);
        }

        claims.push(claim);
    }

    AnalysisResult {
        meta: AnalysisMeta {
            client_name: client_name.to_string(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        claims,
        metrics,
    }
}

/// Uppercased, trimmed text; `UNKNOWN` when unmapped or blank.
fn upper_or_unknown(value: Option<&CellValue>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_display().trim().to_uppercase(),
        _ => "UNKNOWN".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
