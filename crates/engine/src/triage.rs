//! Cross-report reconciliation: joins the working dataset with a provider
//! verification export on the claim identifier and derives a per-claim
//! "tax ID has a W9 on file" flag for the management-review W9 queue.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::config::ColumnMapping;
use crate::error::EngineError;
use crate::record::{resolve, RawRecord};
use crate::report::{table_from_records, ReportTable};
use crate::rules::{classify, RuleIndex};

// ---------------------------------------------------------------------------
// Verification column discovery
// ---------------------------------------------------------------------------

// Accepted header spellings, matched case-insensitively after trimming.
const W9_ATTACHED_ALIASES: &[&str] = &["w9 attached in pv (yes/no)", "w9 attached", "w9attached"];
const TAX_ID_ALIASES: &[&str] = &["billing tax id", "billing provider tax id", "tax id"];
const CLAIM_ID_ALIASES: &[&str] = &["claim id", "claimid", "claim number"];

const W9_ATTACHED_LABEL: &str = "W9 Attached in PV (YES/NO)";
const TAX_ID_LABEL: &str = "Billing TAX ID";
const CLAIM_ID_LABEL: &str = "Claim ID";

fn find_header<'a>(headers: &'a BTreeSet<String>, aliases: &[&str]) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| aliases.contains(&h.trim().to_lowercase().as_str()))
        .map(String::as_str)
}

// ---------------------------------------------------------------------------
// Output model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum W9Status {
    #[serde(rename = "YES")]
    Yes,
    #[serde(rename = "NO")]
    No,
}

impl fmt::Display for W9Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yes => write!(f, "YES"),
            Self::No => write!(f, "NO"),
        }
    }
}

/// Downstream routing suggestion derived from the W9 flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageQueue {
    ProviderOps,
    L1Monitor,
}

impl fmt::Display for TriageQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderOps => write!(f, "provider_ops"),
            Self::L1Monitor => write!(f, "l1_monitor"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriageClaim {
    pub claim_id: String,
    pub provider_name: String,
    pub provider_tin: Option<String>,
    pub tin_has_w9: W9Status,
    pub original: RawRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TriageSummary {
    pub eligible: usize,
    pub with_w9: usize,
    pub without_w9: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TriageOutcome {
    pub claims: Vec<TriageClaim>,
    pub summary: TriageSummary,
}

/// A provider with a W9 on file for one claim has it on file for every
/// claim under the same tax ID, so the suggestion keys off the TIN flag.
pub fn suggested_queue(claim: &TriageClaim) -> TriageQueue {
    match claim.tin_has_w9 {
        W9Status::Yes => TriageQueue::L1Monitor,
        W9Status::No => TriageQueue::ProviderOps,
    }
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// Join the main dataset with the verification dataset. Fails up front when
/// any required verification column cannot be discovered, naming every
/// missing one; everything past that degrades row-by-row.
pub fn triage(
    main_records: &[RawRecord],
    verification_records: &[RawRecord],
    mapping: &ColumnMapping,
    index: &RuleIndex,
) -> Result<TriageOutcome, EngineError> {
    let headers: BTreeSet<String> = verification_records
        .iter()
        .flat_map(|r| r.keys().cloned())
        .collect();

    let w9_header = find_header(&headers, W9_ATTACHED_ALIASES);
    let tax_header = find_header(&headers, TAX_ID_ALIASES);
    let claim_header = find_header(&headers, CLAIM_ID_ALIASES);

    let mut missing = Vec::new();
    if w9_header.is_none() {
        missing.push(W9_ATTACHED_LABEL.to_string());
    }
    if tax_header.is_none() {
        missing.push(TAX_ID_LABEL.to_string());
    }
    if claim_header.is_none() {
        missing.push(CLAIM_ID_LABEL.to_string());
    }
    if !missing.is_empty() {
        return Err(EngineError::MissingColumns { columns: missing });
    }
    let (w9_header, tax_header, claim_header) =
        (w9_header.unwrap(), tax_header.unwrap(), claim_header.unwrap());

    // Tax IDs with at least one YES row, and claim id -> verification row.
    let mut verified_tins: BTreeSet<String> = BTreeSet::new();
    let mut by_claim_id: BTreeMap<String, &RawRecord> = BTreeMap::new();
    for row in verification_records {
        let claim_id = row.get(claim_header).map(|v| v.to_display().trim().to_string());
        if let Some(claim_id) = claim_id.filter(|id| !id.is_empty()) {
            by_claim_id.insert(claim_id, row);
        }

        let tin = row.get(tax_header).map(|v| v.to_display().trim().to_string());
        let w9 = row
            .get(w9_header)
            .map(|v| v.to_display().trim().to_uppercase())
            .unwrap_or_default();
        if let Some(tin) = tin.filter(|t| !t.is_empty()) {
            if w9 == "YES" {
                verified_tins.insert(tin);
            }
        }
    }

    let mut claims = Vec::new();
    for record in main_records {
        let claim_id = resolve(record, mapping, "claimId")
            .map(|v| v.to_display().trim().to_string())
            .unwrap_or_default();
        if claim_id.is_empty() || !by_claim_id.contains_key(&claim_id) {
            continue;
        }

        let status = resolve(record, mapping, "status")
            .map(|v| v.to_display().trim().to_uppercase())
            .unwrap_or_default();
        if status != "MANAGEMENTREVIEW" {
            continue;
        }

        let classification = classify(record, mapping, index);
        if classification.team_name.as_deref() != Some("Provider Operations") {
            continue;
        }
        if !classification.category.to_uppercase().contains("W9") {
            continue;
        }

        let tin = resolve(record, mapping, "billingProviderTaxId")
            .map(|v| v.to_display().trim().to_string())
            .filter(|t| !t.is_empty());
        let tin_has_w9 = match &tin {
            Some(tin) if verified_tins.contains(tin) => W9Status::Yes,
            _ => W9Status::No,
        };

        claims.push(TriageClaim {
            claim_id,
            provider_name: resolve(record, mapping, "providerName")
                .map(|v| v.to_display())
                .unwrap_or_default(),
            provider_tin: tin,
            tin_has_w9,
            original: record.clone(),
        });
    }

    let summary = TriageSummary {
        eligible: claims.len(),
        with_w9: claims.iter().filter(|c| c.tin_has_w9 == W9Status::Yes).count(),
        without_w9: claims.iter().filter(|c| c.tin_has_w9 == W9Status::No).count(),
    };

    Ok(TriageOutcome { claims, summary })
}

/// Split the triaged claims into per-queue assignment tables of their
/// original rows. Empty queues produce no table.
pub fn assignment_tables(outcome: &TriageOutcome) -> Vec<ReportTable> {
    let provider_ops: Vec<&RawRecord> = outcome
        .claims
        .iter()
        .filter(|c| suggested_queue(c) == TriageQueue::ProviderOps)
        .map(|c| &c.original)
        .collect();
    let l1_monitor: Vec<&RawRecord> = outcome
        .claims
        .iter()
        .filter(|c| suggested_queue(c) == TriageQueue::L1Monitor)
        .map(|c| &c.original)
        .collect();

    let mut tables = Vec::new();
    if !provider_ops.is_empty() {
        tables.push(table_from_records("Provider Ops Assignments", &provider_ops));
    }
    if !l1_monitor.is_empty() {
        tables.push(table_from_records("L1 Monitor Assignments", &l1_monitor));
    }
    tables
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Catalog;
    use crate::record::CellValue;

    fn catalog() -> Catalog {
        Catalog::from_toml(
            r#"
name = "Triage Test"

[[teams]]
id = 1
team_name = "Provider Operations"

[[teams]]
id = 2
team_name = "Claims Processing"

[[categories]]
id = 10
category_name = "W9 Needed"
team_id = 1

[[categories]]
id = 11
category_name = "Pricing"
team_id = 2

[[configs]]
id = 100
config_name = "Acme"
[configs.config_data]
client_name = "Acme"

[[edit_rules]]
config_id = 100
text = "W9 REQUIRED"
category_id = 10

[[edit_rules]]
config_id = 100
text = "PRICING HOLD"
category_id = 11
"#,
        )
        .unwrap()
    }

    fn mapping() -> ColumnMapping {
        [
            ("claimId", "Claim Number"),
            ("status", "Final Status"),
            ("edit", "Edit"),
            ("notes", "Notes"),
            ("providerName", "Billing Provider"),
            ("billingProviderTaxId", "Tax ID"),
        ]
        .iter()
        .map(|(k, h)| (k.to_string(), h.to_string()))
        .collect()
    }

    fn main_record(id: &str, status: &str, edit: &str, tin: &str) -> RawRecord {
        [
            ("Claim Number", id),
            ("Final Status", status),
            ("Edit", edit),
            ("Billing Provider", "Alpha Medical"),
            ("Tax ID", tin),
        ]
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(h, v)| (h.to_string(), CellValue::Text(v.to_string())))
        .collect()
    }

    fn verification_record(id: &str, tin: &str, w9: &str) -> RawRecord {
        [
            ("Claim ID", id),
            ("Billing TAX ID", tin),
            ("W9 Attached in PV (YES/NO)", w9),
        ]
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(h, v)| (h.to_string(), CellValue::Text(v.to_string())))
        .collect()
    }

    fn index() -> RuleIndex {
        RuleIndex::build(&catalog(), 100)
    }

    #[test]
    fn missing_columns_reported_together() {
        let verification = vec![[("Some Column", "x")]
            .iter()
            .map(|(h, v)| (h.to_string(), CellValue::Text(v.to_string())))
            .collect::<RawRecord>()];
        let err = triage(&[], &verification, &mapping(), &index()).unwrap_err();
        match err {
            EngineError::MissingColumns { columns } => {
                assert_eq!(
                    columns,
                    vec![
                        "W9 Attached in PV (YES/NO)".to_string(),
                        "Billing TAX ID".to_string(),
                        "Claim ID".to_string(),
                    ]
                );
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn header_discovery_is_case_insensitive() {
        let verification = vec![[
            ("CLAIM ID", "C1"),
            ("billing tax id", "12-1"),
            ("W9 ATTACHED IN PV (YES/NO)", "yes"),
        ]
        .iter()
        .map(|(h, v)| (h.to_string(), CellValue::Text(v.to_string())))
        .collect::<RawRecord>()];
        let main = vec![main_record("C1", "ManagementReview", "W9 REQUIRED", "12-1")];
        let outcome = triage(&main, &verification, &mapping(), &index()).unwrap();
        assert_eq!(outcome.claims.len(), 1);
        assert_eq!(outcome.claims[0].tin_has_w9, W9Status::Yes);
    }

    #[test]
    fn eligible_claim_with_verified_tin_is_yes() {
        let main = vec![main_record("C1", "MANAGEMENTREVIEW", "W9 REQUIRED", "12-1")];
        let verification = vec![verification_record("C1", "12-1", "YES")];
        let outcome = triage(&main, &verification, &mapping(), &index()).unwrap();
        assert_eq!(outcome.summary.eligible, 1);
        assert_eq!(outcome.summary.with_w9, 1);
        assert_eq!(outcome.claims[0].provider_tin.as_deref(), Some("12-1"));
    }

    #[test]
    fn tin_without_yes_row_is_no() {
        let main = vec![main_record("C1", "MANAGEMENTREVIEW", "W9 REQUIRED", "12-1")];
        let verification = vec![verification_record("C1", "12-1", "NO")];
        let outcome = triage(&main, &verification, &mapping(), &index()).unwrap();
        assert_eq!(outcome.claims[0].tin_has_w9, W9Status::No);
        assert_eq!(outcome.summary.without_w9, 1);
    }

    #[test]
    fn yes_on_one_claim_covers_every_claim_with_that_tin() {
        let main = vec![
            main_record("C1", "MANAGEMENTREVIEW", "W9 REQUIRED", "12-1"),
            main_record("C2", "MANAGEMENTREVIEW", "W9 REQUIRED", "12-1"),
        ];
        let verification = vec![
            verification_record("C1", "12-1", "YES"),
            verification_record("C2", "12-1", "NO"),
        ];
        let outcome = triage(&main, &verification, &mapping(), &index()).unwrap();
        assert_eq!(outcome.summary.with_w9, 2);
    }

    #[test]
    fn ineligible_claims_are_filtered() {
        let main = vec![
            // Not in the verification report
            main_record("C0", "MANAGEMENTREVIEW", "W9 REQUIRED", "12-1"),
            // Wrong status
            main_record("C1", "PEND", "W9 REQUIRED", "12-1"),
            // Wrong team / category
            main_record("C2", "MANAGEMENTREVIEW", "PRICING HOLD", "12-1"),
            // No matching rule at all -> default category
            main_record("C3", "MANAGEMENTREVIEW", "", "12-1"),
            // Eligible
            main_record("C4", "MANAGEMENTREVIEW", "W9 REQUIRED", "12-1"),
        ];
        let verification = vec![
            verification_record("C1", "12-1", "YES"),
            verification_record("C2", "", ""),
            verification_record("C3", "", ""),
            verification_record("C4", "", ""),
        ];
        let outcome = triage(&main, &verification, &mapping(), &index()).unwrap();
        assert_eq!(outcome.summary.eligible, 1);
        assert_eq!(outcome.claims[0].claim_id, "C4");
        // C4's TIN was verified through C1's row
        assert_eq!(outcome.claims[0].tin_has_w9, W9Status::Yes);
    }

    #[test]
    fn queues_split_on_w9_flag() {
        let main = vec![
            main_record("C1", "MANAGEMENTREVIEW", "W9 REQUIRED", "12-1"),
            main_record("C2", "MANAGEMENTREVIEW", "W9 REQUIRED", "99-9"),
        ];
        let verification = vec![
            verification_record("C1", "12-1", "YES"),
            verification_record("C2", "99-9", "NO"),
        ];
        let outcome = triage(&main, &verification, &mapping(), &index()).unwrap();
        assert_eq!(suggested_queue(&outcome.claims[0]), TriageQueue::L1Monitor);
        assert_eq!(suggested_queue(&outcome.claims[1]), TriageQueue::ProviderOps);

        let tables = assignment_tables(&outcome);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].sheet_name, "Provider Ops Assignments");
        assert_eq!(tables[1].sheet_name, "L1 Monitor Assignments");
        assert_eq!(tables[0].rows.len(), 1);
        assert_eq!(tables[1].rows.len(), 1);
    }

    #[test]
    fn empty_queue_produces_no_table() {
        let main = vec![main_record("C1", "MANAGEMENTREVIEW", "W9 REQUIRED", "12-1")];
        let verification = vec![verification_record("C1", "12-1", "YES")];
        let outcome = triage(&main, &verification, &mapping(), &index()).unwrap();
        let tables = assignment_tables(&outcome);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].sheet_name, "L1 Monitor Assignments");
    }
}
