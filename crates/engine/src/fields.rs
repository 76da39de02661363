//! Standard field catalog — semantic column identities independent of any
//! client's actual spreadsheet headers.
//!
//! This is the single source of truth for field keys, display names, and the
//! derived metrics reports may request. Clients map each key they care about
//! to a physical header; everything else stays unmapped and resolves to
//! nothing at read time.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Number,
    Date,
}

#[derive(Debug, Clone, Copy)]
pub struct StandardField {
    pub key: &'static str,
    pub display_name: &'static str,
    pub required: bool,
    pub ty: FieldType,
}

const fn field(
    key: &'static str,
    display_name: &'static str,
    required: bool,
    ty: FieldType,
) -> StandardField {
    StandardField { key, display_name, required, ty }
}

pub const STANDARD_FIELDS: &[StandardField] = &[
    field("claimId", "Claim ID / Number", true, FieldType::Text),
    field("age", "Age (in days)", true, FieldType::Number),
    field("netPayment", "Net Payment Amount", true, FieldType::Number),
    field("state", "Claim State", true, FieldType::Text),
    field("status", "Claim Status", true, FieldType::Text),
    field("networkStatus", "Network Status", true, FieldType::Text),
    field("providerName", "Billing Provider Name", true, FieldType::Text),
    field("edit", "Claim Edits", true, FieldType::Text),
    field("notes", "Claim Notes", true, FieldType::Text),
    field("totalCharges", "Total Billed Amount", false, FieldType::Number),
    field("dsnp", "DSNP Status", false, FieldType::Text),
    field("payer", "Payer Name", false, FieldType::Text),
    field("claimCategory", "Category", false, FieldType::Text),
    field("claimType", "Claim Type", false, FieldType::Text),
    field("receivedDate", "Received Date", false, FieldType::Date),
    field("billingProviderTaxId", "Billing Provider Tax ID", false, FieldType::Text),
    field("billingProviderNpi", "Billing Provider NPI", false, FieldType::Text),
    field("patientName", "Patient Name", false, FieldType::Text),
    field("subscriberId", "Subscriber ID", false, FieldType::Text),
    field("renderingProviderName", "Rendering Provider Name", false, FieldType::Text),
    field("renderingProviderNpi", "Rendering Provider NPI", false, FieldType::Text),
    field("dosFrom", "Date of Service (From)", false, FieldType::Date),
    field("dosTo", "Date of Service (To)", false, FieldType::Date),
    field("cleanAge", "Clean Age", false, FieldType::Number),
    field("pbpName", "PBP Name", false, FieldType::Text),
    field("planName", "Plan Name", false, FieldType::Text),
    field("activityLog", "Activity Log Description", false, FieldType::Text),
    field("activityUser", "Activity Performed By", false, FieldType::Text),
    field("activityDate", "Activity Performed On", false, FieldType::Date),
];

/// A derived report metric and the standard fields it needs mapped.
#[derive(Debug, Clone, Copy)]
pub struct Metric {
    pub key: &'static str,
    pub display_name: &'static str,
    pub required: &'static [&'static str],
}

pub const METRICS: &[Metric] = &[
    Metric { key: "count", display_name: "Number of Claims", required: &["claimId"] },
    Metric { key: "avgAge", display_name: "Average Claim Age", required: &["age"] },
    Metric { key: "avgCleanAge", display_name: "Average Clean Age", required: &["cleanAge"] },
];

pub fn standard_field(key: &str) -> Option<&'static StandardField> {
    STANDARD_FIELDS.iter().find(|f| f.key == key)
}

pub fn metric(key: &str) -> Option<&'static Metric> {
    METRICS.iter().find(|m| m.key == key)
}

/// Display name for a field or metric key; unknown keys fall back to the
/// key itself so report columns never come out blank.
pub fn display_name(key: &str) -> &str {
    if let Some(f) = standard_field(key) {
        return f.display_name;
    }
    if let Some(m) = metric(key) {
        return m.display_name;
    }
    key
}
