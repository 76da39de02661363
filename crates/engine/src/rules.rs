use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::config::{Catalog, ColumnMapping};
use crate::record::{resolve, RawRecord};

// ---------------------------------------------------------------------------
// Rule index
// ---------------------------------------------------------------------------

/// What a matched rule assigns to a claim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleTarget {
    pub category_id: i64,
    pub category: String,
    pub team_id: Option<i64>,
    pub team_name: Option<String>,
    pub send_to_l1_monitor: bool,
}

/// In-memory lookup structures for one client's classification rules.
///
/// Edit rules are an exact-match map on trimmed rule text (last write wins
/// on duplicate text). Note rules stay in configuration order and are walked
/// longest-text-first at classification time, so the most specific keyword
/// wins when several are substrings of the same notes.
#[derive(Debug, Clone, Default)]
pub struct RuleIndex {
    edit: HashMap<String, RuleTarget>,
    notes: Vec<(String, RuleTarget)>,
}

impl RuleIndex {
    /// Build the index for one client configuration. Rules pointing at a
    /// category that no longer exists are dropped.
    pub fn build(catalog: &Catalog, config_id: i64) -> Self {
        let target_for = |category_id: i64| -> Option<RuleTarget> {
            let category = catalog.category_by_id(category_id)?;
            Some(RuleTarget {
                category_id: category.id,
                category: category.category_name.clone(),
                team_id: category.team_id,
                team_name: catalog.category_team_name(category),
                send_to_l1_monitor: category.send_to_l1_monitor,
            })
        };

        let mut edit = HashMap::new();
        for rule in catalog.edit_rules_for(config_id) {
            if let Some(target) = target_for(rule.category_id) {
                edit.insert(rule.text.trim().to_string(), target);
            }
        }

        let mut notes = Vec::new();
        for rule in catalog.note_rules_for(config_id) {
            if let Some(target) = target_for(rule.category_id) {
                notes.push((rule.text.clone(), target));
            }
        }

        Self { edit, notes }
    }

    pub fn is_empty(&self) -> bool {
        self.edit.is_empty() && self.notes.is_empty()
    }

    pub fn edit_rule(&self, text: &str) -> Option<&RuleTarget> {
        self.edit.get(text)
    }

    /// Note rules sorted by text length descending. The sort is stable, so
    /// equal-length rules keep their configuration order.
    fn notes_longest_first(&self) -> Vec<&(String, RuleTarget)> {
        let mut rules: Vec<&(String, RuleTarget)> = self.notes.iter().collect();
        rules.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        rules
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchSource {
    #[serde(rename = "Edit Rule")]
    EditRule,
    #[serde(rename = "Note Rule")]
    NoteRule,
    Default,
}

impl fmt::Display for MatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EditRule => write!(f, "Edit Rule"),
            Self::NoteRule => write!(f, "Note Rule"),
            Self::Default => write!(f, "Default"),
        }
    }
}

/// Outcome of classifying one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub category_id: Option<i64>,
    pub category: String,
    pub team_id: Option<i64>,
    pub team_name: Option<String>,
    pub send_to_l1_monitor: bool,
    pub source: MatchSource,
}

impl Classification {
    fn from_target(target: &RuleTarget, source: MatchSource) -> Self {
        Self {
            category_id: Some(target.category_id),
            category: target.category.clone(),
            team_id: target.team_id,
            team_name: target.team_name.clone(),
            send_to_l1_monitor: target.send_to_l1_monitor,
            source,
        }
    }

    fn default_category() -> Self {
        Self {
            category_id: None,
            category: "Needs Triage".into(),
            team_id: None,
            team_name: Some("Needs Assignment".into()),
            send_to_l1_monitor: false,
            source: MatchSource::Default,
        }
    }
}

/// Resolve one record to a category. Total: absence of data degrades to the
/// default category, never an error.
pub fn classify(record: &RawRecord, mapping: &ColumnMapping, index: &RuleIndex) -> Classification {
    // Edit rules always take precedence over note rules.
    if let Some(value) = resolve(record, mapping, "edit") {
        let edit = value.to_display();
        let edit = edit.trim();
        if !edit.is_empty() {
            if let Some(target) = index.edit_rule(edit) {
                return Classification::from_target(target, MatchSource::EditRule);
            }
        }
    }

    let notes = resolve(record, mapping, "notes")
        .map(|v| v.to_display().to_lowercase())
        .unwrap_or_default();
    if !notes.is_empty() {
        for (text, target) in index.notes_longest_first() {
            if notes.contains(text.as_str()) {
                return Classification::from_target(target, MatchSource::NoteRule);
            }
        }
    }

    Classification::default_category()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CellValue;

    fn catalog(edit_rules: &[(&str, i64)], note_rules: &[(&str, i64)]) -> Catalog {
        let mut toml = String::from(
            r#"
name = "Rules Test"

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
category_name = "Pending Review"
team_id = 2
send_to_l1_monitor = true

[[configs]]
id = 100
config_name = "Acme"
[configs.config_data]
client_name = "Acme"
[configs.config_data.column_mappings]
edit = "Edit"
notes = "Notes"
"#,
        );
        for (text, category_id) in edit_rules {
            toml.push_str(&format!(
                "\n[[edit_rules]]\nconfig_id = 100\ntext = \"{text}\"\ncategory_id = {category_id}\n"
            ));
        }
        for (text, category_id) in note_rules {
            toml.push_str(&format!(
                "\n[[note_rules]]\nconfig_id = 100\ntext = \"{text}\"\ncategory_id = {category_id}\n"
            ));
        }
        Catalog::from_toml(&toml).unwrap()
    }

    fn mapping() -> ColumnMapping {
        [("edit", "Edit"), ("notes", "Notes")]
            .iter()
            .map(|(k, h)| (k.to_string(), h.to_string()))
            .collect()
    }

    fn record(edit: &str, notes: &str) -> RawRecord {
        let mut rec = RawRecord::new();
        if !edit.is_empty() {
            rec.insert("Edit".into(), CellValue::Text(edit.into()));
        }
        if !notes.is_empty() {
            rec.insert("Notes".into(), CellValue::Text(notes.into()));
        }
        rec
    }

    #[test]
    fn edit_rule_takes_precedence_over_note_rule() {
        let catalog = catalog(&[("W9 REQUIRED", 10)], &[("pending", 11)]);
        let index = RuleIndex::build(&catalog, 100);
        let c = classify(&record("W9 REQUIRED", "claim is pending"), &mapping(), &index);
        assert_eq!(c.category, "W9 Needed");
        assert_eq!(c.source, MatchSource::EditRule);
        assert_eq!(c.team_name.as_deref(), Some("Provider Operations"));
    }

    #[test]
    fn edit_text_is_trimmed_for_exact_match() {
        let catalog = catalog(&[("W9 REQUIRED", 10)], &[]);
        let index = RuleIndex::build(&catalog, 100);
        let c = classify(&record("  W9 REQUIRED  ", ""), &mapping(), &index);
        assert_eq!(c.source, MatchSource::EditRule);
    }

    #[test]
    fn longest_note_keyword_wins() {
        let catalog = catalog(&[], &[("pending", 10), ("pending review", 11)]);
        let index = RuleIndex::build(&catalog, 100);
        let c = classify(&record("", "claim is pending review"), &mapping(), &index);
        assert_eq!(c.category, "Pending Review");
        assert_eq!(c.source, MatchSource::NoteRule);
    }

    #[test]
    fn note_match_is_case_insensitive_on_notes() {
        let catalog = catalog(&[], &[("pending", 11)]);
        let index = RuleIndex::build(&catalog, 100);
        let c = classify(&record("", "Claim Is PENDING"), &mapping(), &index);
        assert_eq!(c.category, "Pending Review");
        assert!(c.send_to_l1_monitor);
    }

    #[test]
    fn no_match_degrades_to_default() {
        let catalog = catalog(&[("W9 REQUIRED", 10)], &[("cob", 11)]);
        let index = RuleIndex::build(&catalog, 100);
        let c = classify(&record("OTHER EDIT", "routine notes"), &mapping(), &index);
        assert_eq!(c.category, "Needs Triage");
        assert_eq!(c.team_name.as_deref(), Some("Needs Assignment"));
        assert_eq!(c.source, MatchSource::Default);
        assert!(!c.send_to_l1_monitor);
    }

    #[test]
    fn empty_record_classifies_without_error() {
        let catalog = catalog(&[], &[]);
        let index = RuleIndex::build(&catalog, 100);
        let c = classify(&RawRecord::new(), &mapping(), &index);
        assert_eq!(c.source, MatchSource::Default);
    }

    #[test]
    fn rule_for_deleted_category_is_dropped() {
        let mut catalog = catalog(&[("ORPHANED", 10)], &[("orphan note", 10)]);
        catalog.categories.retain(|c| c.id != 10);
        let index = RuleIndex::build(&catalog, 100);
        assert!(index.is_empty());
        let c = classify(&record("ORPHANED", "orphan note"), &mapping(), &index);
        assert_eq!(c.source, MatchSource::Default);
    }

    #[test]
    fn duplicate_edit_text_last_write_wins() {
        let catalog = catalog(&[("DUP", 10), ("DUP", 11)], &[]);
        let index = RuleIndex::build(&catalog, 100);
        let c = classify(&record("DUP", ""), &mapping(), &index);
        assert_eq!(c.category, "Pending Review");
    }

    #[test]
    fn rules_scoped_to_config_id() {
        let mut catalog = catalog(&[("W9 REQUIRED", 10)], &[]);
        for rule in &mut catalog.edit_rules {
            rule.config_id = 999;
        }
        let index = RuleIndex::build(&catalog, 100);
        assert!(index.is_empty());
    }
}
