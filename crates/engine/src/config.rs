use std::collections::HashMap;

use serde::Deserialize;

use crate::error::EngineError;
use crate::fields::{metric, standard_field};

// ---------------------------------------------------------------------------
// Top-level catalog
// ---------------------------------------------------------------------------

/// Everything the engine consumes from the persistence layer, as data at
/// rest: teams, categories, client configurations, classification rules, and
/// saved report layouts.
#[derive(Debug, Deserialize)]
pub struct Catalog {
    pub name: String,
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub configs: Vec<ClientConfig>,
    #[serde(default)]
    pub edit_rules: Vec<EditRule>,
    #[serde(default)]
    pub note_rules: Vec<NoteRule>,
    #[serde(default)]
    pub team_report_configs: Vec<TeamReportConfig>,
}

// ---------------------------------------------------------------------------
// Teams + categories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Team {
    pub id: i64,
    pub team_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    pub id: i64,
    pub category_name: String,
    #[serde(default)]
    pub team_id: Option<i64>,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub send_to_l1_monitor: bool,
}

// ---------------------------------------------------------------------------
// Client configurations
// ---------------------------------------------------------------------------

/// Per-client translation table from standard field key to actual header.
pub type ColumnMapping = HashMap<String, String>;

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub id: i64,
    pub config_name: String,
    pub config_data: ConfigData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigData {
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub column_mappings: ColumnMapping,
}

// ---------------------------------------------------------------------------
// Classification rules
// ---------------------------------------------------------------------------

/// Exact-match rule keyed on the claim's edit text.
#[derive(Debug, Clone, Deserialize)]
pub struct EditRule {
    pub config_id: i64,
    pub text: String,
    pub category_id: i64,
}

/// Substring-match rule keyed against the claim's notes text.
#[derive(Debug, Clone, Deserialize)]
pub struct NoteRule {
    pub config_id: i64,
    pub text: String,
    pub category_id: i64,
}

// ---------------------------------------------------------------------------
// Report layouts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct TeamReportConfig {
    pub id: i64,
    pub team_id: i64,
    pub category_id: i64,
    pub report_config_data: ReportLayout,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportLayout {
    pub source_config_id: i64,
    #[serde(default)]
    pub report_title: String,
    #[serde(default)]
    pub data_columns: Vec<String>,
    #[serde(default)]
    pub metrics: Vec<String>,
    #[serde(default)]
    pub group_by: Vec<String>,
}

// ---------------------------------------------------------------------------
// Parse + validate
// ---------------------------------------------------------------------------

impl Catalog {
    pub fn from_toml(input: &str) -> Result<Self, EngineError> {
        let catalog: Catalog =
            toml::from_str(input).map_err(|e| EngineError::CatalogParse(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        for category in &self.categories {
            if let Some(team_id) = category.team_id {
                if self.team_by_id(team_id).is_none() {
                    return Err(EngineError::CatalogValidation(format!(
                        "category '{}' references unknown team {team_id}",
                        category.category_name
                    )));
                }
            }
        }

        for trc in &self.team_report_configs {
            if self.team_by_id(trc.team_id).is_none() {
                return Err(EngineError::CatalogValidation(format!(
                    "report layout {} references unknown team {}",
                    trc.id, trc.team_id
                )));
            }
            if self.category_by_id(trc.category_id).is_none() {
                return Err(EngineError::CatalogValidation(format!(
                    "report layout {} references unknown category {}",
                    trc.id, trc.category_id
                )));
            }
            let source = self.client_by_id(trc.report_config_data.source_config_id).ok_or_else(|| {
                EngineError::CatalogValidation(format!(
                    "report layout {} references unknown source config {}",
                    trc.id, trc.report_config_data.source_config_id
                ))
            })?;
            validate_layout(&trc.report_config_data, &source.config_data.column_mappings)?;
        }

        Ok(())
    }

    pub fn team_by_id(&self, id: i64) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    pub fn category_by_id(&self, id: i64) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn client_by_id(&self, id: i64) -> Option<&ClientConfig> {
        self.configs.iter().find(|c| c.id == id)
    }

    pub fn client_by_name(&self, name: &str) -> Option<&ClientConfig> {
        self.configs.iter().find(|c| c.config_name == name)
    }

    /// A category's team name: the explicit override if present, else the
    /// joined team's name.
    pub fn category_team_name(&self, category: &Category) -> Option<String> {
        if let Some(ref name) = category.team_name {
            return Some(name.clone());
        }
        category
            .team_id
            .and_then(|id| self.team_by_id(id))
            .map(|t| t.team_name.clone())
    }

    pub fn edit_rules_for(&self, config_id: i64) -> impl Iterator<Item = &EditRule> {
        self.edit_rules.iter().filter(move |r| r.config_id == config_id)
    }

    pub fn note_rules_for(&self, config_id: i64) -> impl Iterator<Item = &NoteRule> {
        self.note_rules.iter().filter(move |r| r.config_id == config_id)
    }

    /// The custom report layout saved for a (team, category) pair, if any.
    pub fn report_config_for(&self, team_id: i64, category_id: i64) -> Option<&TeamReportConfig> {
        self.team_report_configs
            .iter()
            .find(|rc| rc.team_id == team_id && rc.category_id == category_id)
    }

    pub fn report_config_by_id(&self, id: i64) -> Option<&TeamReportConfig> {
        self.team_report_configs.iter().find(|rc| rc.id == id)
    }
}

/// Boundary checks the aggregation engine assumes:
/// columns exist, metrics imply grouping, grouping draws from the selected
/// columns, and every metric's required fields are mapped.
pub fn validate_layout(layout: &ReportLayout, mapping: &ColumnMapping) -> Result<(), EngineError> {
    for key in layout.data_columns.iter().chain(layout.group_by.iter()) {
        if standard_field(key).is_none() {
            return Err(EngineError::CatalogValidation(format!(
                "unknown standard field '{key}' in report layout"
            )));
        }
    }

    if layout.data_columns.is_empty() && layout.metrics.is_empty() {
        return Err(EngineError::CatalogValidation(
            "report layout selects no data columns and no metrics".into(),
        ));
    }
    if !layout.metrics.is_empty() && layout.group_by.is_empty() {
        return Err(EngineError::CatalogValidation(
            "report layout with metrics must group by at least one column".into(),
        ));
    }
    if !layout.group_by.is_empty() && layout.data_columns.is_empty() {
        return Err(EngineError::CatalogValidation(
            "report layout cannot group by columns outside its data columns".into(),
        ));
    }
    for key in &layout.group_by {
        if !layout.data_columns.contains(key) {
            return Err(EngineError::CatalogValidation(format!(
                "group-by column '{key}' is not among the layout's data columns"
            )));
        }
    }

    let mut unmapped: Vec<String> = Vec::new();
    for key in &layout.metrics {
        let m = metric(key).ok_or_else(|| {
            EngineError::CatalogValidation(format!("unknown metric '{key}' in report layout"))
        })?;
        for required in m.required {
            if !mapping.contains_key(*required) && !unmapped.contains(&required.to_string()) {
                unmapped.push(required.to_string());
            }
        }
    }
    if !unmapped.is_empty() {
        return Err(EngineError::UnmappedFields { fields: unmapped });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
