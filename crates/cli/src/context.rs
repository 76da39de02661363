//! Shared command plumbing: catalog + client + dataset loading.

use std::path::Path;

use claimflow_engine::config::{Catalog, ClientConfig};
use claimflow_engine::{EngineError, RawRecord, RuleIndex};

use crate::exit_codes::{
    EXIT_DATA_PARSE, EXIT_ERROR, EXIT_INVALID_CATALOG, EXIT_MISSING_COLUMNS, EXIT_USAGE,
};
use crate::CliError;

pub fn engine_error(err: EngineError) -> CliError {
    let code = match err {
        EngineError::CatalogParse(_) | EngineError::CatalogValidation(_) => EXIT_INVALID_CATALOG,
        EngineError::UnknownClient(_) => EXIT_USAGE,
        EngineError::MissingColumns { .. } | EngineError::UnmappedFields { .. } => {
            EXIT_MISSING_COLUMNS
        }
    };
    CliError { code, message: err.to_string(), hint: None }
}

pub fn load_catalog(path: &Path) -> Result<Catalog, CliError> {
    let input = std::fs::read_to_string(path).map_err(|e| CliError {
        code: EXIT_USAGE,
        message: format!("cannot read catalog {}: {e}", path.display()),
        hint: None,
    })?;
    Catalog::from_toml(&input).map_err(engine_error)
}

pub fn find_client<'a>(catalog: &'a Catalog, name: &str) -> Result<&'a ClientConfig, CliError> {
    catalog.client_by_name(name).ok_or_else(|| {
        let known: Vec<&str> = catalog.configs.iter().map(|c| c.config_name.as_str()).collect();
        CliError {
            code: EXIT_USAGE,
            message: format!("unknown client configuration: {name}"),
            hint: if known.is_empty() {
                None
            } else {
                Some(format!("known configurations: {}", known.join(", ")))
            },
        }
    })
}

pub fn load_records(path: &Path) -> Result<Vec<RawRecord>, CliError> {
    claimflow_io::read_records(path).map_err(|message| CliError {
        code: EXIT_DATA_PARSE,
        message,
        hint: None,
    })
}

/// Everything the analysis commands need for one run.
pub struct RunContext {
    pub catalog: Catalog,
    pub client_name: String,
    pub mapping: claimflow_engine::ColumnMapping,
    pub index: RuleIndex,
}

pub fn load_run_context(catalog_path: &Path, client: &str) -> Result<RunContext, CliError> {
    let catalog = load_catalog(catalog_path)?;
    let config = find_client(&catalog, client)?;
    let client_name = if config.config_data.client_name.is_empty() {
        config.config_name.clone()
    } else {
        config.config_data.client_name.clone()
    };
    let mapping = config.config_data.column_mappings.clone();
    let index = RuleIndex::build(&catalog, config.id);
    Ok(RunContext { catalog, client_name, mapping, index })
}

pub fn write_error(message: String) -> CliError {
    CliError { code: EXIT_ERROR, message, hint: None }
}
