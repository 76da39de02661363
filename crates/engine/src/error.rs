use std::fmt;

#[derive(Debug)]
pub enum EngineError {
    /// TOML parse / deserialization error.
    CatalogParse(String),
    /// Catalog validation error (bad layout, dangling reference, etc.).
    CatalogValidation(String),
    /// No client configuration with the given name or id.
    UnknownClient(String),
    /// Required columns absent from an uploaded verification file.
    MissingColumns { columns: Vec<String> },
    /// Standard fields a requested report/metric needs are not mapped.
    UnmappedFields { fields: Vec<String> },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CatalogParse(msg) => write!(f, "catalog parse error: {msg}"),
            Self::CatalogValidation(msg) => write!(f, "catalog validation error: {msg}"),
            Self::UnknownClient(name) => write!(f, "unknown client configuration: {name}"),
            Self::MissingColumns { columns } => {
                write!(f, "missing required columns: {}", columns.join(", "))
            }
            Self::UnmappedFields { fields } => {
                write!(f, "standard fields not mapped: {}", fields.join(", "))
            }
        }
    }
}

impl std::error::Error for EngineError {}
