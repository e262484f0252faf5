//! Session config syntax: TOML (primary) and JSON.

use std::path::Path;

use contracts::{ContractError, SessionBlueprint};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Infer format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Format implied by a file path; a missing extension is unsupported
    pub fn from_path(path: &Path) -> Result<Self, ContractError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Self::from_extension(extension).ok_or_else(|| ContractError::UnsupportedFormat {
            extension: extension.to_string(),
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
        }
    }

    /// Deserialize a blueprint; field defaults come from the serde attributes
    pub fn parse(self, content: &str) -> Result<SessionBlueprint, ContractError> {
        match self {
            Self::Toml => toml::from_str(content).map_err(|e| malformed(self, e)),
            Self::Json => serde_json::from_str(content).map_err(|e| malformed(self, e)),
        }
    }

    /// Serialize a blueprint in this format
    pub fn render(self, blueprint: &SessionBlueprint) -> Result<String, ContractError> {
        match self {
            Self::Toml => toml::to_string_pretty(blueprint).map_err(|e| malformed(self, e)),
            Self::Json => serde_json::to_string_pretty(blueprint).map_err(|e| malformed(self, e)),
        }
    }
}

fn malformed<E>(format: ConfigFormat, err: E) -> ContractError
where
    E: std::error::Error + Send + Sync + 'static,
{
    ContractError::MalformedConfig {
        format: format.name(),
        message: err.to_string(),
        source: Some(Box::new(err)),
    }
}
