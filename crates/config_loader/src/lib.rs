//! # Config Loader
//!
//! Turns session configuration text (TOML, or JSON) into a validated
//! [`SessionBlueprint`]. Validation covers the synchronization tuning, the
//! projection anchor and the sink declarations.
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("session.toml")).unwrap();
//! println!("{} sinks, map: {:?}", blueprint.sinks.len(), blueprint.map);
//! ```

mod parser;
mod validator;

pub use contracts::SessionBlueprint;
pub use parser::ConfigFormat;
pub use validator::{validate_map_anchor, MAX_MERCATOR_LATITUDE};

use contracts::ContractError;
use std::path::Path;
use tracing::{debug, info};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a session file; the format follows the extension
    pub fn load_from_path(path: &Path) -> Result<SessionBlueprint, ContractError> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        let blueprint = Self::load_from_str(&content, format)?;
        info!(
            path = %path.display(),
            session = %blueprint.name,
            map = blueprint.map.is_some(),
            sinks = blueprint.sinks.len(),
            "session configuration loaded"
        );
        Ok(blueprint)
    }

    /// Parse and validate session text
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<SessionBlueprint, ContractError> {
        let blueprint = format.parse(content)?;
        validator::validate(&blueprint)
            .inspect_err(|e| debug!(format = format.name(), error = %e, "session rejected"))?;
        Ok(blueprint)
    }

    pub fn to_toml(blueprint: &SessionBlueprint) -> Result<String, ContractError> {
        ConfigFormat::Toml.render(blueprint)
    }

    pub fn to_json(blueprint: &SessionBlueprint) -> Result<String, ContractError> {
        ConfigFormat::Json.render(blueprint)
    }
}
