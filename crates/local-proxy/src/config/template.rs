//! `--init`: write a starter scenarios file.

use super::ConfigError;
use std::path::{Path, PathBuf};

pub const TEMPLATE_FILE_NAME: &str = "scenarios.json";

/// Starter file with one enabled rule and two disabled ones.
pub const SCENARIOS_TEMPLATE: &str = include_str!("../../templates/scenarios.json");

/// Write the template into `dir`, refusing to overwrite an existing file.
pub fn init_template(dir: &Path) -> Result<PathBuf, ConfigError> {
    let path = dir.join(TEMPLATE_FILE_NAME);
    if path.exists() {
        return Err(ConfigError::TemplateExists(PathBuf::from(TEMPLATE_FILE_NAME)));
    }

    std::fs::write(&path, SCENARIOS_TEMPLATE).map_err(|source| ConfigError::TemplateWrite {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
