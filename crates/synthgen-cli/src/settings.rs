use std::path::Path;

use serde::{Deserialize, Serialize};
use synthgen_generate::GenerateOptions;

use crate::CliError;
use crate::logging::LogFormat;

/// Settings loaded from the optional `--config` TOML file.
///
/// ```toml
/// log_format = "json"
///
/// [generate]
/// record_count = 100
/// worker_count = 4
/// seed = 42
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log_format: LogFormat,
    pub generate: GenerateOptions,
}

pub fn load_settings(path: Option<&Path>) -> Result<Settings, CliError> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };
    let content = std::fs::read_to_string(path)?;
    let settings: Settings = toml::from_str(&content)?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let settings: Settings = toml::from_str("[generate]\nrecord_count = 12\n").expect("toml");
        assert_eq!(settings.generate.record_count, 12);
        assert_eq!(settings.generate.worker_count, 2);
        assert_eq!(settings.generate.delimiter, ",");
        assert_eq!(settings.log_format, LogFormat::Text);
    }
}
