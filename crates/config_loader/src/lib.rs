//! # Config Loader
//!
//! Loads and validates `CoordinatorBlueprint` from TOML or JSON.
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("coordinator.toml")).unwrap();
//! println!("Account: {}", blueprint.account.label());
//! ```

mod parser;
mod validator;

pub use contracts::CoordinatorBlueprint;
pub use parser::ConfigFormat;
pub use validator::MAX_HISTORICAL_PERIOD_DAYS;

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from a file; the format follows the extension (.toml / .json)
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<CoordinatorBlueprint, ContractError> {
        let format = Self::detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load from a string
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<CoordinatorBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    pub fn to_toml(blueprint: &CoordinatorBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    pub fn to_json(blueprint: &CoordinatorBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }

    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{DatasetKind, SensorKind};
    use std::io::Write;

    const FULL_TOML: &str = r#"
[account]
username = "user@example.com"
contract = "123456789"

[coordinator]
update_interval_secs = 60
local_tz = "Atlantic/Canary"
historical_period_days = 3
fetch_timeout_secs = 0

[barriers.measure]
min_interval_secs = 300

[barriers.historical_consumption]
min_interval_secs = 21600

[[sensors]]
name = "accumulated-consumption"
kind = "accumulated_consumption"

[[sensors]]
name = "historical-consumption"
kind = "historical_consumption"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let bp = ConfigLoader::load_from_str(FULL_TOML, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.account.label(), "user@example.com/123456789");
        assert_eq!(bp.coordinator.local_tz, "Atlantic/Canary");
        assert!(bp.coordinator.local_tz().is_ok());
        assert_eq!(bp.coordinator.fetch_timeout(), None);
        assert_eq!(
            bp.barriers.gated(),
            DatasetKind::MEASURE | DatasetKind::HISTORICAL_CONSUMPTION
        );
        assert_eq!(bp.sensors[0].kind, SensorKind::AccumulatedConsumption);
        assert_eq!(bp.required_datasets(), bp.barriers.gated());
    }

    #[test]
    fn test_round_trip_toml() {
        let bp = ConfigLoader::load_from_str(FULL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.account.label(), bp2.account.label());
        assert_eq!(bp.barriers.gated(), bp2.barriers.gated());
        assert_eq!(bp.sensors.len(), bp2.sensors.len());
    }

    #[test]
    fn test_toml_to_json() {
        let bp = ConfigLoader::load_from_str(FULL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(bp.coordinator.local_tz, bp2.coordinator.local_tz);
        assert_eq!(
            bp2.barriers.historical_consumption.unwrap().min_interval_secs,
            21600
        );
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[account]
username = "user"

[coordinator]
update_interval_secs = 0
"#;
        let err = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap_err();
        assert!(matches!(err, ContractError::ConfigValidation { .. }));
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(FULL_TOML.as_bytes()).unwrap();

        let bp = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(bp.sensors.len(), 2);
    }

    #[test]
    fn test_load_from_path_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConfigLoader::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn test_load_from_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigLoader::load_from_path(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ContractError::Io(_)));
    }
}
