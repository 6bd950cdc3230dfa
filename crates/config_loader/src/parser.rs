//! 配置解析
//!
//! 支持 TOML (主要) 和 JSON。

use contracts::{ContractError, CoordinatorBlueprint};
use serde::de::DeserializeOwned;

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (推荐)
    Toml,
    Json,
}

impl ConfigFormat {
    /// 根据文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

fn from_toml<T: DeserializeOwned>(content: &str) -> Result<T, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

fn from_json<T: DeserializeOwned>(content: &str) -> Result<T, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 blueprint，不做校验
pub fn parse(content: &str, format: ConfigFormat) -> Result<CoordinatorBlueprint, ContractError> {
    match format {
        ConfigFormat::Toml => from_toml(content),
        ConfigFormat::Json => from_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SensorKind;

    #[test]
    fn test_parse_toml_applies_defaults() {
        let content = r#"
[account]
username = "user@example.com"
"#;
        let bp = parse(content, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.account.username, "user@example.com");
        assert_eq!(bp.account.contract, None);
        assert_eq!(bp.coordinator.update_interval_secs, 30);
        assert_eq!(bp.coordinator.local_tz, "Europe/Madrid");
        assert_eq!(bp.coordinator.historical_period_days, 7);
        assert!(bp.barriers.measure.is_none());
        assert!(bp.sensors.is_empty());
    }

    #[test]
    fn test_parse_json() {
        let content = r#"{
            "account": { "username": "user", "contract": "42" },
            "barriers": { "measure": { "min_interval_secs": 300 } },
            "sensors": [{ "name": "power", "kind": "instant_power" }]
        }"#;
        let bp = parse(content, ConfigFormat::Json).unwrap();
        assert_eq!(bp.barriers.measure.unwrap().min_interval_secs, 300);
        assert_eq!(bp.sensors[0].kind, SensorKind::InstantPower);
    }

    #[test]
    fn test_unknown_barrier_dataset_is_rejected() {
        let content = r#"
[account]
username = "user"

[barriers.measures]
min_interval_secs = 300
"#;
        let err = parse(content, ConfigFormat::Toml).unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_unknown_sensor_kind_is_rejected() {
        let content = r#"
[account]
username = "user"

[[sensors]]
name = "x"
kind = "voltage"
"#;
        assert!(parse(content, ConfigFormat::Toml).is_err());
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let err = parse("invalid toml [[[", ConfigFormat::Toml).unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { source: Some(_), .. }));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
