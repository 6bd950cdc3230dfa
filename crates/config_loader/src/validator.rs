//! 配置校验
//!
//! 规则:
//! - account username is non-empty
//! - update_interval_secs > 0
//! - 0 < historical_period_days <= MAX_HISTORICAL_PERIOD_DAYS
//! - local_tz is a known IANA zone
//! - sensor names are non-empty and unique

use std::collections::HashSet;

use contracts::{ContractError, CoordinatorBlueprint};

/// 历史窗口上限（约十年）
pub const MAX_HISTORICAL_PERIOD_DAYS: u32 = 3650;

/// 校验 blueprint
///
/// 返回遇到的第一个错误。
pub fn validate(blueprint: &CoordinatorBlueprint) -> Result<(), ContractError> {
    validate_account(blueprint)?;
    validate_coordinator(blueprint)?;
    validate_sensors(blueprint)?;
    Ok(())
}

fn validate_account(blueprint: &CoordinatorBlueprint) -> Result<(), ContractError> {
    if blueprint.account.username.trim().is_empty() {
        return Err(ContractError::config_validation(
            "account.username",
            "username must not be empty",
        ));
    }
    if blueprint
        .account
        .contract
        .as_deref()
        .is_some_and(|contract| contract.trim().is_empty())
    {
        return Err(ContractError::config_validation(
            "account.contract",
            "contract must not be empty when set",
        ));
    }
    Ok(())
}

fn validate_coordinator(blueprint: &CoordinatorBlueprint) -> Result<(), ContractError> {
    let coordinator = &blueprint.coordinator;

    if coordinator.update_interval_secs == 0 {
        return Err(ContractError::config_validation(
            "coordinator.update_interval_secs",
            "update_interval_secs must be > 0",
        ));
    }

    if coordinator.historical_period_days == 0 {
        return Err(ContractError::config_validation(
            "coordinator.historical_period_days",
            "historical_period_days must be > 0",
        ));
    }

    // 过大的窗口会让起点越出可表示的时间范围
    if coordinator.historical_period_days > MAX_HISTORICAL_PERIOD_DAYS {
        return Err(ContractError::config_validation(
            "coordinator.historical_period_days",
            format!("historical_period_days must be <= {MAX_HISTORICAL_PERIOD_DAYS}"),
        ));
    }

    coordinator.local_tz().map_err(|e| {
        ContractError::config_validation("coordinator.local_tz", e.to_string())
    })?;

    Ok(())
}

fn validate_sensors(blueprint: &CoordinatorBlueprint) -> Result<(), ContractError> {
    // 传感器名称必须唯一
    let mut seen = HashSet::new();
    for (index, sensor) in blueprint.sensors.iter().enumerate() {
        if sensor.name.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("sensors[{index}].name"),
                "sensor name must not be empty",
            ));
        }
        if !seen.insert(sensor.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sensors[name={}]", sensor.name),
                "duplicate sensor name",
            ));
        }
    }
    Ok(())
}
