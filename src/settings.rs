//! # 设置文件
//!
//! JSON 设置文件（字段均可省略）+ 环境变量覆盖，加载后统一校验。

use std::fs;
use std::path::Path;

use crate::config::AppConfig;
use crate::error::AppError;

/// 覆盖分类接口地址的环境变量。
pub const ENDPOINT_ENV: &str = "LEAF_DIAGNOSIS_ENDPOINT";

/// 加载设置：文件（可选）→ 环境变量覆盖 → 校验。
pub fn load_settings(path: Option<&Path>) -> Result<AppConfig, AppError> {
    load_settings_with(path, std::env::var(ENDPOINT_ENV).ok())
}

pub(crate) fn load_settings_with(
    path: Option<&Path>,
    endpoint_override: Option<String>,
) -> Result<AppConfig, AppError> {
    let mut config = match path {
        Some(path) => read_settings_file(path)?,
        None => AppConfig::default(),
    };

    if let Some(endpoint) = endpoint_override.filter(|v| !v.trim().is_empty()) {
        log::info!("🔧 使用环境变量 {} 覆盖分类接口地址", ENDPOINT_ENV);
        config.analysis.endpoint = endpoint.trim().to_string();
    }

    config.validate()?;
    Ok(config)
}

fn read_settings_file(path: &Path) -> Result<AppConfig, AppError> {
    if !path.exists() {
        return Err(AppError::Config(format!("设置文件不存在：{}", path.display())));
    }

    let content = fs::read_to_string(path)?;
    let config = serde_json::from_str::<AppConfig>(&content)
        .map_err(|e| AppError::Config(format!("解析设置文件失败: {}", e)))?;

    log::info!("⚙️ 已加载设置文件 - {}", path.display());
    Ok(config)
}
