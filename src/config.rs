//! # 应用配置
//!
//! 各组件配置的聚合体。所有字段都有默认值，设置文件只需写想覆盖的部分。

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisConfig;
use crate::capture::CaptureConfig;
use crate::diagnosis::{ConfidenceBands, DiagnosisTable};
use crate::error::AppError;
use crate::source::SourceConfig;

/// 应用配置。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    pub capture: CaptureConfig,
    pub source: SourceConfig,
    /// 置信度分档阈值（仅影响展示）。
    pub presentation: ConfidenceBands,
    /// 替代诊断表路径，缺省使用内置表。
    pub diagnosis_table: Option<PathBuf>,
}

impl AppConfig {
    /// 范围校验，任何一项不合法即整体拒绝。
    pub fn validate(&self) -> Result<(), AppError> {
        let analysis = &self.analysis;
        let endpoint = reqwest::Url::parse(&analysis.endpoint)
            .map_err(|e| AppError::Config(format!("endpoint 无效：{}", e)))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(AppError::Config(format!(
                "endpoint 仅支持 http/https：{}",
                analysis.endpoint
            )));
        }
        if analysis.field_name.trim().is_empty() {
            return Err(AppError::Config("field_name 不能为空".to_string()));
        }
        if analysis.connect_timeout_secs == 0 {
            return Err(AppError::Config("connect_timeout_secs 必须大于 0".to_string()));
        }
        if analysis.request_timeout_secs == Some(0) {
            return Err(AppError::Config("request_timeout_secs 必须大于 0".to_string()));
        }

        let capture = &self.capture;
        if !(1..=100).contains(&capture.jpeg_quality) {
            return Err(AppError::Config(format!(
                "jpeg_quality 必须在 1~100 之间：{}",
                capture.jpeg_quality
            )));
        }
        if capture.ideal_width == 0 || capture.ideal_height == 0 {
            return Err(AppError::Config("理想分辨率必须大于 0".to_string()));
        }

        if self.source.max_file_size == 0 {
            return Err(AppError::Config("max_file_size 必须大于 0".to_string()));
        }
        if self.source.preview_max_dimension == 0 {
            return Err(AppError::Config("preview_max_dimension 必须大于 0".to_string()));
        }

        self.presentation.validate().map_err(AppError::Config)?;
        Ok(())
    }

    /// 加载诊断表：配置了路径则读文件，否则使用内置表。
    pub fn load_table(&self) -> Result<DiagnosisTable, AppError> {
        match &self.diagnosis_table {
            Some(path) => Ok(DiagnosisTable::from_path(path)?),
            None => Ok(DiagnosisTable::builtin()),
        }
    }
}
