//! # 分析请求配置

use serde::{Deserialize, Serialize};

/// 远端分类服务配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// 分类接口地址。
    pub endpoint: String,
    /// multipart 表单中图片字段名。
    pub field_name: String,
    /// 建连超时（秒）。
    pub connect_timeout_secs: u64,
    /// 整体请求超时（秒）。`None` 表示不设上限，由远端自行超时。
    pub request_timeout_secs: Option<u64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:5000/predict".to_string(),
            field_name: "file".to_string(),
            connect_timeout_secs: 8,
            request_timeout_secs: None,
        }
    }
}
