use serde::{Deserialize, Serialize};

/// 图片来源配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// 允许选择的最大文件体积（字节）。
    pub max_file_size: u64,
    /// 预览缩略图单边最大像素。
    pub preview_max_dimension: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            preview_max_dimension: 512,
        }
    }
}
