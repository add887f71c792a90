//! # 采集配置
//!
//! 期望分辨率只是“理想值”，设备可以授予更低的分辨率，管理器照单全收。

use serde::{Deserialize, Serialize};

use super::device::{Facing, StreamConstraints};

/// 摄像头采集配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// 理想宽度（像素）。
    pub ideal_width: u32,
    /// 理想高度（像素）。
    pub ideal_height: u32,
    /// 首次开启摄像头时的朝向。
    pub default_facing: Facing,
    /// JPEG 压缩质量（1~100）。
    pub jpeg_quality: u8,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            ideal_width: 1920,
            ideal_height: 1080,
            default_facing: Facing::Rear,
            jpeg_quality: 95,
        }
    }
}

impl CaptureConfig {
    /// 生成一次取流请求的约束。
    pub fn constraints(&self, facing: Facing) -> StreamConstraints {
        StreamConstraints {
            facing,
            ideal_width: self.ideal_width,
            ideal_height: self.ideal_height,
        }
    }
}
