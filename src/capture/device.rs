//! # 设备抽象
//!
//! ## 设计思路
//!
//! 摄像头 API 属于外部协作方：这里只定义“按约束取流 / 读帧 / 停止全部轨道”
//! 三个能力，具体后端（浏览器桥接、V4L、测试脚本）各自实现。
//! 流句柄只会被 `CaptureManager` 持有，其他模块拿不到。

use serde::{Deserialize, Serialize};

use super::CaptureError;

/// 摄像头朝向。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    /// 前置（面向用户）。
    Front,
    /// 后置（面向环境）。
    Rear,
}

impl Facing {
    /// 切换到相反朝向。
    pub fn opposite(self) -> Self {
        match self {
            Self::Front => Self::Rear,
            Self::Rear => Self::Front,
        }
    }

    /// 对应 `facingMode` 约束的取值。
    pub fn facing_mode(self) -> &'static str {
        match self {
            Self::Front => "user",
            Self::Rear => "environment",
        }
    }

    /// 从外部字符串解析朝向，兼容 `facingMode` 写法。
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "front" | "user" => Some(Self::Front),
            "rear" | "back" | "environment" => Some(Self::Rear),
            _ => None,
        }
    }
}

/// 取流约束：仅视频，带朝向与理想分辨率提示。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConstraints {
    pub facing: Facing,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

/// 从视频流采样得到的一帧 RGBA 像素。
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    /// RGBA 字节（`width * height * 4`）。
    pub rgba: Vec<u8>,
}

/// 已授予的视频流。
///
/// `stop_all_tracks` 必须幂等：会话在显式停止和 `Drop` 时都可能调用它。
pub trait VideoStream: Send {
    /// 设备实际授予的分辨率，可能与理想值不同。
    fn granted_resolution(&self) -> (u32, u32);

    /// 同步采样当前帧。
    fn read_frame(&mut self) -> Result<VideoFrame, CaptureError>;

    /// 停止底层全部轨道。
    fn stop_all_tracks(&mut self);
}

/// 摄像头设备。
///
/// 取流是一个挂起点（等待权限授予），因此是异步的。
#[allow(async_fn_in_trait)]
pub trait CameraDevice: Send + Sync {
    type Stream: VideoStream;

    /// 按约束申请一条独占视频流；权限拒绝或无设备时返回 `DeviceUnavailable`。
    async fn open_stream(&self, constraints: &StreamConstraints)
        -> Result<Self::Stream, CaptureError>;
}

/// 没有任何摄像头后端时使用的设备，所有取流请求都会失败。
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableCamera;

/// 不可能存在的流类型。
#[derive(Debug)]
pub enum NoStream {}

impl VideoStream for NoStream {
    fn granted_resolution(&self) -> (u32, u32) {
        match *self {}
    }

    fn read_frame(&mut self) -> Result<VideoFrame, CaptureError> {
        match *self {}
    }

    fn stop_all_tracks(&mut self) {
        match *self {}
    }
}

impl CameraDevice for UnavailableCamera {
    type Stream = NoStream;

    async fn open_stream(&self, _constraints: &StreamConstraints) -> Result<NoStream, CaptureError> {
        Err(CaptureError::DeviceUnavailable(
            "当前环境没有可用的摄像头".to_string(),
        ))
    }
}
