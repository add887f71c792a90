//! # 采集错误模型
//!
//! 摄像头链路的所有失败都收敛到 `CaptureError`，调用侧按分支匹配，
//! 不依赖字符串判断。

/// 摄像头采集错误。
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// 权限被拒绝或设备不存在。必须呈现给用户，不能吞掉。
    #[error("摄像头不可用：{0}")]
    DeviceUnavailable(String),

    /// 上一次拍照仍在编码中。
    #[error("正在拍照，请稍候")]
    CaptureInProgress,

    /// 当前没有处于活动状态的采集会话。
    #[error("摄像头未开启")]
    NotActive,

    /// 启动过程中会话已被停止，新获得的流已立即释放。
    #[error("摄像头启动已被取消")]
    Aborted,

    /// 读帧或压缩编码失败。
    #[error("拍照失败：{0}")]
    Encode(String),
}

impl CaptureError {
    /// 稳定的错误码，供宿主界面做分支展示。
    pub fn code(&self) -> &'static str {
        match self {
            Self::DeviceUnavailable(_) => "DEVICE_UNAVAILABLE",
            Self::CaptureInProgress => "CAPTURE_IN_PROGRESS",
            Self::NotActive => "CAPTURE_NOT_ACTIVE",
            Self::Aborted => "CAPTURE_ABORTED",
            Self::Encode(_) => "CAPTURE_ENCODE_FAILED",
        }
    }
}
