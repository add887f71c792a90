//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 各组件保留自己的错误枚举（`CaptureError` / `SourceError` / `AnalysisError` /
//! `TableError`），在服务边界统一汇总为 `AppError`，宿主界面只需处理一种类型。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息，并为各组件错误提供 `From` 转换。
//! - 实现 `Serialize` 将错误序列化为字符串，宿主可原样转发。
//! - `code()` 给出稳定的机器可读错误码。

use serde::Serialize;

use crate::analysis::AnalysisError;
use crate::capture::CaptureError;
use crate::diagnosis::TableError;
use crate::source::SourceError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 摄像头采集失败（权限、设备、编码）
    #[error("{0}")]
    Capture(#[from] CaptureError),

    /// 图片来源校验失败
    #[error("{0}")]
    Source(#[from] SourceError),

    /// 分析请求失败
    #[error("{0}")]
    Analysis(#[from] AnalysisError),

    /// 诊断表加载失败
    #[error("{0}")]
    Table(#[from] TableError),

    /// 配置无效
    #[error("配置无效: {0}")]
    Config(String),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Capture(e) => e.code(),
            Self::Source(e) => e.code(),
            Self::Analysis(e) => e.code(),
            Self::Table(_) => "INVALID_TABLE",
            Self::Config(_) => "INVALID_CONFIG",
            Self::Io(_) => "FILE_SYSTEM",
        }
    }
}

/// 将错误序列化为人类可读的字符串。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_errors_keep_their_codes() {
        let err: AppError = CaptureError::DeviceUnavailable("permission denied".into()).into();
        assert_eq!(err.code(), "DEVICE_UNAVAILABLE");

        let err: AppError = SourceError::UnsupportedType("text/plain".into()).into();
        assert_eq!(err.code(), "UNSUPPORTED_TYPE");
    }

    #[test]
    fn serializes_as_message_string() {
        let err = AppError::Config("jpeg_quality 必须在 1~100 之间".into());

        let json = serde_json::to_string(&err).expect("error should serialize");

        assert_eq!(json, "\"配置无效: jpeg_quality 必须在 1~100 之间\"");
    }
}
