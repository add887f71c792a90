//! # 分析错误模型
//!
//! ## 设计思路
//!
//! 传输层的所有失败（网络、超时、非 2xx、响应体无法解析）统一为
//! `TransportFailure`，用 `FailureKind` 区分具体原因。原始错误细节只写日志，
//! 对终端用户只给出固定的通用提示。

use std::fmt;

use serde::Serialize;

/// 传输失败的具体原因。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "status", rename_all = "snake_case")]
pub enum FailureKind {
    Network,
    Timeout,
    HttpStatus(u16),
    MalformedResponse,
    /// 请求体无法构建（例如载荷 MIME 类型非法）。
    InvalidRequest,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "网络错误"),
            Self::Timeout => write!(f, "请求超时"),
            Self::HttpStatus(code) => write!(f, "HTTP {}", code),
            Self::MalformedResponse => write!(f, "响应格式错误"),
            Self::InvalidRequest => write!(f, "请求构建失败"),
        }
    }
}

/// 分析调用错误。
#[derive(Debug, Clone, thiserror::Error)]
pub enum AnalysisError {
    #[error("分析请求失败（{kind}）：{detail}")]
    TransportFailure { kind: FailureKind, detail: String },

    #[error("分析配置无效：{0}")]
    InvalidConfig(String),
}

impl AnalysisError {
    pub fn transport(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self::TransportFailure {
            kind,
            detail: detail.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::TransportFailure { .. } => "TRANSPORT_FAILURE",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
        }
    }

    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            Self::TransportFailure { kind, .. } => Some(*kind),
            Self::InvalidConfig(_) => None,
        }
    }
}

const USER_MESSAGE: &str =
    "Unable to reach the analysis service. Please check your connection and try again.";

/// 已脱敏的失败结果：保留分类，不含原始异常文本。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnalysisFailure {
    pub code: &'static str,
    pub kind: Option<FailureKind>,
}

impl AnalysisFailure {
    /// 面向终端用户的通用提示。
    pub fn user_message(&self) -> &'static str {
        USER_MESSAGE
    }
}

impl From<&AnalysisError> for AnalysisFailure {
    fn from(err: &AnalysisError) -> Self {
        Self {
            code: err.code(),
            kind: err.kind(),
        }
    }
}
