//! # 图片来源错误模型

/// 图片来源解析错误。
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// 声明类型不是图片。
    #[error("不支持的文件类型：{0}")]
    UnsupportedType(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    /// 预览生成失败（内部使用，调用方会回退为原始字节预览）。
    #[error("预览生成失败：{0}")]
    Decode(String),
}

impl SourceError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedType(_) => "UNSUPPORTED_TYPE",
            Self::FileSystem(_) => "FILE_SYSTEM",
            Self::ResourceLimit(_) => "RESOURCE_LIMIT",
            Self::Decode(_) => "PREVIEW_DECODE",
        }
    }
}
