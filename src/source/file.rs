//! # 输入文件模型
//!
//! `ImageFile` 对应宿主界面交给我们的“文件”：名称、声明类型、字节。
//! 文件选择器、拖放、拍照三条路径都先产出它，再交给解析器统一处理。

use std::path::Path;

use bytes::Bytes;

use super::SourceError;

/// 一个待选中的文件。
#[derive(Debug, Clone)]
pub struct ImageFile {
    /// 文件名（用于上传时的 multipart 文件名）。
    pub name: String,
    /// 声明的 MIME 类型；未知时为 `None`。
    pub declared_type: Option<String>,
    /// 原始字节。
    pub bytes: Bytes,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, declared_type: Option<&str>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.map(str::to_string),
            bytes: bytes.into(),
        }
    }

    /// 从本地路径读取文件，声明类型通过文件签名推断。
    pub fn from_path(path: impl AsRef<Path>, max_file_size: u64) -> Result<Self, SourceError> {
        let path = path.as_ref();
        log::info!("📁 读取本地图片 - 路径: {}", path.display());

        if !path.exists() {
            return Err(SourceError::FileSystem(format!("文件不存在：{}", path.display())));
        }

        let metadata = std::fs::metadata(path)
            .map_err(|e| SourceError::FileSystem(format!("无法读取文件信息：{}", e)))?;
        if metadata.len() > max_file_size {
            return Err(SourceError::ResourceLimit(format!(
                "文件过大：{:.2} MB（限制：{:.2} MB）",
                metadata.len() as f64 / 1024.0 / 1024.0,
                max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        let bytes = std::fs::read(path)
            .map_err(|e| SourceError::FileSystem(format!("无法读取文件：{}", e)))?;
        let declared_type = infer::get(&bytes).map(|kind| kind.mime_type());
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        Ok(Self::new(name, declared_type, bytes))
    }

    /// 声明类型是否为图片（`image/*`）。
    pub fn is_image(&self) -> bool {
        self.declared_type
            .as_deref()
            .map(|t| t.trim().to_ascii_lowercase().starts_with("image/"))
            .unwrap_or(false)
    }
}

/// 一次拖放事件携带的文件列表。
#[derive(Debug, Clone, Default)]
pub struct DropEvent {
    pub files: Vec<ImageFile>,
}

impl DropEvent {
    pub fn new(files: Vec<ImageFile>) -> Self {
        Self { files }
    }
}
