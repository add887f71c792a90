//! # 活动图片载荷
//!
//! 字段全部私有：载荷只能由解析器创建与替换，展示层只读。

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::preview::PreviewHandle;

/// 载荷身份，按选择顺序单调递增。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PayloadId(u64);

impl PayloadId {
    pub(crate) fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

/// 载荷来自哪条采集路径。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadOrigin {
    FilePicker,
    Drop,
    Camera,
}

/// 当前被选中的图片。
#[derive(Debug, Clone)]
pub struct ImagePayload {
    id: PayloadId,
    file_name: String,
    mime_type: String,
    bytes: Bytes,
    preview: PreviewHandle,
    origin: PayloadOrigin,
    selected_at: DateTime<Utc>,
}

impl ImagePayload {
    pub(crate) fn new(
        id: PayloadId,
        file_name: String,
        mime_type: String,
        bytes: Bytes,
        preview: PreviewHandle,
        origin: PayloadOrigin,
    ) -> Self {
        Self {
            id,
            file_name,
            mime_type,
            bytes,
            preview,
            origin,
            selected_at: Utc::now(),
        }
    }

    pub fn id(&self) -> PayloadId {
        self.id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn preview(&self) -> &PreviewHandle {
        &self.preview
    }

    pub fn origin(&self) -> PayloadOrigin {
        self.origin
    }

    pub fn selected_at(&self) -> DateTime<Utc> {
        self.selected_at
    }

    /// 供展示层序列化的摘要（不含图片字节）。
    pub fn summary(&self) -> PayloadSummary {
        PayloadSummary {
            id: self.id,
            file_name: self.file_name.clone(),
            mime_type: self.mime_type.clone(),
            size_bytes: self.bytes.len(),
            origin: self.origin,
            preview_id: self.preview.id(),
            selected_at: self.selected_at.to_rfc3339(),
        }
    }
}

/// 载荷摘要。
#[derive(Debug, Clone, Serialize)]
pub struct PayloadSummary {
    pub id: PayloadId,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: usize,
    pub origin: PayloadOrigin,
    pub preview_id: u64,
    pub selected_at: String,
}
