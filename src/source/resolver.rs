//! # 图片来源解析器
//!
//! ## 设计思路
//!
//! 三条采集路径（文件选择、拖放、拍照）最终都归一为同一个 `ImagePayload`。
//! 解析器独占“单槽”活动载荷及其预览句柄，外部只能通过这里的操作修改它。
//!
//! ## 实现思路
//!
//! - 校验失败不改变任何状态（旧选择保持不变）。
//! - 安装新载荷前先撤销旧预览句柄，任意时刻最多一个存活句柄。
//! - 拍照路径在照片通过校验后才关闭摄像头；照片被拒时相机模式保持不变。

use std::sync::Arc;

use super::file::{DropEvent, ImageFile};
use super::payload::{ImagePayload, PayloadId, PayloadOrigin};
use super::preview::PreviewRegistry;
use super::{SourceConfig, SourceError};
use crate::capture::{CameraDevice, CaptureManager};

/// 单槽图片来源解析器。
pub struct ImageSourceResolver {
    config: SourceConfig,
    registry: Arc<PreviewRegistry>,
    active: Option<ImagePayload>,
    next_id: u64,
}

impl ImageSourceResolver {
    pub fn new(config: SourceConfig) -> Self {
        Self {
            config,
            registry: PreviewRegistry::new(),
            active: None,
            next_id: 0,
        }
    }

    /// 预览注册表（只读用途：查询存活句柄数）。
    pub fn registry(&self) -> &Arc<PreviewRegistry> {
        &self.registry
    }

    /// 当前活动载荷。
    pub fn active(&self) -> Option<&ImagePayload> {
        self.active.as_ref()
    }

    /// 文件选择器路径：只接受声明类型为图片的文件。
    pub fn from_file(&mut self, file: ImageFile) -> Result<&ImagePayload, SourceError> {
        self.install(file, PayloadOrigin::FilePicker)
    }

    /// 拖放路径：只看第一个文件，非图片或空拖放直接忽略。
    pub fn from_drop(&mut self, event: DropEvent) -> Result<Option<&ImagePayload>, SourceError> {
        let Some(file) = event.files.into_iter().next() else {
            log::debug!("⏭️ 拖放事件不含文件，忽略");
            return Ok(None);
        };

        if !file.is_image() {
            log::debug!(
                "⏭️ 拖放的首个文件不是图片，忽略 - {} ({:?})",
                file.name,
                file.declared_type
            );
            return Ok(None);
        }

        self.install(file, PayloadOrigin::Drop).map(Some)
    }

    /// 拍照路径：照片通过校验后关闭摄像头并安装照片。
    pub fn from_capture<D: CameraDevice>(
        &mut self,
        file: ImageFile,
        capture: &CaptureManager<D>,
    ) -> Result<&ImagePayload, SourceError> {
        let mime_type = self.validate(&file)?;
        capture.stop_capture();
        Ok(self.commit(file, mime_type, PayloadOrigin::Camera))
    }

    /// 清空选择并撤销预览，返回之前是否有活动载荷。
    pub fn clear(&mut self) -> bool {
        match self.active.take() {
            Some(previous) => {
                self.registry.revoke(previous.preview());
                log::info!("🧹 已清空图片选择 - id={}", previous.id().value());
                true
            }
            None => false,
        }
    }

    fn install(&mut self, file: ImageFile, origin: PayloadOrigin) -> Result<&ImagePayload, SourceError> {
        let mime_type = self.validate(&file)?;
        Ok(self.commit(file, mime_type, origin))
    }

    /// 校验类型、空文件与大小，返回规范化的 MIME 类型；不改变任何状态。
    fn validate(&self, file: &ImageFile) -> Result<String, SourceError> {
        let mime_type = match file.declared_type.as_deref() {
            Some(t) if file.is_image() => t.trim().to_ascii_lowercase(),
            other => {
                log::warn!("❌ 拒绝非图片文件 - {} ({:?})", file.name, other);
                return Err(SourceError::UnsupportedType(
                    other.unwrap_or("未知类型").to_string(),
                ));
            }
        };

        if file.bytes.is_empty() {
            return Err(SourceError::UnsupportedType(format!("空文件：{}", file.name)));
        }

        let size = file.bytes.len() as u64;
        if size > self.config.max_file_size {
            return Err(SourceError::ResourceLimit(format!(
                "文件过大：{:.2} MB（限制：{:.2} MB）",
                size as f64 / 1024.0 / 1024.0,
                self.config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(mime_type)
    }

    fn commit(&mut self, file: ImageFile, mime_type: String, origin: PayloadOrigin) -> &ImagePayload {
        let size = file.bytes.len();

        // 先释放旧句柄，再登记新句柄
        self.clear();

        let preview =
            self.registry
                .register(&file.bytes, &mime_type, self.config.preview_max_dimension);
        self.next_id += 1;
        let payload = ImagePayload::new(
            PayloadId::new(self.next_id),
            file.name,
            mime_type,
            file.bytes,
            preview,
            origin,
        );

        log::info!(
            "🖼️ 已选中图片 - id={} 来源: {:?} 名称: {} 大小: {} bytes",
            payload.id().value(),
            origin,
            payload.file_name(),
            size
        );

        self.active.insert(payload)
    }
}

impl Drop for ImageSourceResolver {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureConfig, CaptureStatus, UnavailableCamera};

    const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

    fn png_file(name: &str) -> ImageFile {
        ImageFile::new(name, Some("image/png"), PNG_SIGNATURE.to_vec())
    }

    #[test]
    fn from_file_installs_payload_with_live_preview() {
        let mut resolver = ImageSourceResolver::new(SourceConfig::default());

        let payload = resolver.from_file(png_file("leaf.png")).expect("should accept");

        assert_eq!(payload.mime_type(), "image/png");
        assert_eq!(payload.origin(), PayloadOrigin::FilePicker);
        assert!(payload.preview().is_live());
        assert_eq!(resolver.registry().live_count(), 1);
    }

    #[test]
    fn rejected_file_keeps_previous_selection() {
        let mut resolver = ImageSourceResolver::new(SourceConfig::default());
        let first_id = resolver.from_file(png_file("leaf.png")).expect("accept").id();

        let result =
            resolver.from_file(ImageFile::new("notes.txt", Some("text/plain"), b"hi".to_vec()));

        assert!(matches!(result, Err(SourceError::UnsupportedType(_))));
        assert_eq!(resolver.active().map(|p| p.id()), Some(first_id));
        assert_eq!(resolver.registry().live_count(), 1);
    }

    #[test]
    fn replacement_revokes_previous_preview() {
        let mut resolver = ImageSourceResolver::new(SourceConfig::default());
        let first_preview = resolver.from_file(png_file("a.png")).expect("accept").preview().clone();

        let second = resolver.from_file(png_file("b.png")).expect("accept");

        assert_eq!(second.id(), PayloadId::new(2));
        assert!(!first_preview.is_live());
        assert_eq!(resolver.registry().live_count(), 1);
    }

    #[test]
    fn drop_uses_first_file_only() {
        let mut resolver = ImageSourceResolver::new(SourceConfig::default());
        let event = DropEvent::new(vec![
            ImageFile::new("readme.md", Some("text/markdown"), b"# hi".to_vec()),
            png_file("leaf.png"),
        ]);

        let result = resolver.from_drop(event).expect("drop should not error");

        assert!(result.is_none());
        assert!(resolver.active().is_none());
    }

    #[test]
    fn drop_accepts_first_image() {
        let mut resolver = ImageSourceResolver::new(SourceConfig::default());

        let payload = resolver
            .from_drop(DropEvent::new(vec![png_file("leaf.png")]))
            .expect("drop should not error")
            .expect("image should be installed");

        assert_eq!(payload.origin(), PayloadOrigin::Drop);
        assert!(resolver.from_drop(DropEvent::default()).expect("empty drop").is_none());
        assert!(resolver.active().is_some());
    }

    #[test]
    fn oversized_file_is_rejected() {
        let mut resolver = ImageSourceResolver::new(SourceConfig {
            max_file_size: 4,
            ..SourceConfig::default()
        });

        let result = resolver.from_file(png_file("leaf.png"));

        assert!(matches!(result, Err(SourceError::ResourceLimit(_))));
    }

    #[test]
    fn from_capture_stops_camera() {
        let manager = CaptureManager::new(UnavailableCamera, CaptureConfig::default());
        let mut resolver = ImageSourceResolver::new(SourceConfig::default());

        let payload = resolver
            .from_capture(
                ImageFile::new("leaf-1.jpg", Some("image/jpeg"), vec![0xFF, 0xD8, 0xFF]),
                &manager,
            )
            .expect("capture should be accepted");

        assert_eq!(payload.origin(), PayloadOrigin::Camera);
        assert_eq!(manager.status(), CaptureStatus::Idle);
    }

    #[test]
    fn clear_revokes_and_empties_slot() {
        let mut resolver = ImageSourceResolver::new(SourceConfig::default());
        resolver.from_file(png_file("leaf.png")).expect("accept");

        assert!(resolver.clear());
        assert!(!resolver.clear());
        assert!(resolver.active().is_none());
        assert_eq!(resolver.registry().live_count(), 0);
    }
}
