//! # 预览句柄
//!
//! ## 设计思路
//!
//! 预览句柄是一个可撤销的不透明引用：宿主拿它展示图片，解析器在替换或清空
//! 选择时撤销它。注册表统一持有预览数据，撤销即释放，`live_count` 可用于
//! 断言“同一时刻最多一个存活句柄”。
//!
//! ## 实现思路
//!
//! 1. 解码原图并按单边上限降采样（优先 `fast_image_resize`，失败回退 `image`）
//! 2. 重新编码为 PNG，生成 Data URL
//! 3. 任何一步失败则回退为原始字节的 Data URL，不影响选择本身

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use base64::{Engine as _, engine::general_purpose};
use fast_image_resize as fr;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageBuffer, ImageFormat, Rgba};

use super::SourceError;

/// 预览数据注册表。
#[derive(Debug, Default)]
pub struct PreviewRegistry {
    entries: Mutex<HashMap<u64, Arc<str>>>,
    next_id: AtomicU64,
}

/// 可撤销的预览引用。
#[derive(Clone)]
pub struct PreviewHandle {
    id: u64,
    registry: Arc<PreviewRegistry>,
}

impl std::fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewHandle")
            .field("id", &self.id)
            .field("live", &self.is_live())
            .finish()
    }
}

impl PreviewHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// 可直接用于展示的 Data URL；撤销后返回 `None`。
    pub fn data_url(&self) -> Option<Arc<str>> {
        self.registry.lock_entries().get(&self.id).cloned()
    }

    pub fn is_live(&self) -> bool {
        self.registry.lock_entries().contains_key(&self.id)
    }
}

impl PreviewRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<u64, Arc<str>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 当前存活的句柄数量。
    pub fn live_count(&self) -> usize {
        self.lock_entries().len()
    }

    /// 为图片字节生成预览并登记。
    pub(crate) fn register(
        self: &Arc<Self>,
        bytes: &[u8],
        mime_type: &str,
        max_dimension: u32,
    ) -> PreviewHandle {
        let data_url = match render_thumbnail(bytes, max_dimension) {
            Ok(url) => url,
            Err(err) => {
                log::warn!("⚠️ 缩略图生成失败，回退为原图预览：{}", err);
                raw_data_url(bytes, mime_type)
            }
        };

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.lock_entries().insert(id, Arc::from(data_url));
        log::debug!("🖼️ 预览句柄已登记 - id={}", id);

        PreviewHandle {
            id,
            registry: Arc::clone(self),
        }
    }

    /// 撤销句柄，返回是否确实释放了数据。
    pub(crate) fn revoke(&self, handle: &PreviewHandle) -> bool {
        let removed = self.lock_entries().remove(&handle.id).is_some();
        if removed {
            log::debug!("🧹 预览句柄已撤销 - id={}", handle.id);
        }
        removed
    }
}

fn raw_data_url(bytes: &[u8], mime_type: &str) -> String {
    format!(
        "data:{};base64,{}",
        mime_type,
        general_purpose::STANDARD.encode(bytes)
    )
}

/// 解码 → 降采样 → PNG Data URL。
fn render_thumbnail(bytes: &[u8], max_dimension: u32) -> Result<String, SourceError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| SourceError::Decode(format!("图片解码失败：{}", e)))?;
    let (width, height) = decoded.dimensions();
    let longest = width.max(height);

    let thumbnail = if max_dimension == 0 || longest <= max_dimension {
        decoded
    } else {
        let scale = max_dimension as f64 / longest as f64;
        let target_width = ((width as f64 * scale).floor() as u32).max(1);
        let target_height = ((height as f64 * scale).floor() as u32).max(1);

        match resize_with_fast_image_resize(&decoded, target_width, target_height) {
            Ok(resized) => resized,
            Err(err) => {
                log::warn!("⚠️ fast_image_resize 降采样失败，回退 image::resize_exact：{}", err);
                decoded.resize_exact(target_width, target_height, FilterType::Triangle)
            }
        }
    };

    let mut cursor = Cursor::new(Vec::new());
    thumbnail
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|e| SourceError::Decode(format!("预览编码失败：{}", e)))?;

    Ok(format!(
        "data:image/png;base64,{}",
        general_purpose::STANDARD.encode(cursor.into_inner())
    ))
}

fn resize_with_fast_image_resize(
    image: &DynamicImage,
    target_width: u32,
    target_height: u32,
) -> Result<DynamicImage, SourceError> {
    let src = image.to_rgba8();
    let (src_width, src_height) = src.dimensions();

    let src_image =
        fr::images::Image::from_vec_u8(src_width, src_height, src.into_raw(), fr::PixelType::U8x4)
            .map_err(|e| SourceError::Decode(format!("构建源图像缓冲失败：{}", e)))?;
    let mut dst_image = fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new();
    let options =
        fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Convolution(fr::FilterType::Bilinear));
    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| SourceError::Decode(format!("fast_image_resize 执行失败：{}", e)))?;

    let rgba = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(
        target_width,
        target_height,
        dst_image.into_vec(),
    )
    .ok_or_else(|| SourceError::Decode("缩放输出缓冲长度异常".to_string()))?;

    Ok(DynamicImage::ImageRgba8(rgba))
}
