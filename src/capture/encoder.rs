//! 静态帧压缩：RGBA → JPEG。

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageBuffer, Rgba};

use super::device::VideoFrame;
use super::CaptureError;

/// 将一帧 RGBA 像素编码为 JPEG。
///
/// JPEG 没有透明通道，编码前先丢弃 alpha。
pub(crate) fn encode_jpeg(frame: VideoFrame, quality: u8) -> Result<Vec<u8>, CaptureError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(CaptureError::Encode("视频帧尚未就绪（尺寸为 0）".to_string()));
    }

    let (width, height) = (frame.width, frame.height);
    let rgba = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(width, height, frame.rgba)
        .ok_or_else(|| CaptureError::Encode("视频帧像素长度异常".to_string()))?;
    let rgb = DynamicImage::ImageRgba8(rgba).to_rgb8();

    let mut buffer = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    encoder
        .encode(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
        .map_err(|e| CaptureError::Encode(format!("JPEG 编码失败：{}", e)))?;

    log::debug!("🗜️ 帧编码完成 - {}x{} -> {} bytes", width, height, buffer.len());

    Ok(buffer)
}
