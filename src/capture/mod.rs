//! # 设备采集模块（capture）
//!
//! ## 设计思路
//!
//! 摄像头流是需要显式释放的资源：权限、指示灯、功耗。把“取流 → 使用 → 释放”
//! 建模为一个被独占持有的会话对象，任何退出路径（停止、切换、拍照后、出错、
//! 宿主销毁）都经由它的 `Drop` 停止全部轨道。
//!
//! - `device`：设备与视频流 trait，外部后端实现
//! - `session`：RAII 会话
//! - `manager`：状态机与对外操作（开启 / 切换 / 拍照 / 关闭）
//! - `encoder`：帧 → JPEG
//! - `config/error`：配置与错误
//!
//! ## 调用链
//!
//! ```text
//! start_capture ──▶ CameraDevice::open_stream ──▶ CaptureSession
//! capture_frame ──▶ VideoStream::read_frame ──▶ encoder ──▶ ImageFile
//! stop_capture / switch_facing ──▶ drop(CaptureSession) ──▶ stop_all_tracks
//! ```

mod config;
mod device;
mod encoder;
mod error;
mod manager;
mod session;

pub use config::CaptureConfig;
pub use device::{
    CameraDevice, Facing, NoStream, StreamConstraints, UnavailableCamera, VideoFrame, VideoStream,
};
pub use error::CaptureError;
pub use manager::{CAPTURE_MIME_TYPE, CaptureManager, CaptureStatus};
