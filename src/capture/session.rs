//! # 采集会话（RAII）
//!
//! `CaptureSession` 独占一条视频流。会话被丢弃即停止全部轨道，
//! 因此无论是显式停止、切换朝向、出错返回还是管理器本身被销毁，
//! 流都不会残留。

use std::time::Instant;

use super::device::{Facing, VideoFrame, VideoStream};
use super::CaptureError;

/// 一次活动的摄像头会话。
pub(crate) struct CaptureSession<S: VideoStream> {
    stream: S,
    facing: Facing,
    started_at: Instant,
}

impl<S: VideoStream> CaptureSession<S> {
    pub(crate) fn new(stream: S, facing: Facing) -> Self {
        let (width, height) = stream.granted_resolution();
        log::info!(
            "📷 摄像头已开启 - 朝向: {} 授予分辨率: {}x{}",
            facing.facing_mode(),
            width,
            height
        );
        Self {
            stream,
            facing,
            started_at: Instant::now(),
        }
    }

    pub(crate) fn facing(&self) -> Facing {
        self.facing
    }

    pub(crate) fn resolution(&self) -> (u32, u32) {
        self.stream.granted_resolution()
    }

    pub(crate) fn read_frame(&mut self) -> Result<VideoFrame, CaptureError> {
        self.stream.read_frame()
    }
}

impl<S: VideoStream> Drop for CaptureSession<S> {
    fn drop(&mut self) {
        self.stream.stop_all_tracks();
        log::info!(
            "⏹️ 摄像头已关闭 - 朝向: {} 持续: {}ms",
            self.facing.facing_mode(),
            self.started_at.elapsed().as_millis()
        );
    }
}
