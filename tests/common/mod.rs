//! 集成测试共用的脚本化设备与分类服务。

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use leaf_diagnosis::analysis::{AnalysisError, ClassificationService, RawPrediction};
use leaf_diagnosis::capture::{
    CameraDevice, CaptureError, Facing, StreamConstraints, VideoFrame, VideoStream,
};
use leaf_diagnosis::source::{ImageFile, ImagePayload};
use tokio::sync::oneshot;

pub type ScriptedResult = Result<RawPrediction, AnalysisError>;

#[derive(Default)]
pub struct CameraCounters {
    pub opened: AtomicUsize,
    pub live: AtomicUsize,
    pub deny: AtomicBool,
    pub last_facing: Mutex<Option<Facing>>,
}

pub struct ScriptedStream {
    counters: Arc<CameraCounters>,
    stopped: bool,
}

impl VideoStream for ScriptedStream {
    fn granted_resolution(&self) -> (u32, u32) {
        (64, 48)
    }

    fn read_frame(&mut self) -> Result<VideoFrame, CaptureError> {
        Ok(VideoFrame {
            width: 64,
            height: 48,
            rgba: [40_u8, 120, 60, 255].repeat(64 * 48),
        })
    }

    fn stop_all_tracks(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.counters.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// 永远授予 64x48 的摄像头，可切换为拒绝授权。
pub struct ScriptedCamera {
    pub counters: Arc<CameraCounters>,
}

impl ScriptedCamera {
    pub fn new() -> (Self, Arc<CameraCounters>) {
        let counters = Arc::new(CameraCounters::default());
        (
            Self {
                counters: Arc::clone(&counters),
            },
            counters,
        )
    }
}

impl CameraDevice for ScriptedCamera {
    type Stream = ScriptedStream;

    async fn open_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<ScriptedStream, CaptureError> {
        if self.counters.deny.load(Ordering::SeqCst) {
            return Err(CaptureError::DeviceUnavailable("NotAllowedError".to_string()));
        }
        *self.counters.last_facing.lock().expect("facing lock") = Some(constraints.facing);
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        self.counters.live.fetch_add(1, Ordering::SeqCst);
        Ok(ScriptedStream {
            counters: Arc::clone(&self.counters),
            stopped: false,
        })
    }
}

/// 按顺序返回预设结果；排到 `Gate` 时等待测试放行。
pub enum Step {
    Now(ScriptedResult),
    Gate(oneshot::Receiver<ScriptedResult>),
}

pub struct ScriptedService {
    steps: tokio::sync::Mutex<VecDeque<Step>>,
    echo: bool,
    pub calls: AtomicUsize,
}

impl ScriptedService {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: tokio::sync::Mutex::new(steps.into()),
            echo: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// 把提交的文件名原样作为标签返回。
    pub fn echo() -> Self {
        Self {
            echo: true,
            ..Self::new(Vec::new())
        }
    }
}

impl ClassificationService for ScriptedService {
    async fn classify(&self, payload: &ImagePayload) -> ScriptedResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().await.pop_front();
        match step {
            Some(Step::Now(result)) => result,
            Some(Step::Gate(rx)) => rx.await.expect("gate sender dropped"),
            None if self.echo => prediction(payload.file_name(), 0.9),
            None => panic!("no scripted response left"),
        }
    }
}

pub fn prediction(label: &str, confidence: f64) -> ScriptedResult {
    Ok(RawPrediction {
        label: label.to_string(),
        confidence,
    })
}

pub fn jpeg_file(name: &str) -> ImageFile {
    ImageFile::new(name, Some("image/jpeg"), vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10])
}
