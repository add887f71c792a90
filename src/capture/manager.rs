//! # 采集管理器
//!
//! ## 设计思路
//!
//! 摄像头生命周期用显式状态机表达：
//!
//! ```text
//! Idle ──start──▶ Starting ──授权成功──▶ Active ──capture──▶ Active
//!  ▲                 │                     │
//!  │              授权失败               stop / switch 失败
//!  └─────────────────┴─────────────────────┘
//! ```
//!
//! ## 实现思路
//!
//! - 等待授权期间不持锁；`Starting` 携带票据，授权返回时若票据已过期
//!   （期间被停止或重启），新流立即释放，保证任意时刻最多一条流。
//! - 启动 future 被丢弃（宿主超时、放弃授权弹窗）时，`StartingGuard` 把仍属于
//!   本票据的 `Starting` 复位为 `Idle`，之后仍可重新开启。
//! - 会话为 RAII 对象，离开状态机即停止全部轨道。
//! - 拍照使用 `CapturingGuard` 防重入，编码放到阻塞线程池执行。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;

use super::device::{CameraDevice, Facing, VideoStream};
use super::session::CaptureSession;
use super::{encoder, CaptureConfig, CaptureError};
use crate::source::ImageFile;

/// 捕获图片的 MIME 类型。
pub const CAPTURE_MIME_TYPE: &str = "image/jpeg";

enum CaptureState<S: VideoStream> {
    Idle,
    Starting { facing: Facing, ticket: u64 },
    Active(CaptureSession<S>),
}

struct Inner<S: VideoStream> {
    state: CaptureState<S>,
    preferred_facing: Facing,
    next_ticket: u64,
}

/// 对外可见的会话状态快照。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum CaptureStatus {
    Idle,
    Starting { facing: Facing },
    Active { facing: Facing, width: u32, height: u32 },
}

impl CaptureStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }
}

/// 拍照防重入守卫：构造时置位，`Drop` 时复位。
struct CapturingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> CapturingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, CaptureError> {
        if flag.swap(true, Ordering::SeqCst) {
            log::debug!("⏭️ 已有拍照在进行，忽略本次请求");
            return Err(CaptureError::CaptureInProgress);
        }
        Ok(Self { flag })
    }
}

impl Drop for CapturingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// 启动守卫：等待授权期间若 future 被丢弃，把本票据的 `Starting` 复位为 `Idle`。
struct StartingGuard<'a, S: VideoStream> {
    inner: &'a Mutex<Inner<S>>,
    ticket: u64,
    armed: bool,
}

impl<S: VideoStream> StartingGuard<'_, S> {
    /// 授权已返回，后续状态由调用方在同一把锁内决定。
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<S: VideoStream> Drop for StartingGuard<'_, S> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(inner.state, CaptureState::Starting { ticket, .. } if ticket == self.ticket) {
            inner.state = CaptureState::Idle;
            log::info!("⏹️ 摄像头启动被取消，已恢复为空闲");
        }
    }
}

/// 设备采集管理器，视频流的唯一持有者。
pub struct CaptureManager<D: CameraDevice> {
    device: D,
    config: CaptureConfig,
    inner: Mutex<Inner<D::Stream>>,
    capturing: AtomicBool,
}

impl<D: CameraDevice> CaptureManager<D> {
    pub fn new(device: D, config: CaptureConfig) -> Self {
        let preferred_facing = config.default_facing;
        Self {
            device,
            config,
            inner: Mutex::new(Inner {
                state: CaptureState::Idle,
                preferred_facing,
                next_ticket: 0,
            }),
            capturing: AtomicBool::new(false),
        }
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner<D::Stream>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 当前状态快照。
    pub fn status(&self) -> CaptureStatus {
        match &self.lock_inner().state {
            CaptureState::Idle => CaptureStatus::Idle,
            CaptureState::Starting { facing, .. } => CaptureStatus::Starting { facing: *facing },
            CaptureState::Active(session) => {
                let (width, height) = session.resolution();
                CaptureStatus::Active {
                    facing: session.facing(),
                    width,
                    height,
                }
            }
        }
    }

    /// 下一次开启摄像头时使用的朝向。
    pub fn preferred_facing(&self) -> Facing {
        self.lock_inner().preferred_facing
    }

    /// 是否有拍照正在编码。
    pub fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    /// 以指定朝向开启摄像头。
    ///
    /// 已经开启或正在开启时不会再申请第二条流，直接返回当前状态。
    pub async fn start_capture(&self, facing: Facing) -> Result<CaptureStatus, CaptureError> {
        let ticket = {
            let mut inner = self.lock_inner();
            if !matches!(inner.state, CaptureState::Idle) {
                log::debug!("⏭️ 摄像头已在运行或启动中，忽略重复开启");
                drop(inner);
                return Ok(self.status());
            }
            inner.next_ticket += 1;
            let ticket = inner.next_ticket;
            inner.state = CaptureState::Starting { facing, ticket };
            inner.preferred_facing = facing;
            ticket
        };
        let starting = StartingGuard {
            inner: &self.inner,
            ticket,
            armed: true,
        };

        let constraints = self.config.constraints(facing);
        log::info!(
            "📷 申请摄像头 - 朝向: {} 理想分辨率: {}x{}",
            facing.facing_mode(),
            constraints.ideal_width,
            constraints.ideal_height
        );
        let wait_start = Instant::now();
        let opened = self.device.open_stream(&constraints).await;
        starting.disarm();

        let mut inner = self.lock_inner();
        let still_wanted = matches!(
            inner.state,
            CaptureState::Starting { ticket: current, .. } if current == ticket
        );

        match opened {
            Ok(stream) => {
                let session = CaptureSession::new(stream, facing);
                if !still_wanted {
                    log::warn!("⚠️ 授权返回时会话已被停止，立即释放新流");
                    drop(session);
                    return Err(CaptureError::Aborted);
                }
                let (width, height) = session.resolution();
                inner.state = CaptureState::Active(session);
                log::debug!("⏱️ 摄像头授权耗时 {}ms", wait_start.elapsed().as_millis());
                Ok(CaptureStatus::Active {
                    facing,
                    width,
                    height,
                })
            }
            Err(err) => {
                if still_wanted {
                    inner.state = CaptureState::Idle;
                }
                log::warn!("❌ 摄像头开启失败: {}", err);
                Err(err)
            }
        }
    }

    /// 切换前后摄像头。
    ///
    /// 先完整拆除当前流，再申请相反朝向；申请失败时会话停留在 `Idle`。
    pub async fn switch_facing(&self) -> Result<CaptureStatus, CaptureError> {
        let next = {
            let mut inner = self.lock_inner();
            match std::mem::replace(&mut inner.state, CaptureState::Idle) {
                CaptureState::Active(session) => {
                    let next = session.facing().opposite();
                    drop(session);
                    inner.preferred_facing = next;
                    next
                }
                other => {
                    inner.state = other;
                    return Err(CaptureError::NotActive);
                }
            }
        };

        log::info!("🔄 切换摄像头 -> {}", next.facing_mode());
        self.start_capture(next).await
    }

    /// 采样当前帧并压缩为 JPEG 文件。
    ///
    /// 拍照不会结束会话，是否关闭由调用方决定。
    pub async fn capture_frame(&self) -> Result<ImageFile, CaptureError> {
        let _guard = CapturingGuard::acquire(&self.capturing)?;

        let frame = {
            let mut inner = self.lock_inner();
            match &mut inner.state {
                CaptureState::Active(session) => session.read_frame()?,
                _ => return Err(CaptureError::NotActive),
            }
        };

        let quality = self.config.jpeg_quality;
        let encode_start = Instant::now();
        let bytes = tokio::task::spawn_blocking(move || encoder::encode_jpeg(frame, quality))
            .await
            .map_err(|e| CaptureError::Encode(format!("编码线程执行失败：{}", e)))??;

        let name = format!("leaf-{}.jpg", Utc::now().timestamp_millis());
        log::info!(
            "📸 拍照完成 - {} ({} bytes, {}ms)",
            name,
            bytes.len(),
            encode_start.elapsed().as_millis()
        );

        Ok(ImageFile::new(name, Some(CAPTURE_MIME_TYPE), bytes))
    }

    /// 关闭摄像头，幂等。
    ///
    /// 正在启动时也会生效：授权返回后新流会被立即释放。
    pub fn stop_capture(&self) {
        let previous = {
            let mut inner = self.lock_inner();
            std::mem::replace(&mut inner.state, CaptureState::Idle)
        };
        match previous {
            CaptureState::Idle => log::debug!("⏭️ 摄像头未开启，无需关闭"),
            CaptureState::Starting { .. } => log::info!("⏹️ 已取消正在进行的摄像头启动"),
            CaptureState::Active(session) => drop(session),
        }
    }
}
