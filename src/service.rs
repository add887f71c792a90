//! # 诊断服务
//!
//! ## 设计思路
//!
//! 一个服务实例对应一个“采集界面”：各持有一个采集管理器、来源解析器与分析编排器。
//! 展示层只通过这里的操作驱动状态，并通过 `view()` 读取只读快照。
//!
//! ## 实现思路
//!
//! - 每次成功选中新图片（文件 / 拖放 / 拍照）后，在仍持有解析器锁时 `reset` 分析结果。
//!   `analyze` 也要先拿这把锁，所以无论运行时是否多线程，新选择的效果都先于它自己的提交可见。
//! - 提交前在解析器锁内克隆活动载荷（字节为引用计数）并占用请求槽，
//!   载荷与代数取自同一时刻；等待网络期间不持有任何锁。

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::analysis::{
    AnalysisOrchestrator, AnalysisStatus, ClassificationService, FailureKind,
    HttpClassificationClient, SubmitReport,
};
use crate::capture::{CameraDevice, CaptureManager, CaptureStatus, Facing};
use crate::config::AppConfig;
use crate::diagnosis::{ConfidenceBands, DiagnosisReport, DiagnosisTable};
use crate::error::AppError;
use crate::source::{DropEvent, ImageFile, ImageSourceResolver, PayloadSummary};

/// 失败结果的展示形式。
#[derive(Debug, Clone, Serialize)]
pub struct FailureView {
    pub code: &'static str,
    pub kind: Option<FailureKind>,
    pub message: &'static str,
}

/// 提供给展示层的只读快照。
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosisView {
    pub capture: CaptureStatus,
    pub selection: Option<PayloadSummary>,
    /// 预览 Data URL，体积较大，不参与序列化。
    #[serde(skip)]
    pub preview_url: Option<Arc<str>>,
    pub analysis: AnalysisStatus,
    pub diagnosis: Option<DiagnosisReport>,
    pub failure: Option<FailureView>,
}

/// 采集 + 分析服务。
pub struct DiagnosisService<D: CameraDevice, S: ClassificationService> {
    capture: CaptureManager<D>,
    resolver: Mutex<ImageSourceResolver>,
    analysis: AnalysisOrchestrator<S>,
    bands: ConfidenceBands,
    max_file_size: u64,
}

impl<D: CameraDevice> DiagnosisService<D, HttpClassificationClient> {
    /// 使用 HTTP 分类客户端构建服务。
    pub fn with_http(config: &AppConfig, device: D) -> Result<Self, AppError> {
        config.validate()?;
        let table = config.load_table()?;
        let client = HttpClassificationClient::new(&config.analysis)?;
        log::info!("🌐 分类接口: {}", client.endpoint());
        Ok(Self::new(config, device, client, table))
    }
}

impl<D: CameraDevice, S: ClassificationService> DiagnosisService<D, S> {
    pub fn new(config: &AppConfig, device: D, service: S, table: DiagnosisTable) -> Self {
        Self {
            capture: CaptureManager::new(device, config.capture.clone()),
            resolver: Mutex::new(ImageSourceResolver::new(config.source.clone())),
            analysis: AnalysisOrchestrator::new(service, table),
            bands: config.presentation,
            max_file_size: config.source.max_file_size,
        }
    }

    fn lock_resolver(&self) -> MutexGuard<'_, ImageSourceResolver> {
        self.resolver.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn capture(&self) -> &CaptureManager<D> {
        &self.capture
    }

    pub fn analysis(&self) -> &AnalysisOrchestrator<S> {
        &self.analysis
    }

    /// 当前存活的预览句柄数量。
    pub fn live_previews(&self) -> usize {
        self.lock_resolver().registry().live_count()
    }

    /// 开启摄像头；未指定朝向时沿用上次的朝向。
    pub async fn start_camera(&self, facing: Option<Facing>) -> Result<CaptureStatus, AppError> {
        let facing = facing.unwrap_or_else(|| self.capture.preferred_facing());
        Ok(self.capture.start_capture(facing).await?)
    }

    pub async fn switch_camera(&self) -> Result<CaptureStatus, AppError> {
        Ok(self.capture.switch_facing().await?)
    }

    pub fn stop_camera(&self) {
        self.capture.stop_capture();
    }

    /// 拍照并把照片设为活动载荷，随后关闭摄像头。
    pub async fn capture_photo(&self) -> Result<PayloadSummary, AppError> {
        let file = self.capture.capture_frame().await?;
        let mut resolver = self.lock_resolver();
        let summary = resolver.from_capture(file, &self.capture)?.summary();
        self.analysis.reset();
        Ok(summary)
    }

    /// 文件选择器路径。
    pub fn select_file(&self, file: ImageFile) -> Result<PayloadSummary, AppError> {
        let mut resolver = self.lock_resolver();
        let summary = resolver.from_file(file)?.summary();
        self.analysis.reset();
        Ok(summary)
    }

    /// 从本地路径读取并选中图片（类型由文件签名判定）。
    pub fn select_path(&self, path: impl AsRef<Path>) -> Result<PayloadSummary, AppError> {
        let file = ImageFile::from_path(path, self.max_file_size)?;
        self.select_file(file)
    }

    /// 拖放路径；首个文件不是图片时返回 `None` 且不改变任何状态。
    pub fn drop_files(&self, event: DropEvent) -> Result<Option<PayloadSummary>, AppError> {
        let mut resolver = self.lock_resolver();
        let summary = resolver.from_drop(event)?.map(|payload| payload.summary());
        if summary.is_some() {
            self.analysis.reset();
        }
        Ok(summary)
    }

    /// 清空选择与分析结果（“换一张图”）。
    pub fn clear(&self) {
        let mut resolver = self.lock_resolver();
        resolver.clear();
        self.analysis.reset();
    }

    /// 提交当前活动载荷。
    pub async fn analyze(&self) -> SubmitReport {
        let prepared = {
            let resolver = self.lock_resolver();
            resolver
                .active()
                .map(|payload| (payload.clone(), self.analysis.begin()))
        };

        match prepared {
            None => self.analysis.submit(None).await,
            Some((payload, Ok(pending))) => self.analysis.complete(pending, &payload).await,
            Some((_, Err(report))) => report,
        }
    }

    /// 只读快照；在解析器锁内读取分析状态，选择与结果互相一致。
    pub fn view(&self) -> DiagnosisView {
        let resolver = self.lock_resolver();
        let (selection, preview_url) = match resolver.active() {
            Some(payload) => (Some(payload.summary()), payload.preview().data_url()),
            None => (None, None),
        };

        DiagnosisView {
            capture: self.capture.status(),
            selection,
            preview_url,
            analysis: self.analysis.status(),
            diagnosis: self
                .analysis
                .diagnosis()
                .map(|record| record.report(&self.bands)),
            failure: self.analysis.failure().map(|failure| FailureView {
                code: failure.code,
                kind: failure.kind,
                message: failure.user_message(),
            }),
        }
    }
}
