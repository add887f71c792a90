//! # 分析编排器
//!
//! ## 设计思路
//!
//! 单槽请求状态机：
//!
//! ```text
//! Idle ──submit──▶ Pending ──响应──▶ Succeeded / Failed ──reset──▶ Idle
//! ```
//!
//! 同一时刻最多一个在途请求；在途请求不可取消。
//!
//! ## 实现思路
//!
//! - 每次 `reset`（换图、清空）推进一代 `generation`。
//! - 提交时记下当时的代数，响应返回时若代数已变，说明结果属于已被丢弃的图片，
//!   直接丢弃，状态回到 `Idle`。
//! - 等待网络期间不持锁。

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use serde::Serialize;

use super::client::ClassificationService;
use super::error::AnalysisFailure;
use crate::diagnosis::{DiagnosisRecord, DiagnosisTable, classify};
use crate::source::{ImagePayload, PayloadId};

/// 请求状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Idle,
    Pending,
    Succeeded,
    Failed,
}

/// 一次已完成请求的结果，绑定到提交时的载荷。
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub payload_id: PayloadId,
    pub result: Result<DiagnosisRecord, AnalysisFailure>,
}

/// `submit` 的处理结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitReport {
    /// 没有活动载荷，未发起请求。
    NoPayload,
    /// 已有在途请求，未发起请求。
    AlreadyPending,
    /// 请求已完成并写入结果。
    Completed(AnalysisStatus),
    /// 响应到达时选择已变化，结果被丢弃。
    Discarded,
}

#[derive(Default)]
struct RequestSlot {
    generation: u64,
    in_flight: bool,
    outcome: Option<AnalysisOutcome>,
}

impl RequestSlot {
    fn status(&self) -> AnalysisStatus {
        if self.in_flight {
            return AnalysisStatus::Pending;
        }
        match &self.outcome {
            None => AnalysisStatus::Idle,
            Some(AnalysisOutcome { result: Ok(_), .. }) => AnalysisStatus::Succeeded,
            Some(AnalysisOutcome { result: Err(_), .. }) => AnalysisStatus::Failed,
        }
    }
}

/// 在途标记守卫：请求 future 被中途丢弃时复位 `in_flight`。
struct InFlightGuard<'a> {
    slot: &'a Mutex<RequestSlot>,
    armed: bool,
}

impl InFlightGuard<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.slot
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .in_flight = false;
            log::warn!("⚠️ 分析请求在完成前被取消");
        }
    }
}

/// 已占用请求槽、尚未发送的请求。
pub(crate) struct PendingRequest<'a> {
    generation: u64,
    guard: InFlightGuard<'a>,
}

/// 分析编排器。
pub struct AnalysisOrchestrator<S: ClassificationService> {
    service: S,
    table: DiagnosisTable,
    slot: Mutex<RequestSlot>,
}

impl<S: ClassificationService> AnalysisOrchestrator<S> {
    pub fn new(service: S, table: DiagnosisTable) -> Self {
        Self {
            service,
            table,
            slot: Mutex::new(RequestSlot::default()),
        }
    }

    fn lock_slot(&self) -> MutexGuard<'_, RequestSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn table(&self) -> &DiagnosisTable {
        &self.table
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn status(&self) -> AnalysisStatus {
        self.lock_slot().status()
    }

    pub fn outcome(&self) -> Option<AnalysisOutcome> {
        self.lock_slot().outcome.clone()
    }

    /// 成功时的诊断记录。
    pub fn diagnosis(&self) -> Option<DiagnosisRecord> {
        self.lock_slot()
            .outcome
            .as_ref()
            .and_then(|o| o.result.as_ref().ok().cloned())
    }

    /// 失败时的脱敏错误。
    pub fn failure(&self) -> Option<AnalysisFailure> {
        self.lock_slot()
            .outcome
            .as_ref()
            .and_then(|o| o.result.as_ref().err().copied())
    }

    /// 提交当前载荷，等待唯一一次响应。
    pub async fn submit(&self, payload: Option<&ImagePayload>) -> SubmitReport {
        let Some(payload) = payload else {
            log::debug!("⏭️ 没有选中的图片，忽略分析请求");
            return SubmitReport::NoPayload;
        };

        match self.begin() {
            Ok(pending) => self.complete(pending, payload).await,
            Err(report) => report,
        }
    }

    /// 占用请求槽并记下当前代数。
    ///
    /// 调用方可在持有选择锁时调用，使“载荷”与“代数”取自同一时刻。
    pub(crate) fn begin(&self) -> Result<PendingRequest<'_>, SubmitReport> {
        let generation = {
            let mut slot = self.lock_slot();
            if slot.in_flight {
                log::debug!("⏭️ 已有分析请求在途，忽略重复提交");
                return Err(SubmitReport::AlreadyPending);
            }
            slot.in_flight = true;
            slot.outcome = None;
            slot.generation
        };
        Ok(PendingRequest {
            generation,
            guard: InFlightGuard {
                slot: &self.slot,
                armed: true,
            },
        })
    }

    /// 发送已占槽的请求并写入结果。
    pub(crate) async fn complete(&self, pending: PendingRequest<'_>, payload: &ImagePayload) -> SubmitReport {
        let PendingRequest {
            generation,
            mut guard,
        } = pending;

        log::info!(
            "🚀 提交分析请求 - id={} 名称: {} ({} bytes)",
            payload.id().value(),
            payload.file_name(),
            payload.bytes().len()
        );
        let started = Instant::now();
        let response = self.service.classify(payload).await;

        let mut slot = self.lock_slot();
        slot.in_flight = false;
        guard.disarm();

        if slot.generation != generation {
            log::debug!(
                "🗑️ 丢弃过期响应 - id={} (提交代数 {} ≠ 当前 {})",
                payload.id().value(),
                generation,
                slot.generation
            );
            return SubmitReport::Discarded;
        }

        let result = match response {
            Ok(prediction) => {
                let record = classify(&self.table, &prediction.label, prediction.confidence);
                log::info!(
                    "✅ 分析完成 - 标签: {} 置信度: {}% 严重度: {} ({}ms)",
                    record.raw_label(),
                    record.confidence_percent(),
                    record.severity().as_str(),
                    started.elapsed().as_millis()
                );
                Ok(record)
            }
            Err(err) => {
                log::error!("❌ 分析失败: {}", err);
                Err(AnalysisFailure::from(&err))
            }
        };

        slot.outcome = Some(AnalysisOutcome {
            payload_id: payload.id(),
            result,
        });
        SubmitReport::Completed(slot.status())
    }

    /// 回到 `Idle` 并丢弃已有结果；在途请求的响应届时会被丢弃。
    pub fn reset(&self) {
        let mut slot = self.lock_slot();
        slot.generation += 1;
        if slot.outcome.take().is_some() {
            log::info!("🧹 已清除分析结果");
        }
        if slot.in_flight {
            log::debug!("⏳ 仍有在途请求，其响应将被丢弃");
        }
    }
}
