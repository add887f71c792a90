//! # 分析模块（analysis）
//!
//! ## 设计思路
//!
//! 把“选中图片 → 提交 → 等待 → 成功/失败”收敛为单槽状态机，远端分类器
//! 通过 `ClassificationService` trait 注入。
//!
//! - `client`：trait 与 reqwest multipart 实现
//! - `orchestrator`：请求状态机、过期响应丢弃
//! - `config/error`：配置与错误
//!
//! ```text
//! submit ──▶ ClassificationService::classify ──▶ RawPrediction
//!                                                   └─▶ diagnosis::classify ──▶ DiagnosisRecord
//! ```

mod client;
mod config;
mod error;
mod orchestrator;

pub use client::{ClassificationService, HttpClassificationClient, RawPrediction};
pub use config::AnalysisConfig;
pub use error::{AnalysisError, AnalysisFailure, FailureKind};
pub use orchestrator::{AnalysisOrchestrator, AnalysisOutcome, AnalysisStatus, SubmitReport};
