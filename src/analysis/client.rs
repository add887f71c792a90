//! # 分类服务客户端
//!
//! ## 设计思路
//!
//! 远端分类器被抽象为 `ClassificationService`：输入一张图片，输出原始
//! `(label, confidence)`。编排器只依赖 trait，测试可替换为脚本化实现。
//!
//! ## 实现思路
//!
//! - HTTP 实现以 multipart 表单上传单个文件字段，单次尝试，不重试。
//! - 非 2xx、响应体不可解析都视为传输失败；后端返回的 `{"error": ...}`
//!   只写入日志。

use std::time::{Duration, Instant};

use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::{AnalysisConfig, AnalysisError, FailureKind};
use crate::source::ImagePayload;

/// 远端返回的原始预测。
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawPrediction {
    pub label: String,
    pub confidence: f64,
}

/// 图片分类服务。
#[allow(async_fn_in_trait)]
pub trait ClassificationService {
    async fn classify(&self, payload: &ImagePayload) -> Result<RawPrediction, AnalysisError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// 基于 reqwest 的 HTTP 分类客户端。
#[derive(Debug, Clone)]
pub struct HttpClassificationClient {
    client: reqwest::Client,
    endpoint: reqwest::Url,
    field_name: String,
}

impl HttpClassificationClient {
    pub fn new(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let endpoint = reqwest::Url::parse(&config.endpoint)
            .map_err(|e| AnalysisError::InvalidConfig(format!("接口地址无效：{}", e)))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(AnalysisError::InvalidConfig(format!(
                "不支持的协议：{}",
                endpoint.scheme()
            )));
        }

        let mut builder =
            reqwest::Client::builder().connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| AnalysisError::InvalidConfig(format!("无法创建 HTTP 客户端：{}", e)))?;

        Ok(Self {
            client,
            endpoint,
            field_name: config.field_name.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    fn map_reqwest_error(e: reqwest::Error) -> AnalysisError {
        if e.is_timeout() {
            AnalysisError::transport(FailureKind::Timeout, format!("请求超时：{}", e))
        } else if e.is_connect() {
            AnalysisError::transport(FailureKind::Network, format!("无法连接：{}", e))
        } else {
            AnalysisError::transport(FailureKind::Network, format!("请求失败：{}", e))
        }
    }
}

impl ClassificationService for HttpClassificationClient {
    async fn classify(&self, payload: &ImagePayload) -> Result<RawPrediction, AnalysisError> {
        let part = Part::bytes(payload.bytes().to_vec())
            .file_name(payload.file_name().to_string())
            .mime_str(payload.mime_type())
            .map_err(|e| {
                AnalysisError::transport(FailureKind::InvalidRequest, format!("MIME 类型无效：{}", e))
            })?;
        let form = Form::new().part(self.field_name.clone(), part);

        let started = Instant::now();
        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(Self::map_reqwest_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(Self::map_reqwest_error)?;
        log::info!(
            "⏱️ 分类接口响应 - HTTP {} ({} bytes, {}ms)",
            status.as_u16(),
            body.len(),
            started.elapsed().as_millis()
        );

        if !status.is_success() {
            let detail = serde_json::from_slice::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
            return Err(AnalysisError::transport(
                FailureKind::HttpStatus(status.as_u16()),
                detail,
            ));
        }

        let prediction: RawPrediction = serde_json::from_slice(&body).map_err(|e| {
            AnalysisError::transport(FailureKind::MalformedResponse, format!("响应解析失败：{}", e))
        })?;
        if !prediction.confidence.is_finite() {
            return Err(AnalysisError::transport(
                FailureKind::MalformedResponse,
                "置信度不是有限数值",
            ));
        }

        Ok(prediction)
    }
}
