//! # 叶片诊断：库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │              展示层（宿主界面 / 命令行 cli）              │
//! │        只读取 DiagnosisView，只调用服务操作               │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↕ Result<T, AppError>
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕          service::DiagnosisService               │
//! │                                                          │
//! │  ┌─ capture ──── 摄像头状态机 + RAII 会话 + JPEG 编码     │
//! │  │                                                       │
//! │  ├─ source ───── 单槽图片载荷 + 可撤销预览句柄            │
//! │  │                                                       │
//! │  ├─ analysis ─── 单请求编排 + multipart 分类客户端        │
//! │  │                                                       │
//! │  ├─ diagnosis ── 标签 → 严重度 / 描述 / 建议              │
//! │  │                                                       │
//! │  ├─ config / settings  默认值 · JSON 设置 · 环境变量      │
//! │  └─ error ────── AppError (统一错误类型)                  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError` |
//! | [`capture`] | 摄像头开启 / 切换 / 拍照 / 关闭，任意时刻最多一条视频流 |
//! | [`source`] | 文件选择、拖放、拍照三条路径归一为单一活动载荷 |
//! | [`diagnosis`] | 诊断查找表与分类器 |
//! | [`analysis`] | 提交图片到远端分类器，丢弃过期响应 |
//! | [`service`] | 组合以上组件，保证选择效果先于提交可见 |
//! | [`config`] / [`settings`] | 应用配置与设置文件加载 |
//! | [`cli`] | 命令行前端 |

pub mod analysis;
pub mod capture;
pub mod cli;
pub mod config;
pub mod diagnosis;
pub mod error;
pub mod service;
pub mod settings;
pub mod source;

pub use config::AppConfig;
pub use error::AppError;
pub use service::{DiagnosisService, DiagnosisView};
