//! # 图片来源模块（source）
//!
//! ## 设计思路
//!
//! 把“文件选择 / 拖放 / 拍照”三条路径归一为单一的活动载荷，并管理可撤销的
//! 预览句柄。模块按职责拆分：
//!
//! - `file`：宿主交来的文件与拖放事件
//! - `payload`：活动载荷（只读视图）
//! - `preview`：预览注册表与缩略图生成
//! - `resolver`：单槽解析器，唯一的修改入口
//! - `config/error`：配置与错误
//!
//! ```text
//! ImageFile ──▶ ImageSourceResolver::install
//!                 ├─ 校验声明类型 / 体积
//!                 ├─ 撤销旧预览句柄
//!                 └─ PreviewRegistry::register ──▶ ImagePayload
//! ```

mod config;
mod error;
mod file;
mod payload;
mod preview;
mod resolver;

pub use config::SourceConfig;
pub use error::SourceError;
pub use file::{DropEvent, ImageFile};
pub use payload::{ImagePayload, PayloadId, PayloadOrigin, PayloadSummary};
pub use preview::{PreviewHandle, PreviewRegistry};
pub use resolver::ImageSourceResolver;
