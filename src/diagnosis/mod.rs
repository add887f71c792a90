//! # 诊断模块（diagnosis）
//!
//! - `table`：标签 → {严重度, 描述, 建议} 的不可变查找表
//! - `classifier`：把远端预测转换为诊断记录与展示报告

mod classifier;
mod table;

pub use classifier::{
    ConfidenceBand, ConfidenceBands, DiagnosisRecord, DiagnosisReport, classify,
    confidence_percent,
};
pub use table::{
    DiagnosisEntry, DiagnosisTable, EARLY_BLIGHT, Fallback, HEALTHY, LATE_BLIGHT, Lookup, NO_LEAF,
    Severity, TableError,
};
