//! # 诊断查找表
//!
//! ## 设计思路
//!
//! 标签 → {严重度, 描述, 建议} 的映射是一份不可变配置，而不是散落在代码里的全局常量。
//! 内置表覆盖远端分类器会返回的全部标签；替代表可从 JSON 加载，便于测试与定制。
//!
//! ## 未识别标签
//!
//! 默认回退到 `healthy` 条目，记录上的 `recognized` 仍为 `false`，调用方可据此区分。
//! 如需把未知结果单独标出，可显式设置 `Fallback::Unknown`。

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

pub const HEALTHY: &str = "healthy";
pub const EARLY_BLIGHT: &str = "early_blight";
pub const LATE_BLIGHT: &str = "late_blight";
/// 图片中未检测到叶片。
pub const NO_LEAF: &str = "no_leaf";

/// 严重度档位，驱动展示层的配色与紧急程度。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Healthy,
    Warning,
    Danger,
    /// 仅用于未识别标签的回退，表项中不允许出现。
    Unknown,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Warning => "warning",
            Self::Danger => "danger",
            Self::Unknown => "unknown",
        }
    }

    /// 展示标题。
    pub fn title(self) -> &'static str {
        match self {
            Self::Healthy => "Healthy Plant",
            Self::Warning => "Moderate Risk",
            Self::Danger => "Critical Alert",
            Self::Unknown => "Unrecognized Result",
        }
    }
}

/// 表项：固定的严重度、描述与建议措施。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisEntry {
    pub severity: Severity,
    pub description: String,
    #[serde(alias = "treatment")]
    pub recommended_action: String,
}

impl DiagnosisEntry {
    fn new(severity: Severity, description: &str, recommended_action: &str) -> Self {
        Self {
            severity,
            description: description.to_string(),
            recommended_action: recommended_action.to_string(),
        }
    }
}

/// 未识别标签的回退策略。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "label")]
pub enum Fallback {
    /// 回退到独立的 `Unknown` 档位。
    Unknown,
    /// 回退到表中某个已有条目。
    Entry(String),
}

/// 查找表加载/校验错误。
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("诊断表读取失败：{0}")]
    Io(#[from] std::io::Error),

    #[error("诊断表解析失败：{0}")]
    Parse(#[from] serde_json::Error),

    #[error("诊断表无效：{0}")]
    Invalid(String),
}

/// 一次查找的结果。
#[derive(Debug, Clone, Copy)]
pub struct Lookup<'a> {
    pub entry: &'a DiagnosisEntry,
    /// 标签是否在表中。
    pub recognized: bool,
}

#[derive(Debug, Deserialize)]
struct TableFile {
    entries: HashMap<String, DiagnosisEntry>,
    #[serde(default)]
    fallback: Option<Fallback>,
}

/// 不可变诊断查找表。
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosisTable {
    entries: HashMap<String, DiagnosisEntry>,
    fallback: Fallback,
    unknown: DiagnosisEntry,
}

static BUILTIN: Lazy<DiagnosisTable> = Lazy::new(|| {
    let entries = HashMap::from([
        (
            HEALTHY.to_string(),
            DiagnosisEntry::new(
                Severity::Healthy,
                "The potato plant appears healthy with no visible signs of disease. The leaf shows normal coloration and structure.",
                "Continue regular care and monitoring. Maintain proper watering schedule, ensure adequate nutrition, and inspect regularly for early signs of disease.",
            ),
        ),
        (
            EARLY_BLIGHT.to_string(),
            DiagnosisEntry::new(
                Severity::Warning,
                "Early blight is caused by the fungus Alternaria solani. It typically affects older leaves first, causing dark spots with concentric rings (target-like pattern).",
                "Apply appropriate fungicides immediately. Remove and destroy infected leaves. Improve air circulation around plants. Practice crop rotation and avoid overhead watering. Monitor closely for spread.",
            ),
        ),
        (
            LATE_BLIGHT.to_string(),
            DiagnosisEntry::new(
                Severity::Danger,
                "Late blight is caused by Phytophthora infestans and can rapidly destroy entire crops within days. This is the same disease that caused the Irish Potato Famine.",
                "URGENT: Apply fungicides immediately. Remove and destroy all infected plants. This disease spreads rapidly in cool, wet conditions. Consider emergency harvest of unaffected tubers. Implement strict quarantine measures.",
            ),
        ),
        (
            NO_LEAF.to_string(),
            DiagnosisEntry::new(
                Severity::Danger,
                "No potato leaf was detected in the image. Please ensure a potato leaf fills the majority of the picture area, with clear focus and lighting.",
                "Try capturing a clear, close-up image of only the leaf, with minimal background and good lighting.",
            ),
        ),
    ]);

    DiagnosisTable {
        entries,
        fallback: Fallback::Entry(HEALTHY.to_string()),
        unknown: unknown_entry(),
    }
});

fn unknown_entry() -> DiagnosisEntry {
    DiagnosisEntry::new(
        Severity::Unknown,
        "The analysis service returned a result this application does not recognize, so no diagnosis can be given for it.",
        "Retake the photo of a single leaf in good lighting and try again. If the result persists, consult a local agronomist.",
    )
}

impl Default for DiagnosisTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl DiagnosisTable {
    /// 内置表（healthy / early_blight / late_blight / no_leaf）。
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// 由条目构建新表并校验。
    pub fn new(
        entries: HashMap<String, DiagnosisEntry>,
        fallback: Fallback,
    ) -> Result<Self, TableError> {
        let table = Self {
            entries,
            fallback,
            unknown: unknown_entry(),
        };
        table.validate()?;
        Ok(table)
    }

    /// 从 JSON 文本加载替代表。
    ///
    /// ```json
    /// { "entries": { "healthy": { "severity": "healthy", "description": "...", "treatment": "..." } },
    ///   "fallback": { "kind": "unknown" } }
    /// ```
    ///
    /// 省略 `fallback` 时：表中有 `healthy` 条目则回退到它，否则回退到 `Unknown`。
    pub fn from_json(text: &str) -> Result<Self, TableError> {
        let file: TableFile = serde_json::from_str(text)?;
        let fallback = file.fallback.unwrap_or_else(|| {
            if file.entries.contains_key(HEALTHY) {
                Fallback::Entry(HEALTHY.to_string())
            } else {
                Fallback::Unknown
            }
        });
        Self::new(file.entries, fallback)
    }

    /// 从 JSON 文件加载替代表。
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let table = Self::from_json(&text)?;
        log::info!(
            "📚 已加载诊断表 - 路径: {} 条目: {}",
            path.display(),
            table.entries.len()
        );
        Ok(table)
    }

    /// 替换回退策略。
    pub fn with_fallback(mut self, fallback: Fallback) -> Result<Self, TableError> {
        self.fallback = fallback;
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), TableError> {
        if self.entries.is_empty() {
            return Err(TableError::Invalid("至少需要一个条目".to_string()));
        }
        if let Some((label, _)) = self
            .entries
            .iter()
            .find(|(_, entry)| entry.severity == Severity::Unknown)
        {
            return Err(TableError::Invalid(format!(
                "条目 {} 不能使用 unknown 严重度",
                label
            )));
        }
        if let Fallback::Entry(label) = &self.fallback {
            if !self.entries.contains_key(label) {
                return Err(TableError::Invalid(format!("回退条目 {} 不在表中", label)));
            }
        }
        Ok(())
    }

    pub fn fallback(&self) -> &Fallback {
        &self.fallback
    }

    /// 表中全部标签（排序后）。
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        labels.sort_unstable();
        labels
    }

    pub fn entry(&self, label: &str) -> Option<&DiagnosisEntry> {
        self.entries.get(label)
    }

    /// 查找标签；未命中时按回退策略返回。
    pub fn lookup(&self, label: &str) -> Lookup<'_> {
        if let Some(entry) = self.entries.get(label) {
            return Lookup {
                entry,
                recognized: true,
            };
        }

        let entry = match &self.fallback {
            Fallback::Unknown => &self.unknown,
            // validate 保证回退条目存在
            Fallback::Entry(fallback) => self.entries.get(fallback).unwrap_or(&self.unknown),
        };
        Lookup {
            entry,
            recognized: false,
        }
    }
}
