//! # 诊断分类器
//!
//! 把远端返回的 `(label, confidence)` 映射为可展示的诊断记录。纯函数，无副作用。

use serde::{Deserialize, Serialize};

use super::table::{DiagnosisTable, Severity};

/// 置信度 → 百分比：限制在 [0, 1]，NaN 视为 0，四舍五入。
pub fn confidence_percent(confidence: f64) -> u8 {
    if confidence.is_nan() {
        return 0;
    }
    (confidence.clamp(0.0, 1.0) * 100.0).round() as u8
}

/// 诊断记录，创建后不可变。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosisRecord {
    raw_label: String,
    confidence_percent: u8,
    severity: Severity,
    description: String,
    recommended_action: String,
    recognized: bool,
}

/// 按查找表分类。
pub fn classify(table: &DiagnosisTable, raw_label: &str, confidence: f64) -> DiagnosisRecord {
    let lookup = table.lookup(raw_label);
    if !lookup.recognized {
        log::warn!(
            "❓ 未识别的诊断标签: {} - 回退档位: {}",
            raw_label,
            lookup.entry.severity.as_str()
        );
    }

    DiagnosisRecord {
        raw_label: raw_label.to_string(),
        confidence_percent: confidence_percent(confidence),
        severity: lookup.entry.severity,
        description: lookup.entry.description.clone(),
        recommended_action: lookup.entry.recommended_action.clone(),
        recognized: lookup.recognized,
    }
}

impl DiagnosisRecord {
    pub fn raw_label(&self) -> &str {
        &self.raw_label
    }

    pub fn confidence_percent(&self) -> u8 {
        self.confidence_percent
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn recommended_action(&self) -> &str {
        &self.recommended_action
    }

    /// 标签是否命中查找表。
    pub fn recognized(&self) -> bool {
        self.recognized
    }

    /// 展示用标签：下划线换成空格。
    pub fn display_label(&self) -> String {
        self.raw_label.replace('_', " ")
    }

    pub fn severity_title(&self) -> &'static str {
        self.severity.title()
    }

    pub fn report(&self, bands: &ConfidenceBands) -> DiagnosisReport {
        DiagnosisReport {
            record: self.clone(),
            display_label: self.display_label(),
            severity_title: self.severity_title(),
            confidence_band: bands.band(self.confidence_percent),
            very_high_confidence: bands.is_very_high(self.confidence_percent),
        }
    }
}

/// 置信度分档（仅影响展示配色）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand {
    Strong,
    Moderate,
    Weak,
}

/// 分档阈值（百分比）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceBands {
    pub strong: u8,
    pub moderate: u8,
    pub very_high: u8,
}

impl Default for ConfidenceBands {
    fn default() -> Self {
        Self {
            strong: 80,
            moderate: 60,
            very_high: 90,
        }
    }
}

impl ConfidenceBands {
    pub fn band(&self, percent: u8) -> ConfidenceBand {
        if percent >= self.strong {
            ConfidenceBand::Strong
        } else if percent >= self.moderate {
            ConfidenceBand::Moderate
        } else {
            ConfidenceBand::Weak
        }
    }

    pub fn is_very_high(&self, percent: u8) -> bool {
        percent >= self.very_high
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.moderate > self.strong || self.strong > 100 || self.very_high > 100 {
            return Err(format!(
                "置信度分档无效：strong={} moderate={} very_high={}",
                self.strong, self.moderate, self.very_high
            ));
        }
        Ok(())
    }
}

/// 展示层使用的完整诊断报告。
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosisReport {
    #[serde(flatten)]
    pub record: DiagnosisRecord,
    pub display_label: String,
    pub severity_title: &'static str,
    pub confidence_band: ConfidenceBand,
    pub very_high_confidence: bool,
}
