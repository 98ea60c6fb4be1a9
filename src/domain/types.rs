// ==========================================
// 品质保证监控看板 - 领域类型定义
// ==========================================
// 职责: 检测状态、告警等级、回放状态等基础枚举
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 正常类别哨兵值（源数据约定）
pub const NORMAL_CATEGORY: &str = "정상";

/// 缺省类别（其他）
pub const OTHER_CATEGORY: &str = "기타";

/// 无关键不良类别时的占位符
pub const CRITICAL_PLACEHOLDER: &str = "-";

// ==========================================
// 检测状态 (Row Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    Normal,
    Defect,
}

impl RowStatus {
    /// 由类别推导状态：等于正常哨兵值为 Normal，否则 Defect
    pub fn from_category(category: &str) -> Self {
        if category == NORMAL_CATEGORY {
            RowStatus::Normal
        } else {
            RowStatus::Defect
        }
    }

    /// 解析显式状态字段
    ///
    /// 接受 "정상" / "normal" / "ok"（不区分大小写）为正常，其余一律视为不良
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();
        if trimmed == NORMAL_CATEGORY
            || trimmed.eq_ignore_ascii_case("normal")
            || trimmed.eq_ignore_ascii_case("ok")
        {
            RowStatus::Normal
        } else {
            RowStatus::Defect
        }
    }

    pub fn is_normal(&self) -> bool {
        matches!(self, RowStatus::Normal)
    }
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowStatus::Normal => write!(f, "normal"),
            RowStatus::Defect => write!(f, "defect"),
        }
    }
}

// ==========================================
// 告警等级 (Severity)
// ==========================================
// 依据: 发生序号分级 1-2 低 / 3-4 中 / 5+ 高
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// 按插入时的发生序号分级
    pub fn from_occurrence(index: usize) -> Self {
        match index {
            i if i >= 5 => Severity::High,
            3 | 4 => Severity::Medium,
            _ => Severity::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 实时回放状态 (Stream Status)
// ==========================================
// Idle → Streaming → (Idle | Failed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamStatus {
    /// 未回放 / 正常结束
    Idle,
    /// 回放中
    Streaming,
    /// 因错误停止
    Failed,
}

impl StreamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamStatus::Idle => "IDLE",
            StreamStatus::Streaming => "STREAMING",
            StreamStatus::Failed => "FAILED",
        }
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, StreamStatus::Streaming)
    }
}

impl fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_category() {
        assert_eq!(RowStatus::from_category("정상"), RowStatus::Normal);
        assert_eq!(RowStatus::from_category("뒤틀림"), RowStatus::Defect);
        assert_eq!(RowStatus::from_category(OTHER_CATEGORY), RowStatus::Defect);
    }

    #[test]
    fn test_status_from_label() {
        assert_eq!(RowStatus::from_label(" 정상 "), RowStatus::Normal);
        assert_eq!(RowStatus::from_label("NORMAL"), RowStatus::Normal);
        assert_eq!(RowStatus::from_label("불량"), RowStatus::Defect);
    }

    #[test]
    fn test_severity_tiers() {
        assert_eq!(Severity::from_occurrence(1), Severity::Low);
        assert_eq!(Severity::from_occurrence(2), Severity::Low);
        assert_eq!(Severity::from_occurrence(3), Severity::Medium);
        assert_eq!(Severity::from_occurrence(4), Severity::Medium);
        assert_eq!(Severity::from_occurrence(5), Severity::High);
        assert_eq!(Severity::from_occurrence(11), Severity::High);
    }

    #[test]
    fn test_stream_status_serialization() {
        let json = serde_json::to_string(&StreamStatus::Failed).unwrap();
        assert_eq!(json, "\"FAILED\"");
    }
}
