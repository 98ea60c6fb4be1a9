// ==========================================
// 品质保证监控看板 - 实时回放领域模型
// ==========================================
// 职责: 回放点、工艺区快照、告警事件、告警区间、实时面板
// ==========================================

use crate::domain::inspection::{CategoryEntry, RatePoint};
use crate::domain::types::{Severity, StreamStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 回放点 {name, predictedValue, alarmFlag}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamPoint {
    pub name: String,
    pub predicted_value: u8,
    pub alarm_flag: Option<u8>,
}

impl StreamPoint {
    pub fn new(name: impl Into<String>, predicted_value: u8) -> Self {
        let predicted_value = if predicted_value == 1 { 1 } else { 0 };
        Self {
            name: name.into(),
            predicted_value,
            alarm_flag: (predicted_value == 1).then_some(1),
        }
    }

    pub fn is_alarm(&self) -> bool {
        self.predicted_value == 1
    }
}

/// 工艺区（压出头/螺杆）数值快照，按产品标签对齐
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSnapshot {
    pub time: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, Option<f64>>,
}

/// 告警事件
///
/// occurrence_index 在插入时确定，决定告警等级，之后不再变化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEvent {
    pub product_id: String,
    pub occurrence_index: usize,
    pub timestamp_ms: i64,
    pub severity: Severity,
}

impl AlertEvent {
    pub fn new(product_id: impl Into<String>, occurrence_index: usize, timestamp_ms: i64) -> Self {
        Self {
            product_id: product_id.into(),
            occurrence_index,
            timestamp_ms,
            severity: Severity::from_occurrence(occurrence_index),
        }
    }
}

/// 告警区间：连续正类预测的首尾标签（仅用于高亮）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmSegment {
    pub from: String,
    pub to: String,
}

/// 远程整文件聚合结果（供类别/KPI 面板）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total_inspects: u64,
    pub normal_count: u64,
    pub defect_total: u64,
    pub defect_rate_pct: f64,
    pub critical_defect: String,
    pub donut_data: Vec<CategoryEntry>,
    pub rate_data: Vec<RatePoint>,
}

// ==========================================
// LiveBoard - 实时面板快照（只读视图）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveBoard {
    pub session_id: Option<String>,
    pub source_name: String,
    pub status: StreamStatus,
    pub last_error: Option<String>,
    pub processed_rows: usize,
    pub skipped_rows: usize,
    pub total_rows: usize,
    pub cumulative_defects: u64,
    pub risk_mode: bool,
    pub stream_series: Vec<StreamPoint>,
    pub head_series: Vec<ZoneSnapshot>,
    pub screw_series: Vec<ZoneSnapshot>,
    pub alerts: Vec<AlertEvent>,
    pub alarm_segments: Vec<AlarmSegment>,
    pub batch_summary: Option<BatchSummary>,
}
