// ==========================================
// 品质保证监控看板 - 检测记录与 KPI 领域模型
// ==========================================
// 职责: 归一化检测行、KPI 快照、图表序列
// 生命周期: 每次上传/期间查询整体重算，不做增量更新
// ==========================================

use crate::domain::types::{RowStatus, CRITICAL_PLACEHOLDER};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// InspectionRow - 归一化检测行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionRow {
    pub timestamp: Option<NaiveDateTime>, // 检测时间（批量路径必有）
    pub category: String,                 // 不良类别 / 正常
    pub count: u64,                       // 件数
    pub status: RowStatus,                // 正常 / 不良
}

impl InspectionRow {
    pub fn new(
        timestamp: Option<NaiveDateTime>,
        category: impl Into<String>,
        count: u64,
        status: RowStatus,
    ) -> Self {
        Self {
            timestamp,
            category: category.into(),
            count,
            status,
        }
    }
}

// ==========================================
// KpiSnapshot - KPI 快照
// ==========================================
// 不变量: defect_count = total_inspections - normal_count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiSnapshot {
    pub total_inspections: u64,
    pub normal_count: u64,
    pub defect_count: u64,
    pub defect_rate_percent: u32,
    /// 百万分率不良数 (PPM)
    pub defect_ppm: u64,
    pub critical_category: String,
}

impl KpiSnapshot {
    /// 全零快照（空数据集）
    pub fn zeroed() -> Self {
        Self {
            total_inspections: 0,
            normal_count: 0,
            defect_count: 0,
            defect_rate_percent: 0,
            defect_ppm: 0,
            critical_category: CRITICAL_PLACEHOLDER.to_string(),
        }
    }

    /// 百万分率；total=0 时为 0
    pub fn ppm_of(defect: u64, total: u64) -> u64 {
        if total == 0 {
            return 0;
        }
        (defect as f64 / total as f64 * 1_000_000.0).round() as u64
    }
}

impl Default for KpiSnapshot {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// 类别序列项（饼图/柱状图共用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub name: String,
    pub value: f64,
}

impl CategoryEntry {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// 分钟粒度不良率点 {time: "HH:MM", rate}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatePoint {
    pub time: String,
    pub rate: f64,
}

impl RatePoint {
    pub fn new(time: impl Into<String>, rate: f64) -> Self {
        Self {
            time: time.into(),
            rate,
        }
    }
}

// ==========================================
// DashboardView - 批量路径看板视图
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub kpis: KpiSnapshot,
    pub pie_data: Vec<CategoryEntry>,
    pub bar_data: Vec<CategoryEntry>,
    pub line_data: Vec<RatePoint>,
}

impl DashboardView {
    /// 空视图：零 KPI + 空序列
    pub fn empty() -> Self {
        Self {
            kpis: KpiSnapshot::zeroed(),
            pie_data: Vec::new(),
            bar_data: Vec::new(),
            line_data: Vec::new(),
        }
    }

    /// 特征重要度视图（树模型 dump 上传）
    ///
    /// KPI 只反映特征个数与首位特征，不含不良率语义
    pub fn from_feature_importance(importance: Vec<CategoryEntry>) -> Self {
        let critical = importance
            .first()
            .map(|e| e.name.clone())
            .unwrap_or_else(|| CRITICAL_PLACEHOLDER.to_string());

        Self {
            kpis: KpiSnapshot {
                total_inspections: importance.len() as u64,
                normal_count: 0,
                defect_count: 0,
                defect_rate_percent: 0,
                defect_ppm: 0,
                critical_category: critical,
            },
            pie_data: importance.clone(),
            bar_data: importance,
            line_data: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ppm() {
        assert_eq!(KpiSnapshot::ppm_of(4_726, 118_361), 39_929);
        assert_eq!(KpiSnapshot::ppm_of(3, 0), 0);
        assert_eq!(KpiSnapshot::zeroed().defect_ppm, 0);
    }

    #[test]
    fn test_kpi_serializes_camel_case() {
        let json = serde_json::to_value(KpiSnapshot::zeroed()).unwrap();
        assert_eq!(json["totalInspections"], 0);
        assert_eq!(json["criticalCategory"], "-");
        assert_eq!(json["defectPpm"], 0);
    }

    #[test]
    fn test_feature_importance_view() {
        let view = DashboardView::from_feature_importance(vec![
            CategoryEntry::new("EX1.MELT_TEMP", 0.6),
            CategoryEntry::new("EX1.MD_PV", 0.4),
        ]);
        assert_eq!(view.kpis.total_inspections, 2);
        assert_eq!(view.kpis.critical_category, "EX1.MELT_TEMP");
        assert_eq!(view.pie_data, view.bar_data);
        assert!(view.line_data.is_empty());

        let empty = DashboardView::from_feature_importance(Vec::new());
        assert_eq!(empty.kpis.critical_category, CRITICAL_PLACEHOLDER);
    }
}
