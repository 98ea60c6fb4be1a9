// ==========================================
// 品质保证监控看板 - 聚合器
// ==========================================
// 职责: 检测行集合 → KPI 快照 + 类别序列（饼/柱共用） + 分钟不良率序列
// 规则:
//   - 计数累加封顶于 u64::MAX
//   - total = Σcount, normal = Σcount(status=正常), defect = total - normal
//   - 不良率% = round(defect / total × 100)，total=0 时为 0
//   - 关键不良类别 = 降序第一个非正常类别；同值按首次出现顺序
//   - 分钟序列按 "HH:MM" 升序，rate = 桶内不良/桶内合计，保留 2 位小数
// ==========================================

use crate::domain::{
    CategoryEntry, DashboardView, InspectionRow, KpiSnapshot, RatePoint, CRITICAL_PLACEHOLDER,
    NORMAL_CATEGORY,
};
use std::collections::{BTreeMap, HashMap};

pub struct Aggregator;

impl Aggregator {
    /// 完整聚合：KPI + 饼/柱 + 折线
    pub fn aggregate(rows: &[InspectionRow]) -> DashboardView {
        if rows.is_empty() {
            return DashboardView::empty();
        }

        let totals = Self::category_totals(rows);
        let kpis = Self::kpis_from(rows, &totals);
        let series: Vec<CategoryEntry> = totals
            .into_iter()
            .map(|(name, value)| CategoryEntry::new(name, value as f64))
            .collect();

        DashboardView {
            kpis,
            pie_data: series.clone(),
            bar_data: series,
            line_data: Self::minute_rates(rows),
        }
    }

    /// 仅计算 KPI
    pub fn kpis(rows: &[InspectionRow]) -> KpiSnapshot {
        if rows.is_empty() {
            return KpiSnapshot::zeroed();
        }
        let totals = Self::category_totals(rows);
        Self::kpis_from(rows, &totals)
    }

    fn kpis_from(rows: &[InspectionRow], sorted_totals: &[(String, u64)]) -> KpiSnapshot {
        let total = saturating_total(rows.iter());
        let normal = saturating_total(rows.iter().filter(|r| r.status.is_normal()));
        let defect = total.saturating_sub(normal);

        let defect_rate_percent = if total == 0 {
            0
        } else {
            (defect as f64 / total as f64 * 100.0).round() as u32
        };

        let critical_category = sorted_totals
            .iter()
            .find(|(name, _)| name != NORMAL_CATEGORY)
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| CRITICAL_PLACEHOLDER.to_string());

        KpiSnapshot {
            total_inspections: total,
            normal_count: normal,
            defect_count: defect,
            defect_rate_percent,
            defect_ppm: KpiSnapshot::ppm_of(defect, total),
            critical_category,
        }
    }

    /// 类别合计（含正常），按值降序；同值保持首次出现顺序
    pub fn category_totals(rows: &[InspectionRow]) -> Vec<(String, u64)> {
        let mut order: Vec<(String, u64)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for row in rows {
            match index.get(&row.category) {
                Some(&i) => order[i].1 = order[i].1.saturating_add(row.count),
                None => {
                    index.insert(row.category.clone(), order.len());
                    order.push((row.category.clone(), row.count));
                }
            }
        }

        // sort_by 为稳定排序
        order.sort_by(|a, b| b.1.cmp(&a.1));
        order
    }

    /// 分钟粒度不良率
    pub fn minute_rates(rows: &[InspectionRow]) -> Vec<RatePoint> {
        // "HH:MM" → (不良, 合计)
        let mut buckets: BTreeMap<String, (u64, u64)> = BTreeMap::new();

        for row in rows {
            let Some(ts) = row.timestamp else {
                continue;
            };
            let entry = buckets.entry(ts.format("%H:%M").to_string()).or_insert((0, 0));
            entry.1 = entry.1.saturating_add(row.count);
            if !row.status.is_normal() {
                entry.0 = entry.0.saturating_add(row.count);
            }
        }

        buckets
            .into_iter()
            .map(|(time, (defect, total))| {
                let rate = if total == 0 {
                    0.0
                } else {
                    round2(defect as f64 / total as f64)
                };
                RatePoint::new(time, rate)
            })
            .collect()
    }
}

/// 计数合计；超出 u64 范围时封顶
fn saturating_total<'a>(rows: impl Iterator<Item = &'a InspectionRow>) -> u64 {
    rows.fold(0u64, |acc, r| acc.saturating_add(r.count))
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
