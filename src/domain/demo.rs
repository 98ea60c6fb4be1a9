// ==========================================
// 品质保证监控看板 - 内置演示数据
// ==========================================
// 用途: 未上传任何文件前的初始看板
// ==========================================

use crate::domain::inspection::{CategoryEntry, DashboardView, KpiSnapshot, RatePoint};

const DEMO_CATEGORIES: [(&str, f64); 8] = [
    ("정상", 6034.0),
    ("뒤틀림", 817.0),
    ("밀림", 941.0),
    ("도색불량", 417.0),
    ("오산", 421.0),
    ("찍힘", 604.0),
    ("이물질", 496.0),
    ("역삽", 836.0),
];

const DEMO_RATES: [(&str, f64); 8] = [
    ("15:31", 0.9),
    ("15:33", 0.4),
    ("15:35", 0.1),
    ("15:37", 2.3),
    ("15:39", 1.1),
    ("15:41", 1.2),
    ("15:43", 1.8),
    ("15:45", 1.6),
];

/// 演示看板视图
pub fn demo_view() -> DashboardView {
    let categories: Vec<CategoryEntry> = DEMO_CATEGORIES
        .iter()
        .map(|(name, value)| CategoryEntry::new(*name, *value))
        .collect();

    DashboardView {
        kpis: KpiSnapshot {
            total_inspections: 118_361,
            normal_count: 6_034,
            defect_count: 4_726,
            defect_rate_percent: 13,
            defect_ppm: KpiSnapshot::ppm_of(4_726, 118_361),
            critical_category: "뒤틀림".to_string(),
        },
        pie_data: categories.clone(),
        bar_data: categories,
        line_data: DEMO_RATES
            .iter()
            .map(|(time, rate)| RatePoint::new(*time, *rate))
            .collect(),
    }
}
