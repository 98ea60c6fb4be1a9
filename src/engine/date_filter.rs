// ==========================================
// 品质保证监控看板 - 期间过滤
// ==========================================
// 纯函数: 选出时间落在 [start 00:00:00, end 23:59:59] 的行
// 无状态、幂等、不修改输入
// ==========================================

use crate::domain::InspectionRow;
use chrono::{NaiveDate, NaiveDateTime};

/// 期间闭区间边界
pub fn range_bounds(start: NaiveDate, end: NaiveDate) -> Option<(NaiveDateTime, NaiveDateTime)> {
    Some((start.and_hms_opt(0, 0, 0)?, end.and_hms_opt(23, 59, 59)?))
}

/// 按日期范围过滤（含首尾日），无时间的行不入选
pub fn filter_by_date(rows: &[InspectionRow], start: NaiveDate, end: NaiveDate) -> Vec<InspectionRow> {
    let Some((from, to)) = range_bounds(start, end) else {
        return Vec::new();
    };

    rows.iter()
        .filter(|row| matches!(row.timestamp, Some(ts) if ts >= from && ts <= to))
        .cloned()
        .collect()
}
