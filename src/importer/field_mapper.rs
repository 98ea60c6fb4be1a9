// ==========================================
// 品质保证监控看板 - 字段别名映射
// ==========================================
// 职责: 逻辑字段 → 候选列名（按优先级）→ 首个存在的值
// 说明: 同一逻辑字段在不同来源的写法（大小写、前导空格、韩文列名）不同
// ==========================================

use crate::importer::file_parser::RawRecord;
use serde_json::Value;

/// 逻辑字段及其候选列名（按优先级排列）
#[derive(Debug, Clone, Copy)]
pub struct FieldAlias {
    pub name: &'static str,
    pub candidates: &'static [&'static str],
}

impl FieldAlias {
    pub const fn new(name: &'static str, candidates: &'static [&'static str]) -> Self {
        Self { name, candidates }
    }

    /// 返回首个存在且非 null 的值
    pub fn first_present<'a>(&self, record: &'a RawRecord) -> Option<&'a Value> {
        self.candidates
            .iter()
            .filter_map(|key| record.get(*key))
            .find(|v| !v.is_null())
    }

    /// 返回首个存在且非空白的文本值（数值转为字符串）
    pub fn first_text(&self, record: &RawRecord) -> Option<String> {
        self.candidates
            .iter()
            .filter_map(|key| record.get(*key))
            .filter_map(value_to_text)
            .map(|s| s.trim().to_string())
            .find(|s| !s.is_empty())
    }

    /// 是否有任一候选列存在
    pub fn is_present_in(&self, record: &RawRecord) -> bool {
        self.candidates.iter().any(|key| record.contains_key(*key))
    }
}

/// 标量值转文本；对象/数组/null 返回 None
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// 标量值转数值；字符串按去空白后的十进制解析，非有限值视为无效
pub fn value_to_f64(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

// ==========================================
// 记录型数组字段
// ==========================================

/// 时间戳
pub const TIMESTAMP: FieldAlias = FieldAlias::new(
    "timestamp",
    &[
        "timestamp", "Timestamp", "TIMESTAMP", "time", "Time", "TIME", "date", "Date", "DATE",
        "생산일시",
    ],
);

/// 件数
pub const RECORD_COUNT: FieldAlias = FieldAlias::new("count", &["count", "qty"]);

/// 不良类别（status 作为最后的候选）
pub const RECORD_CATEGORY: FieldAlias =
    FieldAlias::new("category", &["defect_type", "type", "item", "status"]);

/// 显式状态
pub const RECORD_STATUS: FieldAlias = FieldAlias::new("status", &["status"]);

// ==========================================
// 类别计数型数组字段
// ==========================================

pub const CATEGORY_NAME: FieldAlias =
    FieldAlias::new("name", &["name", "type", "item", "defect_type"]);

pub const CATEGORY_VALUE: FieldAlias = FieldAlias::new("value", &["value", "count", "qty"]);

/// 识别类别计数型数组的标志列
pub const CATEGORY_MARKER: FieldAlias = FieldAlias::new("category_marker", &["name", "value"]);

/// 识别记录型数组的时间列
pub const TIME_MARKER: FieldAlias = FieldAlias::new("time_marker", &["timestamp", "time", "date"]);

// ==========================================
// 实时回放字段
// ==========================================

/// 产品标识（CSV 表头可能带前导空格）
pub const PRODUCT_ID: FieldAlias = FieldAlias::new(
    "product_id",
    &[" PRODUCT_ID", "PRODUCT_ID", "product_id", " NUM", "NUM", "num"],
);
