// ==========================================
// 品质保证监控看板 - 记录归一化
// ==========================================
// 职责: 异构 JSON/CSV 记录 → 标准检测行 {timestamp, category, count, status}
// 流程:
//   1. 树模型 dump → 特征分裂频次（仅类别序列）
//   2. 定位数组（自身 / data / rows / 首个数组字段）
//   3. 类别计数型 vs 记录型 分别归一化
// ==========================================

use crate::domain::{
    CategoryEntry, InspectionRow, RowStatus, NORMAL_CATEGORY, OTHER_CATEGORY,
};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::{
    value_to_f64, value_to_text, CATEGORY_MARKER, CATEGORY_NAME, CATEGORY_VALUE,
    RECORD_CATEGORY, RECORD_COUNT, RECORD_STATUS, TIMESTAMP, TIME_MARKER,
};
use crate::importer::file_parser::RawRecord;
use crate::importer::tree_model;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde_json::Value;

/// 归一化结果
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedPayload {
    /// 树模型 dump：特征重要度序列（无时间、无不良率语义）
    FeatureImportance(Vec<CategoryEntry>),
    /// 标准检测行
    Rows(Vec<InspectionRow>),
}

/// 数组形态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayShape {
    /// [{name, value}] 且无时间字段
    CategoryCount,
    /// 带时间字段的记录
    Record,
}

// ==========================================
// RecordNormalizer
// ==========================================
pub struct RecordNormalizer {
    /// 类别计数型记录使用的"当前时间"（测试可固定）
    now: Option<NaiveDateTime>,
}

impl Default for RecordNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordNormalizer {
    pub fn new() -> Self {
        Self { now: None }
    }

    /// 固定"当前时间"
    pub fn with_clock(now: NaiveDateTime) -> Self {
        Self { now: Some(now) }
    }

    fn now(&self) -> NaiveDateTime {
        self.now.unwrap_or_else(|| Local::now().naive_local())
    }

    /// 归一化任意 JSON 载荷
    ///
    /// # 错误
    /// - NoArrayFound: 非树模型 dump 且找不到数组
    /// - NoUsableRecords: 数组中没有可用记录
    pub fn normalize_json(&self, json: &Value) -> ImportResult<NormalizedPayload> {
        if tree_model::looks_like_tree_dump(json) {
            match tree_model::extract_split_frequency(json) {
                Some(importance) if !importance.is_empty() => {
                    tracing::info!("识别为树模型 dump, 特征数: {}", importance.len());
                    return Ok(NormalizedPayload::FeatureImportance(importance));
                }
                _ => tracing::debug!("树模型 dump 无内部节点, 按普通 JSON 处理"),
            }
        }

        let items = pick_array(json).ok_or(ImportError::NoArrayFound)?;

        let rows = match classify_array(items) {
            ArrayShape::CategoryCount => self.rows_from_category_counts(items),
            ArrayShape::Record => self.rows_from_records(items),
        };

        if rows.is_empty() {
            return Err(ImportError::NoUsableRecords);
        }

        tracing::info!("JSON 归一化完成: {} / {} 行可用", rows.len(), items.len());
        Ok(NormalizedPayload::Rows(rows))
    }

    /// 归一化 CSV 记录（直接走记录型路径）
    pub fn normalize_csv(&self, records: &[RawRecord]) -> ImportResult<Vec<InspectionRow>> {
        let rows: Vec<InspectionRow> = records.iter().filter_map(normalize_record).collect();

        if rows.is_empty() {
            return Err(ImportError::NoUsableRecords);
        }

        let dropped = records.len() - rows.len();
        if dropped > 0 {
            tracing::debug!("CSV 归一化丢弃 {} 行（时间无法解析）", dropped);
        }
        Ok(rows)
    }

    /// 类别计数型：时间取当前时刻，只保留 count > 0
    pub fn rows_from_category_counts(&self, items: &[Value]) -> Vec<InspectionRow> {
        let now = self.now();

        items
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|obj| {
                let name = CATEGORY_NAME
                    .first_present(obj)
                    .and_then(value_to_text)
                    .map(|s| s.trim().to_string())
                    .unwrap_or_else(|| OTHER_CATEGORY.to_string());

                let value = CATEGORY_VALUE
                    .first_present(obj)
                    .and_then(value_to_f64)
                    .unwrap_or(0.0);

                let status = RowStatus::from_category(&name);
                let category = if name.is_empty() {
                    default_category(status)
                } else {
                    name
                };

                let count = if value > 0.0 { value.round() as u64 } else { 0 };
                (count > 0).then(|| InspectionRow::new(Some(now), category, count, status))
            })
            .collect()
    }

    /// 记录型：时间无法解析的行丢弃
    pub fn rows_from_records(&self, items: &[Value]) -> Vec<InspectionRow> {
        items
            .iter()
            .filter_map(Value::as_object)
            .filter_map(normalize_record)
            .collect()
    }
}

/// 单条记录型记录归一化；时间缺失或无法解析返回 None
fn normalize_record(record: &RawRecord) -> Option<InspectionRow> {
    let ts_text = TIMESTAMP.first_present(record).and_then(value_to_text)?;
    let timestamp = parse_timestamp(&ts_text)?;

    // count 缺失/无效/为 0 时按 1 件计
    let count = match RECORD_COUNT.first_present(record).and_then(value_to_f64) {
        Some(n) if n >= 1.0 => n.round() as u64,
        _ => 1,
    };

    let type_text = RECORD_CATEGORY
        .first_present(record)
        .and_then(value_to_text)
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    let status = match RECORD_STATUS.first_present(record).and_then(value_to_text) {
        Some(label) => RowStatus::from_label(&label),
        None => RowStatus::from_category(&type_text),
    };

    let category = if type_text.is_empty() {
        default_category(status)
    } else {
        type_text
    };

    Some(InspectionRow::new(Some(timestamp), category, count, status))
}

fn default_category(status: RowStatus) -> String {
    if status.is_normal() {
        NORMAL_CATEGORY.to_string()
    } else {
        OTHER_CATEGORY.to_string()
    }
}

/// 定位数组: 自身 → data → rows → 首个数组字段
pub fn pick_array(json: &Value) -> Option<&Vec<Value>> {
    match json {
        Value::Array(items) => Some(items),
        Value::Object(map) => map
            .get("data")
            .and_then(Value::as_array)
            .or_else(|| map.get("rows").and_then(Value::as_array))
            .or_else(|| map.values().find_map(Value::as_array)),
        _ => None,
    }
}

/// 按首元素判定数组形态
pub fn classify_array(items: &[Value]) -> ArrayShape {
    match items.first().and_then(Value::as_object) {
        Some(first) if CATEGORY_MARKER.is_present_in(first) && !TIME_MARKER.is_present_in(first) => {
            ArrayShape::CategoryCount
        }
        _ => ArrayShape::Record,
    }
}

/// 解析时间戳
///
/// 接受 "YYYY-MM-DD HH:mm"（空格替换为 T）、ISO-8601 本地时间、RFC 3339、纯日期
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let normalized = text.trim().replacen(' ', "T", 1);
    if normalized.is_empty() {
        return None;
    }

    const LOCAL_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];
    for fmt in LOCAL_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(&normalized, fmt) {
            return Some(ts);
        }
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(ts.with_timezone(&Local).naive_local());
    }

    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
