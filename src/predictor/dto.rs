// ==========================================
// 品质保证监控看板 - 远程服务 DTO
// ==========================================
// /predict       → {prediction, label, probability}
// /predict_file  → {kpis, donutData, rateData, headData, screwData} | {error, missing}
// ==========================================

use crate::domain::{BatchSummary, CategoryEntry, RatePoint};
use crate::predictor::error::RemoteError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 正类（不良）预测值
pub const POSITIVE_CLASS: u8 = 1;

/// 单行预测结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub prediction: u8,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub probability: f64,
}

impl Prediction {
    pub fn is_positive(&self) -> bool {
        self.prediction == POSITIVE_CLASS
    }
}

/// 服务端错误体
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default)]
    pub missing: Vec<String>,
}

impl From<ErrorBody> for RemoteError {
    fn from(body: ErrorBody) -> Self {
        RemoteError::Rejected {
            error: body.error,
            missing: body.missing,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteKpis {
    #[serde(default)]
    total_inspects: u64,
    #[serde(default)]
    normal_count: u64,
    #[serde(default)]
    defect_total: u64,
    #[serde(default)]
    defect_rate_pct: f64,
    #[serde(default)]
    critical_defect: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchResponse {
    #[serde(default)]
    kpis: Option<RemoteKpis>,
    #[serde(default)]
    donut_data: Vec<CategoryEntry>,
    #[serde(default)]
    rate_data: Vec<RatePoint>,
}

/// 解析整文件聚合响应
///
/// 含 `error` 字段时视为服务端拒绝
pub fn parse_batch_response(endpoint: &str, body: Value) -> Result<BatchSummary, RemoteError> {
    if body.get("error").is_some() {
        let err: ErrorBody =
            serde_json::from_value(body).map_err(|e| RemoteError::decode(endpoint, e))?;
        return Err(err.into());
    }

    let resp: BatchResponse =
        serde_json::from_value(body).map_err(|e| RemoteError::decode(endpoint, e))?;
    let kpis = resp.kpis.unwrap_or_default();

    Ok(BatchSummary {
        total_inspects: kpis.total_inspects,
        normal_count: kpis.normal_count,
        defect_total: kpis.defect_total,
        defect_rate_pct: kpis.defect_rate_pct,
        critical_defect: kpis.critical_defect,
        donut_data: resp.donut_data,
        rate_data: resp.rate_data,
    })
}
