// ==========================================
// 品质保证监控看板 - 远程预测服务客户端
// ==========================================
// 职责: 单行预测 / 整文件聚合 / 健康检查
// 说明: 不做重试与退避，失败直接上报，由调用方终止相应流程
// ==========================================

use crate::config::DashboardConfig;
use crate::domain::BatchSummary;
use crate::predictor::dto::{parse_batch_response, ErrorBody, Prediction};
use crate::predictor::error::{RemoteError, RemoteResult};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, warn};

// ==========================================
// PredictionService Trait
// ==========================================
#[async_trait]
pub trait PredictionService: Send + Sync {
    /// 单行预测：特征名 → 值
    async fn predict_row(&self, row: &Map<String, Value>) -> RemoteResult<Prediction>;

    /// 整文件聚合（multipart 上传）
    async fn aggregate_file(&self, file_name: &str, content: Vec<u8>) -> RemoteResult<BatchSummary>;

    /// 健康检查
    async fn health(&self) -> RemoteResult<bool>;
}

// ==========================================
// HttpPredictionService - reqwest 实现
// ==========================================
pub struct HttpPredictionService {
    http_client: reqwest::Client,
    predict_url: String,
    predict_file_url: String,
    health_url: String,
}

impl HttpPredictionService {
    pub fn new(config: &DashboardConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .user_agent(&config.user_agent)
            .build()
            .unwrap_or_else(|e| {
                warn!("HTTP 客户端构建失败, 使用默认配置: {}", e);
                reqwest::Client::new()
            });

        Self {
            http_client,
            predict_url: config.endpoint_url(&config.predict_path),
            predict_file_url: config.endpoint_url(&config.predict_file_path),
            health_url: config.endpoint_url(&config.health_path),
        }
    }

    /// 非成功状态码 → 错误（优先解析服务端错误体）
    async fn error_from_response(endpoint: &str, response: reqwest::Response) -> RemoteError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        warn!(endpoint, status, "远程服务返回非成功状态");
        match serde_json::from_str::<ErrorBody>(&body) {
            Ok(err) => err.into(),
            Err(_) => RemoteError::Status {
                endpoint: endpoint.to_string(),
                status,
                body,
            },
        }
    }
}

#[async_trait]
impl PredictionService for HttpPredictionService {
    async fn predict_row(&self, row: &Map<String, Value>) -> RemoteResult<Prediction> {
        let endpoint = self.predict_url.as_str();

        let response = self
            .http_client
            .post(endpoint)
            .json(row)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "实时预测请求失败");
                RemoteError::transport(endpoint, e)
            })?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(endpoint, response).await);
        }

        let prediction: Prediction = response
            .json()
            .await
            .map_err(|e| RemoteError::decode(endpoint, e))?;

        debug!(
            prediction = prediction.prediction,
            probability = prediction.probability,
            "实时预测完成"
        );
        Ok(prediction)
    }

    async fn aggregate_file(&self, file_name: &str, content: Vec<u8>) -> RemoteResult<BatchSummary> {
        let endpoint = self.predict_file_url.as_str();

        let part = Part::bytes(content)
            .file_name(file_name.to_string())
            .mime_str("text/csv")
            .map_err(|e| RemoteError::transport(endpoint, e))?;
        let form = Form::new().part("file", part);

        let response = self
            .http_client
            .post(endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "整文件聚合请求失败");
                RemoteError::transport(endpoint, e)
            })?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(endpoint, response).await);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| RemoteError::decode(endpoint, e))?;

        parse_batch_response(endpoint, body)
    }

    async fn health(&self) -> RemoteResult<bool> {
        let endpoint = self.health_url.as_str();

        let response = self
            .http_client
            .get(endpoint)
            .send()
            .await
            .map_err(|e| RemoteError::transport(endpoint, e))?;

        if !response.status().is_success() {
            return Ok(false);
        }

        let text = response
            .text()
            .await
            .map_err(|e| RemoteError::decode(endpoint, e))?;
        Ok(text.trim().eq_ignore_ascii_case("ok"))
    }
}
