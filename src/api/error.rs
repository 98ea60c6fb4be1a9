// ==========================================
// 品质保证监控看板 - API层错误类型
// ==========================================
// 职责: 汇总导入/远程/配置错误，提供稳定错误码与前端错误响应
// ==========================================

use crate::config::ConfigError;
use crate::importer::ImportError;
use crate::predictor::RemoteError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 下层错误
    // ==========================================
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    // ==========================================
    // 业务错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("尚无上传数据")]
    NoData,

    #[error("未登录")]
    NotAuthenticated,

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 稳定错误码
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Import(ImportError::NoArrayFound) => "NO_ARRAY_FOUND",
            ApiError::Import(ImportError::NoUsableRecords) => "NO_USABLE_RECORDS",
            ApiError::Import(_) => "PARSE_FAILURE",
            ApiError::Remote(_) => "REMOTE_CALL_FAILURE",
            ApiError::Config(_) => "CONFIG_ERROR",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::NoData => "NO_DATA",
            ApiError::NotAuthenticated => "NOT_AUTHENTICATED",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::Other(_) => "OTHER_ERROR",
        }
    }

    /// 附加信息（服务端报告的缺失列）
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            ApiError::Remote(err) if !err.missing_columns().is_empty() => {
                Some(serde_json::json!({ "missing": err.missing_columns() }))
            }
            _ => None,
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

// ==========================================
// ErrorResponse - 返回给前端的错误响应
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,

    /// 错误消息
    pub message: String,

    /// 详细信息（可选）
    pub details: Option<serde_json::Value>,
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            details: err.details(),
        }
    }
}

/// 将ApiError转换为JSON字符串
pub fn map_api_error(err: &ApiError) -> String {
    serde_json::to_string(&ErrorResponse::from(err)).unwrap_or_else(|_| err.to_string())
}
