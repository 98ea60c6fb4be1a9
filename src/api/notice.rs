// ==========================================
// 品质保证监控看板 - 前端提示 (Notice)
// ==========================================
// 文案经 rust-i18n 本地化（默认韩文）
// ==========================================

use crate::api::error::ApiError;
use crate::i18n::{t, t_with_args};
use crate::importer::ImportError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// 短暂提示
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    /// 错误 → 提示
    pub fn from_error(err: &ApiError) -> Self {
        match err {
            ApiError::Import(ImportError::NoArrayFound) => {
                Self::warning(t("upload.no_array_found"))
            }
            ApiError::Import(ImportError::NoUsableRecords) => {
                Self::warning(t("upload.no_usable_records"))
            }
            ApiError::Import(ImportError::EmptyFile) => Self::warning(t("upload.empty_csv")),
            ApiError::Import(e) => Self::error(t_with_args(
                "upload.parse_failure",
                &[("reason", &e.to_string())],
            )),
            ApiError::Remote(e) => Self::error(t_with_args(
                "stream.remote_failure",
                &[("reason", &e.to_string())],
            )),
            ApiError::NoData => Self::warning(t("query.no_data")),
            ApiError::NotAuthenticated => Self::warning(t("session.not_authenticated")),
            other => Self::error(other.to_string()),
        }
    }
}

/// 带提示的响应
#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse<T> {
    pub data: T,
    pub notice: Option<Notice>,
}

impl<T> DashboardResponse<T> {
    pub fn new(data: T, notice: Notice) -> Self {
        Self {
            data,
            notice: Some(notice),
        }
    }

    pub fn silent(data: T) -> Self {
        Self { data, notice: None }
    }
}
