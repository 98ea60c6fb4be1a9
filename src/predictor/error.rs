// ==========================================
// 品质保证监控看板 - 远程调用错误类型
// ==========================================
// 覆盖: 网络失败 / 非成功状态码 / 服务端拒绝 / 响应解析失败
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("远程调用失败 ({endpoint}): {message}")]
    Transport { endpoint: String, message: String },

    #[error("远程服务返回错误状态 ({endpoint}): HTTP {status} {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("服务端错误: {error}（缺失列: {}）", .missing.join(", "))]
    Rejected { error: String, missing: Vec<String> },

    #[error("响应解析失败 ({endpoint}): {message}")]
    Decode { endpoint: String, message: String },
}

impl RemoteError {
    pub fn transport(endpoint: &str, err: impl std::fmt::Display) -> Self {
        RemoteError::Transport {
            endpoint: endpoint.to_string(),
            message: err.to_string(),
        }
    }

    pub fn decode(endpoint: &str, err: impl std::fmt::Display) -> Self {
        RemoteError::Decode {
            endpoint: endpoint.to_string(),
            message: err.to_string(),
        }
    }

    /// 服务端报告的缺失列
    pub fn missing_columns(&self) -> &[String] {
        match self {
            RemoteError::Rejected { missing, .. } => missing,
            _ => &[],
        }
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;
