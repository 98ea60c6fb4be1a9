// ==========================================
// 品质保证监控看板 - 远程预测服务层
// ==========================================
// 职责: 远程分类器（单行预测）与整文件聚合服务的接口与 HTTP 实现
// ==========================================

pub mod client;
pub mod dto;
pub mod error;

// 重导出
pub use client::{HttpPredictionService, PredictionService};
pub use dto::{parse_batch_response, Prediction, POSITIVE_CLASS};
pub use error::{RemoteError, RemoteResult};
