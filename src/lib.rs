// ==========================================
// 品质保证监控看板 - 核心库
// ==========================================
// 压出产线品质监控: 文件接入 → 归一化 → 期间聚合 / 实时回放与告警
// 技术栈: Rust + tokio + reqwest
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "ko");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 过滤/聚合/回放
pub mod engine;

// 导入层 - 文件解析与归一化
pub mod importer;

// 远程预测服务
pub mod predictor;

// 配置层
pub mod config;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 看板接口
pub mod api;

// 应用层 - 装配与登录检查
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    AlertEvent, DashboardView, InspectionRow, KpiSnapshot, LiveBoard, RowStatus, Severity,
    StreamPoint, StreamStatus,
};

// 引擎
pub use engine::{Aggregator, AlertTracker, RollingBuffer, StreamingReplayer};

// 导入
pub use importer::{NormalizedPayload, RecordNormalizer};

// API
pub use api::{ApiError, DashboardApi, Notice};

// 应用
pub use app::AppState;

// 配置
pub use config::DashboardConfig;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "압출 품질보증 모니터링";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
