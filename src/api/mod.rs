// ==========================================
// 品质保证监控看板 - API 层
// ==========================================
// 职责: 提供看板 API 接口，供终端驱动或前端外壳调用
// ==========================================

pub mod dashboard_api;
pub mod error;
pub mod notice;

// 重导出核心类型
pub use dashboard_api::DashboardApi;
pub use error::{map_api_error, ApiError, ApiResult, ErrorResponse};
pub use notice::{DashboardResponse, Notice, NoticeLevel};
