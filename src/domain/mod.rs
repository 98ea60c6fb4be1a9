// ==========================================
// 品质保证监控看板 - 领域模型层
// ==========================================
// 职责: 定义检测记录、KPI、实时回放相关实体与类型
// 红线: 不含文件解析逻辑,不含远程调用
// ==========================================

pub mod demo;
pub mod inspection;
pub mod stream;
pub mod types;

// 重导出核心类型
pub use demo::demo_view;
pub use inspection::{CategoryEntry, DashboardView, InspectionRow, KpiSnapshot, RatePoint};
pub use stream::{AlarmSegment, AlertEvent, BatchSummary, LiveBoard, StreamPoint, ZoneSnapshot};
pub use types::{
    RowStatus, Severity, StreamStatus, CRITICAL_PLACEHOLDER, NORMAL_CATEGORY, OTHER_CATEGORY,
};
