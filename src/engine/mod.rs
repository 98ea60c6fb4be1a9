// ==========================================
// 品质保证监控看板 - 引擎层
// ==========================================
// 职责: 期间过滤、KPI/图表聚合、滚动缓冲、告警追踪、实时回放
// 红线: 引擎不做文件 I/O，远程调用只经 PredictionService
// ==========================================

pub mod aggregator;
pub mod alert_tracker;
pub mod date_filter;
pub mod replayer;
pub mod rolling_buffer;

// 重导出核心引擎
pub use aggregator::Aggregator;
pub use alert_tracker::{alarm_segments, AlertTracker};
pub use date_filter::{filter_by_date, range_bounds};
pub use replayer::{ReplayOutcome, ReplaySession, ReplaySettings, StreamingReplayer};
pub use rolling_buffer::RollingBuffer;
