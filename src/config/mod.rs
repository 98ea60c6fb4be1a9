// ==========================================
// 品质保证监控看板 - 配置层
// ==========================================
// 职责: 远程服务地址、回放节奏、缓冲容量、默认查询期间等配置
// 来源: 内置默认值 / JSON 配置文件 / 环境变量
// ==========================================

pub mod dashboard_config;

// 重导出
pub use dashboard_config::{env_keys, ConfigError, ConfigResult, DashboardConfig};
