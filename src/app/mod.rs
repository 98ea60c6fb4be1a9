// ==========================================
// 品质保证监控看板 - 应用层
// ==========================================
// 职责: 应用装配与进入看板前的登录检查
// ==========================================

pub mod session;
pub mod state;

// 重导出
pub use session::SessionGate;
pub use state::AppState;
