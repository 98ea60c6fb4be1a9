// ==========================================
// 品质保证监控看板 - 应用状态
// ==========================================
// 职责: 由配置装配远程服务、看板 API 与登录标志
// ==========================================

use std::sync::Arc;

use crate::api::{ApiError, ApiResult, DashboardApi};
use crate::app::session::SessionGate;
use crate::config::DashboardConfig;
use crate::predictor::{HttpPredictionService, PredictionService};

/// 应用状态
pub struct AppState {
    /// 看板配置
    pub config: DashboardConfig,

    /// 登录标志
    pub session: SessionGate,

    /// 看板API
    dashboard_api: Arc<DashboardApi>,
}

impl AppState {
    /// 使用 HTTP 远程服务创建
    pub fn new(config: DashboardConfig) -> Self {
        let service = Arc::new(HttpPredictionService::new(&config));
        Self::with_service(config, service)
    }

    /// 使用指定远程服务创建（测试注入）
    pub fn with_service(config: DashboardConfig, service: Arc<dyn PredictionService>) -> Self {
        tracing::info!(
            api_base = %config.api_base,
            locale = %config.locale,
            "初始化AppState"
        );
        crate::i18n::set_locale(&config.locale);

        let session = SessionGate::new(config.session_flag_path());
        let dashboard_api = Arc::new(DashboardApi::new(&config, service));

        Self {
            config,
            session,
            dashboard_api,
        }
    }

    /// 进入看板（仅在导航时检查登录标志）
    ///
    /// # 错误
    /// - NotAuthenticated: 要求登录且标志不是 "1"
    pub fn open_dashboard(&self) -> ApiResult<Arc<DashboardApi>> {
        if self.config.require_session && !self.session.is_authenticated() {
            tracing::warn!("未登录, 拒绝进入看板");
            return Err(ApiError::NotAuthenticated);
        }
        Ok(Arc::clone(&self.dashboard_api))
    }
}
