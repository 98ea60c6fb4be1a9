// ==========================================
// 品质保证监控看板 - 看板配置
// ==========================================
// 来源优先级: 环境变量 > JSON 配置文件 > 内置默认值
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

// ==========================================
// 环境变量键
// ==========================================
pub mod env_keys {
    pub const API_BASE: &str = "QA_DASHBOARD_API_BASE";
    pub const TICK_MS: &str = "QA_DASHBOARD_TICK_MS";
    pub const TIMEOUT_MS: &str = "QA_DASHBOARD_TIMEOUT_MS";
    pub const SESSION_FLAG: &str = "QA_DASHBOARD_SESSION_FLAG";
    pub const LOCALE: &str = "QA_DASHBOARD_LOCALE";
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败 ({path}): {message}")]
    ReadError { path: String, message: String },

    #[error("配置文件格式错误 ({path}): {message}")]
    FormatError { path: String, message: String },

    #[error("配置值无效 (key: {key}, value: {value}): {message}")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// ==========================================
// DashboardConfig
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    // ===== 远程服务 =====
    pub api_base: String,
    pub predict_path: String,
    pub predict_file_path: String,
    pub health_path: String,
    pub request_timeout_ms: u64,
    pub user_agent: String,

    // ===== 实时回放 =====
    pub tick_interval_ms: u64,
    pub view_capacity: usize,
    pub alert_capacity: usize,
    pub risk_mode_threshold: u64,
    pub head_keys: Vec<String>,
    pub screw_keys: Vec<String>,
    /// 缺任一字段的行跳过（不调用远程、不告警）
    pub required_fields: Vec<String>,

    // ===== 查询期间 =====
    pub default_start_date: NaiveDate,
    pub default_end_date: NaiveDate,

    // ===== 会话/界面 =====
    pub session_flag_path: Option<PathBuf>,
    pub require_session: bool,
    pub locale: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:5001".to_string(),
            predict_path: "/predict".to_string(),
            predict_file_path: "/predict_file".to_string(),
            health_path: "/health".to_string(),
            request_timeout_ms: 10_000,
            user_agent: concat!("extrusion-qa/", env!("CARGO_PKG_VERSION")).to_string(),

            tick_interval_ms: 1_000,
            view_capacity: 10,
            alert_capacity: 10,
            risk_mode_threshold: 5,
            head_keys: vec!["EX1.MELT_P_PV".to_string(), "EX1.MELT_TEMP".to_string()],
            screw_keys: vec!["EX1.MD_PV".to_string(), "EX1.H20_PV".to_string()],
            required_fields: Vec::new(),

            default_start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap_or_default(),
            default_end_date: NaiveDate::from_ymd_opt(2025, 3, 24).unwrap_or_default(),

            session_flag_path: None,
            require_session: false,
            locale: "ko".to_string(),
        }
    }
}

impl DashboardConfig {
    /// 加载配置：可选 JSON 文件 → 环境变量覆写 → 校验
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        tracing::info!(
            api_base = %config.api_base,
            tick_ms = config.tick_interval_ms,
            "看板配置加载完成"
        );
        Ok(config)
    }

    /// 从 JSON 文件读取（缺失字段取默认值）
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| ConfigError::FormatError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// 应用覆写（lookup 通常为环境变量读取）
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(v) = get(env_keys::API_BASE) {
            self.api_base = v;
        }
        if let Some(v) = get(env_keys::TICK_MS) {
            self.tick_interval_ms = parse_u64(env_keys::TICK_MS, &v)?;
        }
        if let Some(v) = get(env_keys::TIMEOUT_MS) {
            self.request_timeout_ms = parse_u64(env_keys::TIMEOUT_MS, &v)?;
        }
        if let Some(v) = get(env_keys::SESSION_FLAG) {
            self.session_flag_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get(env_keys::LOCALE) {
            self.locale = v;
        }
        Ok(())
    }

    /// 校验
    pub fn validate(&self) -> ConfigResult<()> {
        if self.api_base.trim().is_empty() {
            return Err(invalid("api_base", "", "不能为空"));
        }
        if self.tick_interval_ms == 0 {
            return Err(invalid("tick_interval_ms", "0", "必须大于 0"));
        }
        if self.view_capacity == 0 {
            return Err(invalid("view_capacity", "0", "必须大于 0"));
        }
        if self.alert_capacity == 0 {
            return Err(invalid("alert_capacity", "0", "必须大于 0"));
        }
        if self.default_start_date > self.default_end_date {
            return Err(invalid(
                "default_start_date",
                &self.default_start_date.to_string(),
                "不能晚于 default_end_date",
            ));
        }
        Ok(())
    }

    /// 拼接服务地址
    pub fn endpoint_url(&self, path: &str) -> String {
        let base = self.api_base.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }

    /// 会话标志文件路径
    ///
    /// 未配置时使用用户数据目录，获取失败回退到当前目录
    pub fn session_flag_path(&self) -> PathBuf {
        if let Some(path) = &self.session_flag_path {
            return path.clone();
        }
        match dirs::data_local_dir() {
            Some(dir) => dir.join("extrusion-qa").join("session.flag"),
            None => PathBuf::from("./session.flag"),
        }
    }
}

fn parse_u64(key: &str, value: &str) -> ConfigResult<u64> {
    value
        .parse::<u64>()
        .map_err(|e| invalid(key, value, &e.to_string()))
}

fn invalid(key: &str, value: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = DashboardConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_interval_ms, 1_000);
        assert_eq!(config.view_capacity, 10);
        assert_eq!(config.head_keys, vec!["EX1.MELT_P_PV", "EX1.MELT_TEMP"]);
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"api_base": "http://qa-server:8000", "default_start_date": "2025-01-01"}}"#
        )
        .unwrap();

        let config = DashboardConfig::from_file(file.path()).unwrap();
        assert_eq!(config.api_base, "http://qa-server:8000");
        assert_eq!(config.default_start_date.to_string(), "2025-01-01");
        assert_eq!(config.alert_capacity, 10);
    }

    #[test]
    fn test_from_file_malformed() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{oops").unwrap();
        let err = DashboardConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::FormatError { .. }));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            (env_keys::API_BASE, "http://override:1"),
            (env_keys::TICK_MS, "250"),
            (env_keys::LOCALE, " en "),
        ]
        .into_iter()
        .collect();

        let mut config = DashboardConfig::default();
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.api_base, "http://override:1");
        assert_eq!(config.tick_interval_ms, 250);
        assert_eq!(config.locale, "en");
    }

    #[test]
    fn test_override_invalid_number() {
        let mut config = DashboardConfig::default();
        let err = config
            .apply_overrides(|k| (k == env_keys::TICK_MS).then(|| "fast".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = DashboardConfig {
            tick_interval_ms: 0,
            ..DashboardConfig::default()
        };
        assert!(config.validate().is_err());

        let config = DashboardConfig {
            default_start_date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            ..DashboardConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_endpoint_url_joining() {
        let config = DashboardConfig {
            api_base: "http://host:5001/".to_string(),
            ..DashboardConfig::default()
        };
        assert_eq!(config.endpoint_url("/predict"), "http://host:5001/predict");
        assert_eq!(config.endpoint_url("health"), "http://host:5001/health");
    }
}
