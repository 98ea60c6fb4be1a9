// ==========================================
// 品质保证监控看板 - 登录标志
// ==========================================
// 本地持久化标志文件，内容为 "1" 视为已登录
// 仅在进入看板时检查，不做凭据校验
// ==========================================

use std::path::{Path, PathBuf};

use crate::api::{ApiError, ApiResult};

/// 已登录标志值
pub const AUTHENTICATED_FLAG: &str = "1";

#[derive(Debug, Clone)]
pub struct SessionGate {
    flag_path: PathBuf,
}

impl SessionGate {
    pub fn new(flag_path: impl Into<PathBuf>) -> Self {
        Self {
            flag_path: flag_path.into(),
        }
    }

    pub fn flag_path(&self) -> &Path {
        &self.flag_path
    }

    /// 标志存在且为 "1"
    pub fn is_authenticated(&self) -> bool {
        std::fs::read_to_string(&self.flag_path)
            .map(|content| content.trim() == AUTHENTICATED_FLAG)
            .unwrap_or(false)
    }

    /// 写入已登录标志
    pub fn sign_in(&self) -> ApiResult<()> {
        if let Some(parent) = self.flag_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ApiError::InternalError(format!("无法创建目录 {}: {}", parent.display(), e))
                })?;
            }
        }
        std::fs::write(&self.flag_path, AUTHENTICATED_FLAG).map_err(|e| {
            ApiError::InternalError(format!(
                "无法写入登录标志 {}: {}",
                self.flag_path.display(),
                e
            ))
        })?;
        tracing::info!("已登录: {}", self.flag_path.display());
        Ok(())
    }

    /// 清除登录标志（不存在时视为成功）
    pub fn sign_out(&self) -> ApiResult<()> {
        match std::fs::remove_file(&self.flag_path) {
            Ok(()) => {
                tracing::info!("已登出");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ApiError::InternalError(format!(
                "无法删除登录标志 {}: {}",
                self.flag_path.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sign_in_and_out() {
        let dir = TempDir::new().unwrap();
        let gate = SessionGate::new(dir.path().join("nested").join("session.flag"));

        assert!(!gate.is_authenticated());
        gate.sign_in().unwrap();
        assert!(gate.is_authenticated());

        gate.sign_out().unwrap();
        assert!(!gate.is_authenticated());
        // 重复登出不报错
        gate.sign_out().unwrap();
    }

    #[test]
    fn test_only_exact_flag_counts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.flag");
        let gate = SessionGate::new(&path);

        std::fs::write(&path, "0").unwrap();
        assert!(!gate.is_authenticated());

        std::fs::write(&path, "1\n").unwrap();
        assert!(gate.is_authenticated());
    }
}
