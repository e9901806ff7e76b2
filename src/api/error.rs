// ==========================================
// 外勤排班系统 - API层错误类型
// ==========================================
// 职责: 汇总引擎校验错误、配置错误、任务调度错误，给出可展示的原因
// 说明: 无解/超时/求解器故障是各排班案的状态，不是 API 错误
// ==========================================

use crate::engine::audit::PlanViolation;
use crate::engine::error::PlannerError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    /// 排班案复核失败（带详细违反项）
    #[error("排班案复核失败: {reason}")]
    PlanAuditFailed {
        reason: String,
        violations: Vec<PlanViolation>,
    },

    // ==========================================
    // 配置错误
    // ==========================================
    #[error("配置读取失败: {0}")]
    ConfigError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 PlannerError 转换
// ==========================================
impl From<PlannerError> for ApiError {
    fn from(err: PlannerError) -> Self {
        match err {
            PlannerError::Config(msg) => ApiError::ConfigError(msg),
            PlannerError::Other(e) => ApiError::Other(e),
            e => ApiError::ValidationError(e.to_string()),
        }
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for ApiError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::InternalError(format!("后台任务失败: {}", err))
    }
}

/// API层结果类型
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planner_error_conversion() {
        let err: ApiError = PlannerError::NoActiveDoctors.into();
        assert!(matches!(err, ApiError::ValidationError(_)));
        assert!(err.to_string().contains("无在籍医员"));

        let err: ApiError = PlannerError::Config("x".to_string()).into();
        assert!(matches!(err, ApiError::ConfigError(_)));
    }
}
