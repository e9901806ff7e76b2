// ==========================================
// 外勤排班系统 - API 层
// ==========================================
// 职责: 面向调用方（画面/命令行）的异步接口
// ==========================================

pub mod error;
pub mod plan_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use plan_api::PlanApi;
