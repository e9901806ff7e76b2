// ==========================================
// 外勤排班系统 - 核心库
// ==========================================
// 职责: 医员外勤的月度排班（0/1 整数规划）
// 系统定位: 决策支持（生成多个候选排班案，由人工确定其一）
// 红线: 引擎为纯函数，主数据/希望以只读快照传入
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 记录与类型
pub mod domain;

// 日历层 - 祝日判定与对象日
pub mod calendar;

// 引擎层 - 约束构建与求解
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AffinityWeight, RecurrenceClass, SolveStatus, Staffing};

// 领域实体
pub use domain::{
    AffinityRecord, Assignment, Clinic, DateOverride, Doctor, DoctorSummary, GenerationMode, ObjectiveBreakdown,
    Plan, PlanningRequest, Preference, Slot, YearMonth,
};

// 日历
pub use calendar::{CalendarResolver, HolidayCalendar, HolidaySet, JapaneseHolidayCalendar, NoHolidays};

// 引擎
pub use engine::{
    cumulative_fees, ConstraintBuilder, GeneratorSettings, ModelSolver, ObjectiveComposer,
    ObjectiveWeights, PlanAuditor, PlanGenerator, PlannerError, SlotGenerator, SolverSettings,
};

// API
pub use api::{ApiError, ApiResult, PlanApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "外勤排班系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
