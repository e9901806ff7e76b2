// ==========================================
// 外勤排班系统 - 领域模型层
// ==========================================
// 职责: 定义主数据、希望、需求枠、排班案等记录及强类型
// 红线: 不含求解逻辑，不含 I/O
// ==========================================

pub mod master;
pub mod mode;
pub mod month;
pub mod plan;
pub mod request;
pub mod types;

// 重导出核心类型
pub use master::{normalize_overrides, AffinityRecord, Clinic, DateOverride, Doctor, Preference};
pub use mode::GenerationMode;
pub use month::YearMonth;
pub use plan::{Assignment, DoctorSummary, ObjectiveBreakdown, Plan, Slot};
pub use request::PlanningRequest;
pub use types::{AffinityWeight, ClinicId, DoctorId, RecurrenceClass, SolveStatus, Staffing};
