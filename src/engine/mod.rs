// ==========================================
// 外勤排班系统 - 引擎层
// ==========================================
// 职责: 外勤枠展开、约束构建、目标函数、求解、审计与统计
// 红线: 引擎为纯函数，不做 I/O，不在调用之间保留状态
// ==========================================

pub mod audit;
pub mod constraint_builder;
pub mod cumulative;
pub mod error;
pub mod objective;
pub mod plan_generator;
pub mod slot_generator;
pub mod solver;
pub mod statistics;
pub mod validation;

// 重导出核心引擎
pub use audit::{PlanAuditor, PlanViolation};
pub use constraint_builder::{AssignmentCell, AssignmentModel, ConstraintBuilder};
pub use cumulative::cumulative_fees;
pub use error::{PlannerError, PlannerResult};
pub use objective::{ObjectiveComposer, ObjectiveWeights};
pub use plan_generator::{GeneratorSettings, PlanGenerator, PreparedRun};
pub use slot_generator::SlotGenerator;
pub use solver::{ModelSolver, SolveOutcome, SolverSettings};
pub use statistics::PlanStatistics;
pub use validation::{DoctorPreference, InputValidator, PlanningSnapshot};
