// ==========================================
// 外勤排班系统 - 配置层
// ==========================================
// 职责: 求解参数、生成模式、模式权重覆写的读取与管理
// 存储: config_kv 表（或内存默认值）
// ==========================================

pub mod config_manager;
pub mod mode_profile;
pub mod planner_config_trait;
pub mod static_config;

// 重导出核心配置类型
pub use config_manager::{config_keys, ConfigManager};
pub use mode_profile::{ModeWeightParameters, ModeWeightProfile};
pub use planner_config_trait::{ConfigResult, PlannerConfigReader};
pub use static_config::StaticPlannerConfig;
