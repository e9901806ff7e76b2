// ==========================================
// 外勤排班系统 - 排班配置读取 Trait
// ==========================================
// 职责: 定义生成流程所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::mode::GenerationMode;
use crate::engine::objective::ObjectiveWeights;
use async_trait::async_trait;
use chrono::Weekday;
use std::error::Error;

pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// PlannerConfigReader Trait
// ==========================================
// 实现者: ConfigManager（config_kv 表）/ StaticPlannerConfig（内存默认值）
#[async_trait]
pub trait PlannerConfigReader: Send + Sync {
    /// 求解墙钟时限（秒）
    ///
    /// # 默认值
    /// - 30
    async fn get_solver_time_limit_secs(&self) -> ConfigResult<f64>;

    /// 求解相对间隙阈值
    ///
    /// # 默认值
    /// - 1e-6
    async fn get_mip_rel_gap(&self) -> ConfigResult<f64>;

    /// 启用的生成模式（输出顺序）
    ///
    /// # 默认值
    /// - balanced, preference, affinity
    async fn get_enabled_modes(&self) -> ConfigResult<Vec<GenerationMode>>;

    /// 模式权重（未覆写时为固定权重表）
    async fn get_mode_weights(&self, mode: GenerationMode) -> ConfigResult<ObjectiveWeights>;

    /// 出勤星期
    ///
    /// # 默认值
    /// - 周六
    async fn get_duty_weekday(&self) -> ConfigResult<Weekday>;

    /// 是否并行求解各模式
    ///
    /// # 默认值
    /// - true
    async fn get_parallel_modes(&self) -> ConfigResult<bool>;
}
