// ==========================================
// 外勤排班系统 - 内存配置
// ==========================================
// 用途: 无数据库时的默认配置（测试、命令行单次生成）
// ==========================================

use crate::config::config_manager::defaults;
use crate::config::planner_config_trait::{ConfigResult, PlannerConfigReader};
use crate::domain::mode::GenerationMode;
use crate::engine::objective::ObjectiveWeights;
use async_trait::async_trait;
use chrono::Weekday;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct StaticPlannerConfig {
    pub solver_time_limit_secs: f64,
    pub mip_rel_gap: f64,
    pub enabled_modes: Vec<GenerationMode>,
    pub mode_weights: BTreeMap<GenerationMode, ObjectiveWeights>,
    pub duty_weekday: Weekday,
    pub parallel_modes: bool,
}

impl StaticPlannerConfig {
    pub fn with_time_limit(mut self, secs: f64) -> Self {
        self.solver_time_limit_secs = secs;
        self
    }

    pub fn with_modes(mut self, modes: Vec<GenerationMode>) -> Self {
        self.enabled_modes = modes;
        self
    }

    pub fn with_weights(mut self, mode: GenerationMode, weights: ObjectiveWeights) -> Self {
        self.mode_weights.insert(mode, weights);
        self
    }

    pub fn sequential(mut self) -> Self {
        self.parallel_modes = false;
        self
    }
}

impl Default for StaticPlannerConfig {
    fn default() -> Self {
        Self {
            solver_time_limit_secs: defaults::SOLVER_TIME_LIMIT_SECS,
            mip_rel_gap: defaults::MIP_REL_GAP,
            enabled_modes: GenerationMode::ALL.to_vec(),
            mode_weights: BTreeMap::new(),
            duty_weekday: Weekday::Sat,
            parallel_modes: true,
        }
    }
}

#[async_trait]
impl PlannerConfigReader for StaticPlannerConfig {
    async fn get_solver_time_limit_secs(&self) -> ConfigResult<f64> {
        Ok(self.solver_time_limit_secs)
    }

    async fn get_mip_rel_gap(&self) -> ConfigResult<f64> {
        Ok(self.mip_rel_gap)
    }

    async fn get_enabled_modes(&self) -> ConfigResult<Vec<GenerationMode>> {
        Ok(self.enabled_modes.clone())
    }

    async fn get_mode_weights(&self, mode: GenerationMode) -> ConfigResult<ObjectiveWeights> {
        Ok(self
            .mode_weights
            .get(&mode)
            .copied()
            .unwrap_or_else(|| ObjectiveWeights::for_mode(mode)))
    }

    async fn get_duty_weekday(&self) -> ConfigResult<Weekday> {
        Ok(self.duty_weekday)
    }

    async fn get_parallel_modes(&self) -> ConfigResult<bool> {
        Ok(self.parallel_modes)
    }
}
