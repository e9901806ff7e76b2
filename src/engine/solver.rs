// ==========================================
// 外勤排班系统 - 求解器封装
// ==========================================
// 后端: HiGHS（分支定界/分支切割），经 good_lp 调用
// 状态: optimal / feasible（时限内未证明最优）/ infeasible / error
// 红线: 求解受墙钟时限约束，必定返回
// ==========================================

use crate::domain::types::SolveStatus;
use crate::engine::constraint_builder::AssignmentModel;
use good_lp::solvers::highs::highs;
use good_lp::solvers::SolutionStatus;
use good_lp::{Expression, ResolutionError, Solution, SolverModel};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, instrument, warn};

// ==========================================
// SolverSettings - 求解参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    pub time_limit_secs: f64, // 墙钟时限
    pub mip_rel_gap: f64,     // 相对间隙阈值
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            time_limit_secs: 30.0,
            mip_rel_gap: 1e-6,
        }
    }
}

// ==========================================
// SolveOutcome - 求解结果
// ==========================================
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    pub selected: Vec<(usize, usize)>, // 取值为 1 的 (doctor_idx, slot_idx)
    pub objective_value: Option<f64>,
    pub elapsed_ms: u64,
    pub message: Option<String>,
}

impl SolveOutcome {
    fn failed(status: SolveStatus, message: String, started: Instant) -> Self {
        Self {
            status,
            selected: Vec::new(),
            objective_value: None,
            elapsed_ms: started.elapsed().as_millis() as u64,
            message: Some(message),
        }
    }
}

// ==========================================
// ModelSolver - 0/1 整数规划求解
// ==========================================
pub struct ModelSolver {
    settings: SolverSettings,
}

impl ModelSolver {
    pub fn new(settings: SolverSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    /// 求解模型（消费模型，每次求解独立实例）
    #[instrument(skip_all, fields(
        variables = model.variable_count(),
        constraints = model.constraints.len(),
        time_limit_secs = self.settings.time_limit_secs
    ))]
    pub fn solve(&self, model: AssignmentModel, objective: Expression) -> SolveOutcome {
        let started = Instant::now();
        let AssignmentModel {
            vars,
            cells,
            constraints,
            ..
        } = model;

        if cells.is_empty() {
            return SolveOutcome::failed(
                SolveStatus::Infeasible,
                "无任何可派遣的 (医员, 外勤枠) 组合".to_string(),
                started,
            );
        }

        let mut problem = vars.minimise(objective.clone()).using(highs);
        problem.set_verbose(false);
        let problem = problem.set_time_limit(self.settings.time_limit_secs);
        let mut problem = match problem.set_mip_rel_gap(self.settings.mip_rel_gap as f32) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "相对间隙参数设置失败");
                return SolveOutcome::failed(SolveStatus::Error, format!("求解参数错误: {}", e), started);
            }
        };
        for c in constraints {
            problem = problem.with(c);
        }

        match problem.solve() {
            Ok(solution) => {
                let (status, message) = classify(solution.status());
                let selected = cells
                    .iter()
                    .filter(|c| solution.value(c.var) > 0.5)
                    .map(|c| (c.doctor_idx, c.slot_idx))
                    .collect::<Vec<_>>();
                let objective_value = solution.eval(objective);
                let elapsed_ms = started.elapsed().as_millis() as u64;

                info!(
                    status = %status,
                    assigned = selected.len(),
                    objective = objective_value,
                    elapsed_ms,
                    "求解完成"
                );

                SolveOutcome {
                    status,
                    selected,
                    objective_value: Some(objective_value),
                    elapsed_ms,
                    message: message.map(str::to_string),
                }
            }
            Err(ResolutionError::Infeasible) => {
                info!("模型无可行解");
                SolveOutcome::failed(
                    SolveStatus::Infeasible,
                    "硬约束之间存在冲突，无可行排班".to_string(),
                    started,
                )
            }
            Err(e) => {
                warn!(error = %e, "求解器故障");
                SolveOutcome::failed(SolveStatus::Error, format!("求解器故障: {}", e), started)
            }
        }
    }
}

impl Default for ModelSolver {
    fn default() -> Self {
        Self::new(SolverSettings::default())
    }
}

/// 后端结果状态 → 排班案状态（非最优时附说明）
pub(crate) fn classify(status: SolutionStatus) -> (SolveStatus, Option<&'static str>) {
    match status {
        SolutionStatus::Optimal => (SolveStatus::Optimal, None),
        SolutionStatus::TimeLimit => (
            SolveStatus::Feasible,
            Some("已达求解时限，返回当前最优可行解，不保证最优"),
        ),
        SolutionStatus::GapLimit => (
            SolveStatus::Feasible,
            Some("已达相对间隙阈值，返回当前最优可行解，不保证最优"),
        ),
    }
}
