// ==========================================
// 外勤排班系统 - 排班案生成编排器
// ==========================================
// 主流程:
//   校验 → 对象日 → 外勤枠 → (每个模式) 约束构建 → 目标函数 → 求解 → 审计 → 统计
// 红线:
//   - 每个模式独立构建模型、独立求解，不共享求解器状态
//   - 无解/故障的模式同样返回排班案形态的失败记录，不得静默省略
//   - 一个模式的故障不影响其他模式
// ==========================================

use crate::calendar::HolidayCalendar;
use crate::domain::mode::GenerationMode;
use crate::domain::plan::{Assignment, Plan, Slot};
use crate::domain::request::PlanningRequest;
use crate::domain::types::SolveStatus;
use crate::engine::audit::{PlanAuditor, PlanViolation};
use crate::engine::constraint_builder::ConstraintBuilder;
use crate::engine::error::PlannerResult;
use crate::engine::objective::{ObjectiveComposer, ObjectiveWeights};
use crate::engine::slot_generator::SlotGenerator;
use crate::engine::solver::{ModelSolver, SolverSettings};
use crate::engine::statistics::PlanStatistics;
use crate::engine::validation::{InputValidator, PlanningSnapshot};
use chrono::Weekday;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;
use tracing::{error, info, instrument, warn};

// ==========================================
// GeneratorSettings - 生成参数
// ==========================================
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub solver: SolverSettings,
    pub modes: Vec<GenerationMode>,
    pub weights: BTreeMap<GenerationMode, ObjectiveWeights>, // 未登记的模式使用固定权重表
    pub duty_weekday: Weekday,
}

impl GeneratorSettings {
    pub fn weights_for(&self, mode: GenerationMode) -> ObjectiveWeights {
        self.weights
            .get(&mode)
            .copied()
            .unwrap_or_else(|| ObjectiveWeights::for_mode(mode))
    }
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            solver: SolverSettings::default(),
            modes: GenerationMode::ALL.to_vec(),
            weights: BTreeMap::new(),
            duty_weekday: Weekday::Sat,
        }
    }
}

// ==========================================
// PreparedRun - 校验后的一次生成的只读输入
// ==========================================
#[derive(Debug, Clone)]
pub struct PreparedRun {
    pub snapshot: PlanningSnapshot,
    pub slots: Vec<Slot>,
}

impl PreparedRun {
    /// 以指定模式求解一次
    ///
    /// 求解过程中的 panic 被捕获为该模式的 error 记录
    pub fn solve_mode(
        &self,
        mode: GenerationMode,
        weights: &ObjectiveWeights,
        settings: &SolverSettings,
    ) -> Plan {
        let started = Instant::now();
        match catch_unwind(AssertUnwindSafe(|| self.try_solve_mode(mode, weights, settings))) {
            Ok(plan) => plan,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "未知异常".to_string());
                error!(mode = %mode, panic = %message, "求解过程异常终止");
                Plan::failed(
                    self.snapshot.year_month,
                    mode,
                    SolveStatus::Error,
                    vec![format!("求解过程异常终止: {}", message)],
                    started.elapsed().as_millis() as u64,
                )
            }
        }
    }

    /// 复核任意分配列表（人工编辑后的排班案）
    pub fn audit(&self, assignments: &[Assignment]) -> Vec<PlanViolation> {
        PlanAuditor::new(&self.snapshot, &self.slots).audit(assignments)
    }

    #[instrument(skip(self, weights, settings), fields(year_month = %self.snapshot.year_month))]
    fn try_solve_mode(
        &self,
        mode: GenerationMode,
        weights: &ObjectiveWeights,
        settings: &SolverSettings,
    ) -> Plan {
        let started = Instant::now();
        let year_month = self.snapshot.year_month;

        // 全部休诊: 空排班即为最优
        if self.slots.is_empty() {
            info!(mode = %mode, "本月无外勤枠");
            return self.build_plan(mode, SolveStatus::Optimal, Vec::new(), weights, started);
        }

        // ===== 约束构建 =====
        let mut model = ConstraintBuilder::new(&self.snapshot, &self.slots).build();
        if model.has_conflicts() {
            warn!(mode = %mode, conflicts = model.conflicts.len(), "存在结构性冲突，跳过求解");
            return Plan::failed(
                year_month,
                mode,
                SolveStatus::Infeasible,
                model.conflicts,
                started.elapsed().as_millis() as u64,
            );
        }

        // ===== 目标函数 + 求解 =====
        let objective = ObjectiveComposer::new(&self.snapshot, &self.slots).compose(&mut model, weights);
        let outcome = ModelSolver::new(*settings).solve(model, objective);

        if !outcome.status.has_assignments() {
            return Plan::failed(
                year_month,
                mode,
                outcome.status,
                outcome.message.into_iter().collect(),
                started.elapsed().as_millis() as u64,
            );
        }

        let mut assignments: Vec<Assignment> = outcome
            .selected
            .iter()
            .map(|&(doctor_idx, slot_idx)| {
                let slot = &self.slots[slot_idx];
                Assignment {
                    date: slot.date,
                    clinic_id: slot.clinic_id,
                    doctor_id: self.snapshot.doctors[doctor_idx].doctor_id,
                }
            })
            .collect();
        assignments.sort();

        // ===== 审计 =====
        let violations = self.audit(&assignments);
        if !violations.is_empty() {
            error!(mode = %mode, violations = violations.len(), "求解结果未通过硬约束复核");
            return Plan::failed(
                year_month,
                mode,
                SolveStatus::Error,
                violations.iter().map(|v| v.to_string()).collect(),
                started.elapsed().as_millis() as u64,
            );
        }

        let mut plan = self.build_plan(mode, outcome.status, assignments, weights, started);
        plan.conflicts.extend(outcome.message);
        plan
    }

    fn build_plan(
        &self,
        mode: GenerationMode,
        status: SolveStatus,
        assignments: Vec<Assignment>,
        weights: &ObjectiveWeights,
        started: Instant,
    ) -> Plan {
        let stats = PlanStatistics::new(&self.snapshot);
        let breakdown = ObjectiveComposer::new(&self.snapshot, &self.slots).evaluate(&assignments, weights);

        let mut plan = Plan::failed(self.snapshot.year_month, mode, status, Vec::new(), 0);
        plan.total_variance = stats.total_variance(&assignments);
        plan.satisfaction_score = stats.satisfaction_score(&assignments);
        plan.doctor_summaries = stats.doctor_summaries(&assignments);
        plan.objective = Some(breakdown);
        plan.assignments = assignments;
        plan.elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            mode = %mode,
            status = %status,
            assignments = plan.assignments.len(),
            total_variance = plan.total_variance,
            satisfaction = plan.satisfaction_score,
            elapsed_ms = plan.elapsed_ms,
            "排班案生成完成"
        );
        plan
    }
}

// ==========================================
// PlanGenerator - 排班案生成编排器
// ==========================================
pub struct PlanGenerator<'a> {
    holidays: &'a dyn HolidayCalendar,
    settings: GeneratorSettings,
}

impl<'a> PlanGenerator<'a> {
    pub fn new(holidays: &'a dyn HolidayCalendar, settings: GeneratorSettings) -> Self {
        Self { holidays, settings }
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// 校验输入并展开外勤枠（所有模式共用）
    pub fn prepare(&self, request: &PlanningRequest) -> PlannerResult<PreparedRun> {
        let snapshot = InputValidator::new(self.holidays)
            .with_weekday(self.settings.duty_weekday)
            .validate(request)?;
        let slots = SlotGenerator::new().generate_slots(
            &snapshot.target_dates,
            &snapshot.clinics,
            snapshot.overrides(),
        );
        info!(
            year_month = %snapshot.year_month,
            target_dates = snapshot.target_dates.len(),
            slots = slots.len(),
            "输入准备完成"
        );
        Ok(PreparedRun { snapshot, slots })
    }

    /// 生成排班案（每个模式一案，按模式顺序返回）
    ///
    /// # 返回
    /// - Ok: 每个模式一条记录（含无解/故障的失败记录）
    /// - Err: 输入校验失败，未进行任何求解
    pub fn generate_plans(&self, request: &PlanningRequest) -> PlannerResult<Vec<Plan>> {
        let run = self.prepare(request)?;
        let plans = self
            .settings
            .modes
            .iter()
            .map(|&mode| run.solve_mode(mode, &self.settings.weights_for(mode), &self.settings.solver))
            .collect();
        Ok(plans)
    }
}
