// ==========================================
// 外勤排班系统 - 排班案 API
// ==========================================
// 职责: 读取配置 → 校验输入 → 各模式求解（可并行）→ 返回排班案
// 并发: 各模式在 spawn_blocking 上独立求解，共享只读的 PreparedRun
// 顺序: 结果总是按启用模式的顺序返回
// ==========================================

use std::sync::Arc;

use futures::future::join_all;
use tracing::{error, info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::calendar::{CalendarResolver, HolidayCalendar, TargetDate};
use crate::config::PlannerConfigReader;
use crate::domain::mode::GenerationMode;
use crate::domain::month::YearMonth;
use crate::domain::plan::{Assignment, Plan};
use crate::domain::request::PlanningRequest;
use crate::domain::types::SolveStatus;
use crate::engine::audit::PlanViolation;
use crate::engine::plan_generator::{GeneratorSettings, PlanGenerator, PreparedRun};
use crate::engine::solver::SolverSettings;

// ==========================================
// PlanApi - 排班案 API
// ==========================================
pub struct PlanApi<C>
where
    C: PlannerConfigReader,
{
    config: Arc<C>,
    holidays: Arc<dyn HolidayCalendar>,
}

impl<C> PlanApi<C>
where
    C: PlannerConfigReader,
{
    /// 创建新的PlanApi实例
    ///
    /// # 参数
    /// - config: 配置读取器
    /// - holidays: 祝日判定
    pub fn new(config: Arc<C>, holidays: Arc<dyn HolidayCalendar>) -> Self {
        Self { config, holidays }
    }

    /// 读取生成参数
    pub async fn load_settings(&self) -> ApiResult<(GeneratorSettings, bool)> {
        let modes = self.config.get_enabled_modes().await?;
        let mut settings = GeneratorSettings {
            solver: SolverSettings {
                time_limit_secs: self.config.get_solver_time_limit_secs().await?,
                mip_rel_gap: self.config.get_mip_rel_gap().await?,
            },
            duty_weekday: self.config.get_duty_weekday().await?,
            ..GeneratorSettings::default()
        };
        for mode in &modes {
            settings.weights.insert(*mode, self.config.get_mode_weights(*mode).await?);
        }
        settings.modes = modes;

        let parallel = self.config.get_parallel_modes().await?;
        Ok((settings, parallel))
    }

    // ==========================================
    // 排班案生成
    // ==========================================

    /// 生成排班案（每个启用模式一案）
    ///
    /// # 返回
    /// - Ok(Vec<Plan>): 按模式顺序，无解/故障的模式为失败记录
    /// - Err(ApiError::ValidationError): 输入校验失败，未求解
    #[instrument(skip(self, request), fields(year_month = %request.year_month))]
    pub async fn generate_plans(&self, request: PlanningRequest) -> ApiResult<Vec<Plan>> {
        let (settings, parallel) = self.load_settings().await?;
        let run = PlanGenerator::new(self.holidays.as_ref(), settings.clone()).prepare(&request)?;
        let run = Arc::new(run);

        info!(modes = settings.modes.len(), parallel, "开始生成排班案");

        let plans = if parallel {
            let tasks = settings.modes.iter().map(|&mode| {
                let run = Arc::clone(&run);
                let weights = settings.weights_for(mode);
                let solver = settings.solver;
                tokio::task::spawn_blocking(move || run.solve_mode(mode, &weights, &solver))
            });
            join_all(tasks)
                .await
                .into_iter()
                .zip(settings.modes.iter())
                .map(|(joined, &mode)| joined.unwrap_or_else(|e| join_failure(&run, mode, e)))
                .collect()
        } else {
            let worker_run = Arc::clone(&run);
            let worker_settings = settings.clone();
            tokio::task::spawn_blocking(move || {
                worker_settings
                    .modes
                    .iter()
                    .map(|&mode| {
                        worker_run.solve_mode(
                            mode,
                            &worker_settings.weights_for(mode),
                            &worker_settings.solver,
                        )
                    })
                    .collect::<Vec<Plan>>()
            })
            .await?
        };

        Ok(plans)
    }

    /// 对象月的出勤日（供希望录入画面使用）
    pub async fn target_dates(&self, month: YearMonth) -> ApiResult<Vec<TargetDate>> {
        let weekday = self.config.get_duty_weekday().await?;
        Ok(CalendarResolver::new(self.holidays.as_ref())
            .with_weekday(weekday)
            .resolve_target_dates(month))
    }

    // ==========================================
    // 人工编辑复核
    // ==========================================

    /// 复核人工编辑后的分配列表
    ///
    /// # 返回
    /// - Ok(()): 满足全部硬约束
    /// - Err(ApiError::PlanAuditFailed): 带违反项明细
    pub async fn audit_plan(
        &self,
        request: &PlanningRequest,
        assignments: &[Assignment],
    ) -> ApiResult<()> {
        let (settings, _) = self.load_settings().await?;
        let run = PlanGenerator::new(self.holidays.as_ref(), settings).prepare(request)?;
        let violations: Vec<PlanViolation> = run.audit(assignments);
        if violations.is_empty() {
            return Ok(());
        }
        Err(ApiError::PlanAuditFailed {
            reason: format!("{} 项硬约束未满足", violations.len()),
            violations,
        })
    }
}

fn join_failure(run: &PreparedRun, mode: GenerationMode, err: tokio::task::JoinError) -> Plan {
    error!(mode = %mode, error = %err, "模式求解任务失败");
    Plan::failed(
        run.snapshot.year_month,
        mode,
        SolveStatus::Error,
        vec![format!("求解任务失败: {}", err)],
        0,
    )
}
