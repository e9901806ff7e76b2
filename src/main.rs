// ==========================================
// 外勤排班系统 - 命令行入口
// ==========================================
// 用法: clinic-duty-planner <request.json>
// 输入: PlanningRequest 快照（JSON）
// 输出: 各模式排班案（JSON，stdout）
// 配置: PLANNER_CONFIG_DB 指定时读取 config_kv，否则使用内存默认值
// ==========================================

use anyhow::{bail, Context};
use clinic_duty_planner::config::{ConfigManager, PlannerConfigReader, StaticPlannerConfig};
use clinic_duty_planner::{logging, JapaneseHolidayCalendar, PlanApi, PlanningRequest, SolveStatus};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let path = match std::env::args().nth(1) {
        Some(p) => p,
        None => bail!("用法: clinic-duty-planner <request.json>"),
    };

    let raw = std::fs::read_to_string(&path).with_context(|| format!("无法读取请求文件: {}", path))?;
    let request: PlanningRequest =
        serde_json::from_str(&raw).with_context(|| format!("请求文件格式错误: {}", path))?;

    tracing::info!("==================================================");
    tracing::info!("{} {}", clinic_duty_planner::APP_NAME, clinic_duty_planner::VERSION);
    tracing::info!("对象月份: {}", request.year_month);
    tracing::info!("==================================================");

    let plans = match std::env::var("PLANNER_CONFIG_DB") {
        Ok(db_path) => {
            tracing::info!("使用配置数据库: {}", db_path);
            let config = ConfigManager::new(&db_path)
                .map_err(|e| anyhow::anyhow!("无法打开配置数据库 {}: {}", db_path, e))?;
            run(Arc::new(config), request).await?
        }
        Err(_) => run(Arc::new(StaticPlannerConfig::default()), request).await?,
    };

    for plan in &plans {
        if plan.status == SolveStatus::Feasible {
            tracing::warn!(mode = %plan.mode, "未证明最优（求解时限或间隙阈值），该排班案不保证最优");
        }
    }

    println!("{}", serde_json::to_string_pretty(&plans)?);
    Ok(())
}

async fn run<C: PlannerConfigReader>(
    config: Arc<C>,
    request: PlanningRequest,
) -> anyhow::Result<Vec<clinic_duty_planner::Plan>> {
    let api = PlanApi::new(config, Arc::new(JapaneseHolidayCalendar::new()));
    Ok(api.generate_plans(request).await?)
}
