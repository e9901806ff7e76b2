// ==========================================
// 外勤排班系统 - 排班案领域模型
// ==========================================
// Slot: 需求单位（只产生，不落库）
// Assignment: 供给单位（日期 × 外勤先 × 医员）
// Plan: 一个模式的完整排班案 + 统计 + 求解状态
// ==========================================

use crate::domain::mode::GenerationMode;
use crate::domain::month::YearMonth;
use crate::domain::types::{ClinicId, DoctorId, SolveStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// Slot - 外勤枠
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub clinic_id: ClinicId,
    pub date: NaiveDate,
    pub required: u8, // 1 或 2
}

// ==========================================
// Assignment - 分配结果
// ==========================================
// 排序键: (date, clinic_id, doctor_id)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Assignment {
    pub date: NaiveDate,
    pub clinic_id: ClinicId,
    pub doctor_id: DoctorId,
}

// ==========================================
// DoctorSummary - 医员别汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorSummary {
    pub doctor_id: DoctorId,
    pub assignment_count: u32, // 本月出勤次数
    pub month_fee: i64,        // 本月报酬
    pub cumulative_fee: i64,   // 累计报酬（既往确定 + 本月）
    pub preferred_hits: u32,   // 命中希望外勤先次数
    pub avoided_hits: u32,     // 落在尽量避开日的次数
}

// ==========================================
// ObjectiveBreakdown - 目标函数分项
// ==========================================
// 各项按定义直接在最终分配上求值（奖励项为负数）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveBreakdown {
    pub variance_term: f64,
    pub preference_term: f64,
    pub nomination_term: f64,
    pub priority_term: f64,
    pub avoid_penalty: f64,
    pub count_variance: f64,
    pub weighted_total: f64,
}

// ==========================================
// Plan - 排班案
// ==========================================
// 红线: 同月仅一案可确定，由外部持久化协作方保证
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub plan_id: String,                     // 排班案ID
    pub year_month: YearMonth,               // 对象月份
    pub mode: GenerationMode,                // 生成模式
    pub plan_name: String,                   // 显示名称
    pub status: SolveStatus,                 // 求解状态
    pub assignments: Vec<Assignment>,        // 分配列表（已排序）
    pub total_variance: f64,                 // 本月报酬偏差合计
    pub satisfaction_score: f64,             // 满意度 0~100
    pub is_confirmed: bool,                  // 确定标志（引擎输出恒为 false）
    pub objective: Option<ObjectiveBreakdown>, // 目标函数分项
    pub doctor_summaries: Vec<DoctorSummary>,  // 医员别汇总
    pub conflicts: Vec<String>,              // 冲突说明（无解/故障时）
    pub elapsed_ms: u64,                     // 求解耗时
}

impl Plan {
    /// 构造无分配的失败记录（无解/故障）
    pub fn failed(
        year_month: YearMonth,
        mode: GenerationMode,
        status: SolveStatus,
        conflicts: Vec<String>,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            plan_id: uuid::Uuid::new_v4().to_string(),
            year_month,
            mode,
            plan_name: mode.title_cn().to_string(),
            status,
            assignments: Vec::new(),
            total_variance: 0.0,
            satisfaction_score: 0.0,
            is_confirmed: false,
            objective: None,
            doctor_summaries: Vec::new(),
            conflicts,
            elapsed_ms,
        }
    }

    /// 某医员的分配
    pub fn assignments_of(&self, doctor_id: DoctorId) -> impl Iterator<Item = &Assignment> {
        self.assignments.iter().filter(move |a| a.doctor_id == doctor_id)
    }

    /// 某日某外勤先的分配人数
    pub fn count_at(&self, clinic_id: ClinicId, date: NaiveDate) -> usize {
        self.assignments
            .iter()
            .filter(|a| a.clinic_id == clinic_id && a.date == date)
            .count()
    }
}
