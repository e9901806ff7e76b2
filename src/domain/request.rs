// ==========================================
// 外勤排班系统 - 生成请求
// ==========================================
// 一次生成所需的全部只读快照（按值传入，调用期间不变）
// ==========================================

use crate::domain::master::{AffinityRecord, Clinic, DateOverride, Doctor, Preference};
use crate::domain::month::YearMonth;
use crate::domain::types::DoctorId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningRequest {
    pub year_month: YearMonth,
    pub doctors: Vec<Doctor>,
    pub clinics: Vec<Clinic>,
    #[serde(default)]
    pub affinities: Vec<AffinityRecord>,
    #[serde(default)]
    pub overrides: Vec<DateOverride>,
    #[serde(default)]
    pub preferences: Vec<Preference>,
    /// 既往确定月份的累计报酬（仅用于报酬偏差项）
    #[serde(default)]
    pub prior_cumulative_fees: HashMap<DoctorId, i64>,
}

impl PlanningRequest {
    pub fn new(year_month: YearMonth, doctors: Vec<Doctor>, clinics: Vec<Clinic>) -> Self {
        Self {
            year_month,
            doctors,
            clinics,
            affinities: Vec::new(),
            overrides: Vec::new(),
            preferences: Vec::new(),
            prior_cumulative_fees: HashMap::new(),
        }
    }
}
