// ==========================================
// 外勤排班系统 - 主数据与月别希望
// ==========================================
// 来源: 外部主数据/希望录入协作方提供的只读快照
// 红线: 引擎只读，不修改、不缓存
// ==========================================

use crate::domain::types::{ClinicId, DoctorId, RecurrenceClass};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

fn default_active() -> bool {
    true
}

// ==========================================
// Doctor - 医员
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub doctor_id: DoctorId, // 医员ID
    pub name: String,        // 显示名
    #[serde(default = "default_active")]
    pub is_active: bool,     // 在籍标志
    #[serde(default)]
    pub max_assignments: u32, // 月出勤次数上限（0=不限）
}

impl Doctor {
    pub fn new(doctor_id: DoctorId, name: &str) -> Self {
        Self {
            doctor_id,
            name: name.to_string(),
            is_active: true,
            max_assignments: 0,
        }
    }

    pub fn with_max_assignments(mut self, max_assignments: u32) -> Self {
        self.max_assignments = max_assignments;
        self
    }

    /// 有上限时返回上限
    pub fn monthly_limit(&self) -> Option<u32> {
        (self.max_assignments > 0).then_some(self.max_assignments)
    }
}

// ==========================================
// Clinic - 外勤先
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clinic {
    pub clinic_id: ClinicId,             // 外勤先ID
    pub name: String,                    // 名称
    pub fee: i64,                        // 单次报酬
    #[serde(default)]
    pub frequency: RecurrenceClass,      // 外勤频率
    #[serde(default)]
    pub nominated_doctors: Vec<DoctorId>, // 外勤先指名的医员
    #[serde(default = "default_active")]
    pub is_active: bool,                 // 有效标志
}

impl Clinic {
    pub fn new(clinic_id: ClinicId, name: &str, fee: i64, frequency: RecurrenceClass) -> Self {
        Self {
            clinic_id,
            name: name.to_string(),
            fee,
            frequency,
            nominated_doctors: Vec::new(),
            is_active: true,
        }
    }

    pub fn nominates(&self, doctor_id: DoctorId) -> bool {
        self.nominated_doctors.contains(&doctor_id)
    }
}

// ==========================================
// AffinityRecord - 优先度记录
// ==========================================
// 未登记的组合视为 1.0（可派遣）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffinityRecord {
    pub doctor_id: DoctorId,
    pub clinic_id: ClinicId,
    pub weight: f64, // 0.0 / 1.0 / 2.0
}

// ==========================================
// DateOverride - 日别设定
// ==========================================
// 无记录 = 1 人；值为 1 的记录是冗余记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateOverride {
    pub clinic_id: ClinicId,
    pub date: NaiveDate,
    pub required_doctors: u8, // 0=休诊, 1=通常, 2=2人
}

impl DateOverride {
    pub fn is_redundant(&self) -> bool {
        self.required_doctors == 1
    }
}

/// 去除冗余的日别设定（值为 1 的记录不应落库）
pub fn normalize_overrides(overrides: Vec<DateOverride>) -> Vec<DateOverride> {
    overrides.into_iter().filter(|o| !o.is_redundant()).collect()
}

// ==========================================
// Preference - 月别希望
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preference {
    pub doctor_id: DoctorId,
    #[serde(default)]
    pub ng_dates: Vec<NaiveDate>,          // 不可出勤日（NG）
    #[serde(default)]
    pub avoid_dates: Vec<NaiveDate>,       // 尽量避开日
    #[serde(default)]
    pub preferred_clinics: Vec<ClinicId>,  // 希望外勤先
}
