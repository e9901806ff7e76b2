// ==========================================
// 外勤排班系统 - 领域类型定义
// ==========================================
// 职责: 外勤频率、优先度权重、日别人数、求解状态等强类型
// 红线: 外部记录在边界处完成类型校验，引擎内部不接触裸数值
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 医员 ID
pub type DoctorId = i64;

/// 外勤先 ID
pub type ClinicId = i64;

// ==========================================
// 外勤频率 (Recurrence Class)
// ==========================================
// 依据月内出现序号判定，不是 ISO 周序号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceClass {
    Weekly,       // 每周
    BiweeklyOdd,  // 隔周（奇数次）
    BiweeklyEven, // 隔周（偶数次）
    FirstOnly,    // 仅第1次
    LastOnly,     // 仅最后1次
}

impl RecurrenceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceClass::Weekly => "weekly",
            RecurrenceClass::BiweeklyOdd => "biweekly_odd",
            RecurrenceClass::BiweeklyEven => "biweekly_even",
            RecurrenceClass::FirstOnly => "first_only",
            RecurrenceClass::LastOnly => "last_only",
        }
    }

    /// 判定某个出现序号是否需要出勤
    ///
    /// # 参数
    /// - occurrence: 月内出现序号（从 1 开始）
    /// - is_last: 是否为月内最后一次
    pub fn applies_to(&self, occurrence: u32, is_last: bool) -> bool {
        match self {
            RecurrenceClass::Weekly => true,
            RecurrenceClass::BiweeklyOdd => occurrence % 2 == 1,
            RecurrenceClass::BiweeklyEven => occurrence % 2 == 0,
            RecurrenceClass::FirstOnly => occurrence == 1,
            RecurrenceClass::LastOnly => is_last,
        }
    }
}

impl Default for RecurrenceClass {
    fn default() -> Self {
        RecurrenceClass::Weekly
    }
}

impl fmt::Display for RecurrenceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecurrenceClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "weekly" => Ok(RecurrenceClass::Weekly),
            "biweekly_odd" => Ok(RecurrenceClass::BiweeklyOdd),
            "biweekly_even" => Ok(RecurrenceClass::BiweeklyEven),
            "first_only" => Ok(RecurrenceClass::FirstOnly),
            "last_only" => Ok(RecurrenceClass::LastOnly),
            other => Err(format!("未知外勤频率: {}", other)),
        }
    }
}

// ==========================================
// 优先度权重 (Affinity Weight)
// ==========================================
// 0.0=禁止, 1.0=可派遣(默认), 2.0=每月必派
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AffinityWeight {
    Forbidden,
    Eligible,
    Mandatory,
}

impl AffinityWeight {
    /// 从外部记录的浮点权重转换
    ///
    /// 仅接受 0.0 / 1.0 / 2.0，其余值返回 None（由校验层报错）
    pub fn from_value(value: f64) -> Option<Self> {
        if value == 0.0 {
            Some(AffinityWeight::Forbidden)
        } else if value == 1.0 {
            Some(AffinityWeight::Eligible)
        } else if value == 2.0 {
            Some(AffinityWeight::Mandatory)
        } else {
            None
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            AffinityWeight::Forbidden => 0.0,
            AffinityWeight::Eligible => 1.0,
            AffinityWeight::Mandatory => 2.0,
        }
    }
}

impl Default for AffinityWeight {
    fn default() -> Self {
        AffinityWeight::Eligible
    }
}

impl fmt::Display for AffinityWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AffinityWeight::Forbidden => write!(f, "FORBIDDEN"),
            AffinityWeight::Eligible => write!(f, "ELIGIBLE"),
            AffinityWeight::Mandatory => write!(f, "MANDATORY"),
        }
    }
}

// ==========================================
// 日别必要人数 (Staffing)
// ==========================================
// 无记录 = Normal(1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Staffing {
    Closed, // 休诊
    Normal, // 通常 1 人
    Double, // 2 人
}

impl Staffing {
    pub fn from_required(required: u8) -> Option<Self> {
        match required {
            0 => Some(Staffing::Closed),
            1 => Some(Staffing::Normal),
            2 => Some(Staffing::Double),
            _ => None,
        }
    }

    pub fn required_count(&self) -> u8 {
        match self {
            Staffing::Closed => 0,
            Staffing::Normal => 1,
            Staffing::Double => 2,
        }
    }
}

impl Default for Staffing {
    fn default() -> Self {
        Staffing::Normal
    }
}

// ==========================================
// 求解状态 (Solve Status)
// ==========================================
// 调用方不得把 Feasible 当作最优
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Optimal,    // 时间内证明最优
    Feasible,   // 到达时间上限，返回当前最好解
    Infeasible, // 硬约束无解
    Error,      // 求解器故障
}

impl SolveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Feasible => "feasible",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Error => "error",
        }
    }

    /// 是否携带可用的排班结果
    pub fn has_assignments(&self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }

    pub fn is_optimal(&self) -> bool {
        *self == SolveStatus::Optimal
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
