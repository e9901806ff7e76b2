// ==========================================
// 外勤排班系统 - 引擎错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 无解/超时/求解器故障属于各模式的求解状态，不在此处建模
// ==========================================

use crate::domain::types::{ClinicId, DoctorId};
use chrono::NaiveDate;
use thiserror::Error;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum PlannerError {
    // ===== 输入校验错误（求解前快速失败） =====
    #[error("无在籍医员")]
    NoActiveDoctors,

    #[error("无有效外勤先")]
    NoActiveClinics,

    #[error("对象月无出勤日: {year_month}")]
    NoTargetDates { year_month: String },

    #[error("月份格式错误: {0}")]
    InvalidMonth(String),

    #[error("希望记录引用了未知医员: doctor_id={doctor_id}")]
    UnknownDoctor { doctor_id: DoctorId },

    #[error("希望记录引用了未知外勤先: doctor_id={doctor_id}, clinic_id={clinic_id}")]
    UnknownClinic {
        doctor_id: DoctorId,
        clinic_id: ClinicId,
    },

    #[error("同一医员存在多条希望记录: doctor_id={doctor_id}")]
    DuplicatePreference { doctor_id: DoctorId },

    #[error("重复的{entity} ID: {id}")]
    DuplicateId { entity: &'static str, id: i64 },

    #[error("优先度权重非法: doctor_id={doctor_id}, clinic_id={clinic_id}, weight={weight}（仅允许 0/1/2）")]
    InvalidAffinityWeight {
        doctor_id: DoctorId,
        clinic_id: ClinicId,
        weight: f64,
    },

    #[error("日别人数非法: clinic_id={clinic_id}, date={date}, required={required}（仅允许 0/1/2）")]
    InvalidStaffing {
        clinic_id: ClinicId,
        date: NaiveDate,
        required: u8,
    },

    #[error("外勤报酬为负数: clinic_id={clinic_id}, fee={fee}")]
    NegativeFee { clinic_id: ClinicId, fee: i64 },

    // ===== 配置错误 =====
    #[error("配置错误: {0}")]
    Config(String),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PlannerError {
    /// 是否为输入校验错误
    pub fn is_validation(&self) -> bool {
        !matches!(self, PlannerError::Config(_) | PlannerError::Other(_))
    }
}

pub type PlannerResult<T> = Result<T, PlannerError>;
