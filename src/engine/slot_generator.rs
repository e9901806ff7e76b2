// ==========================================
// 外勤排班系统 - 外勤枠生成引擎
// ==========================================
// 职责: 外勤先 × 对象日 → 外勤枠
// 规则: 先按外勤频率过滤出现序号，再套用日别人数（0=休诊不产生枠）
// 输出: 按 (date, clinic_id) 升序排列的 Slot
// ==========================================

use crate::calendar::TargetDate;
use crate::domain::master::Clinic;
use crate::domain::plan::Slot;
use crate::domain::types::{ClinicId, Staffing};
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, instrument};

// ==========================================
// SlotGenerator - 外勤枠生成引擎
// ==========================================
pub struct SlotGenerator {
    // 无状态引擎
}

impl SlotGenerator {
    pub fn new() -> Self {
        Self {}
    }

    /// 生成外勤枠
    ///
    /// # 参数
    /// - `dates`: 对象日（含出现序号）
    /// - `clinics`: 外勤先（停用的被跳过）
    /// - `overrides`: 日别人数，无记录按 1 人
    #[instrument(skip_all, fields(dates = dates.len(), clinics = clinics.len()))]
    pub fn generate_slots(
        &self,
        dates: &[TargetDate],
        clinics: &[Clinic],
        overrides: &HashMap<(ClinicId, NaiveDate), Staffing>,
    ) -> Vec<Slot> {
        let mut ordered: Vec<&Clinic> = clinics.iter().filter(|c| c.is_active).collect();
        ordered.sort_by_key(|c| c.clinic_id);

        let mut slots = Vec::new();
        for target in dates {
            for clinic in &ordered {
                if !clinic.frequency.applies_to(target.occurrence, target.is_last) {
                    continue;
                }

                let staffing = overrides
                    .get(&(clinic.clinic_id, target.date))
                    .copied()
                    .unwrap_or_default();
                if staffing == Staffing::Closed {
                    debug!(clinic_id = clinic.clinic_id, date = %target.date, "休诊，不产生外勤枠");
                    continue;
                }

                slots.push(Slot {
                    clinic_id: clinic.clinic_id,
                    date: target.date,
                    required: staffing.required_count(),
                });
            }
        }

        slots.sort_by_key(|s| (s.date, s.clinic_id));
        debug!(slots = slots.len(), "外勤枠生成完成");
        slots
    }
}

impl Default for SlotGenerator {
    fn default() -> Self {
        Self::new()
    }
}
