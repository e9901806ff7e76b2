// ==========================================
// 外勤排班系统 - 累计报酬推导
// ==========================================
// 职责: 由既往已确定排班案推导各医员的累计报酬（报酬偏差项的既往部分）
// 规则: 仅计入对象月之前、已确定的排班案；报酬按外勤先表查找，未知外勤先计 0
// ==========================================

use crate::domain::master::Clinic;
use crate::domain::month::YearMonth;
use crate::domain::plan::Plan;
use crate::domain::types::{ClinicId, DoctorId};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

pub fn cumulative_fees(
    confirmed_plans: &[Plan],
    clinics: &[Clinic],
    before_month: YearMonth,
) -> HashMap<DoctorId, i64> {
    let fee_by_clinic: HashMap<ClinicId, i64> = clinics.iter().map(|c| (c.clinic_id, c.fee)).collect();

    let mut months = BTreeSet::new();
    let mut fees: HashMap<DoctorId, i64> = HashMap::new();
    for plan in confirmed_plans
        .iter()
        .filter(|p| p.is_confirmed && p.year_month < before_month)
    {
        if !months.insert(plan.year_month) {
            warn!(year_month = %plan.year_month, plan_id = %plan.plan_id, "同月存在多个已确定排班案，重复计入");
        }
        for a in &plan.assignments {
            *fees.entry(a.doctor_id).or_default() += fee_by_clinic.get(&a.clinic_id).copied().unwrap_or(0);
        }
    }

    debug!(months = months.len(), doctors = fees.len(), "累计报酬推导完成");
    fees
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::mode::GenerationMode;
    use crate::domain::plan::Assignment;
    use crate::domain::types::{RecurrenceClass, SolveStatus};
    use chrono::NaiveDate;

    fn plan(ym: YearMonth, confirmed: bool, rows: &[(u32, ClinicId, DoctorId)]) -> Plan {
        let mut plan = Plan::failed(ym, GenerationMode::Balanced, SolveStatus::Optimal, vec![], 0);
        plan.is_confirmed = confirmed;
        plan.assignments = rows
            .iter()
            .map(|&(day, clinic_id, doctor_id)| Assignment {
                date: NaiveDate::from_ymd_opt(ym.year(), ym.month(), day).unwrap(),
                clinic_id,
                doctor_id,
            })
            .collect();
        plan
    }

    #[test]
    fn test_only_confirmed_earlier_months_count() {
        let clinics = vec![
            Clinic::new(10, "A", 10000, RecurrenceClass::Weekly),
            Clinic::new(20, "B", 25000, RecurrenceClass::Weekly),
        ];
        let june = YearMonth::new(2026, 6).unwrap();
        let july = YearMonth::new(2026, 7).unwrap();
        let august = YearMonth::new(2026, 8).unwrap();

        let plans = vec![
            plan(june, true, &[(6, 10, 1), (13, 20, 2), (20, 99, 1)]),
            plan(july, true, &[(4, 20, 1)]),
            plan(july, false, &[(4, 10, 2)]),
            plan(august, true, &[(1, 10, 2)]),
        ];
        let fees = cumulative_fees(&plans, &clinics, august);

        assert_eq!(fees.get(&1), Some(&35000));
        assert_eq!(fees.get(&2), Some(&25000));
    }
}
