// ==========================================
// 外勤排班系统 - 排班案统计
// ==========================================
// total_variance: Σ|本月报酬 - 本月平均报酬|（报酬原值）
// satisfaction_score: 每个分配按 希望命中 / 指名命中 / 优先度(÷2) 三项取平均，
//                     再对全部分配取平均并换算为 0~100
// ==========================================

use crate::domain::plan::{Assignment, DoctorSummary};
use crate::domain::types::DoctorId;
use crate::engine::objective::absolute_deviation;
use crate::engine::validation::PlanningSnapshot;
use std::collections::BTreeMap;

pub struct PlanStatistics<'a> {
    snapshot: &'a PlanningSnapshot,
}

impl<'a> PlanStatistics<'a> {
    pub fn new(snapshot: &'a PlanningSnapshot) -> Self {
        Self { snapshot }
    }

    pub fn total_variance(&self, assignments: &[Assignment]) -> f64 {
        let mut month_fee: BTreeMap<DoctorId, f64> = self
            .snapshot
            .doctors
            .iter()
            .map(|d| (d.doctor_id, 0.0))
            .collect();
        for a in assignments {
            *month_fee.entry(a.doctor_id).or_default() += self.snapshot.fee_of(a.clinic_id) as f64;
        }
        let n = month_fee.len().max(1) as f64;
        absolute_deviation(month_fee.values().copied(), n)
    }

    pub fn satisfaction_score(&self, assignments: &[Assignment]) -> f64 {
        if assignments.is_empty() {
            return 0.0;
        }
        let total: f64 = assignments
            .iter()
            .map(|a| {
                let preferred = self.snapshot.prefers(a.doctor_id, a.clinic_id) as u8 as f64;
                let nominated = self.snapshot.is_nominated(a.doctor_id, a.clinic_id) as u8 as f64;
                let affinity = self.snapshot.affinity(a.doctor_id, a.clinic_id).value() / 2.0;
                (preferred + nominated + affinity) / 3.0
            })
            .sum();
        let score = 100.0 * total / assignments.len() as f64;
        (score * 10.0).round() / 10.0
    }

    /// 医员别汇总（按医员 ID 升序，含零出勤医员）
    pub fn doctor_summaries(&self, assignments: &[Assignment]) -> Vec<DoctorSummary> {
        self.snapshot
            .doctors
            .iter()
            .map(|doctor| {
                let id = doctor.doctor_id;
                let own: Vec<&Assignment> = assignments.iter().filter(|a| a.doctor_id == id).collect();
                let month_fee: i64 = own.iter().map(|a| self.snapshot.fee_of(a.clinic_id)).sum();
                DoctorSummary {
                    doctor_id: id,
                    assignment_count: own.len() as u32,
                    month_fee,
                    cumulative_fee: self.snapshot.prior_fee(id) + month_fee,
                    preferred_hits: own.iter().filter(|a| self.snapshot.prefers(id, a.clinic_id)).count() as u32,
                    avoided_hits: own.iter().filter(|a| self.snapshot.is_avoided(id, a.date)).count() as u32,
                }
            })
            .collect()
    }
}
