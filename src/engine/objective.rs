// ==========================================
// 外勤排班系统 - 目标函数构建引擎
// ==========================================
// 六项评分（最小化）:
//   variance_term   报酬偏差: Σ|累计报酬 - 平均累计报酬|（原始金额）
//   preference_term 希望外勤先命中数的相反数
//   nomination_term 指名命中数的相反数
//   priority_term   优先度合计的相反数
//   avoid_penalty   尽量避开日的分配数
//   count_variance  次数偏差: Σ|出勤次数 - 平均出勤次数|
// 线性化: 绝对值项以成对非负辅助变量 pos/neg 表示
// 权重: 各项按 |权重| × 项值 加总，奖励项的项值本身为负
// 量纲: 报酬偏差以金额计，单次报酬变动即远大于次数类项
// ==========================================

use crate::domain::mode::GenerationMode;
use crate::domain::plan::{Assignment, ObjectiveBreakdown, Slot};
use crate::domain::types::DoctorId;
use crate::engine::constraint_builder::AssignmentModel;
use crate::engine::validation::PlanningSnapshot;
use good_lp::{constraint, variable, Expression};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

// ==========================================
// ObjectiveWeights - 模式权重
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveWeights {
    pub variance: f64,
    pub preference: f64,
    pub nomination: f64,
    pub priority: f64,
    pub avoid: f64,
    pub count_variance: f64,
}

impl ObjectiveWeights {
    /// 模式固定权重表
    pub fn for_mode(mode: GenerationMode) -> Self {
        match mode {
            GenerationMode::Balanced => Self::new(10.0, -1.0, -2.0, -1.0, 3.0, 5.0),
            GenerationMode::Preference => Self::new(2.0, -5.0, -3.0, -2.0, 3.0, 3.0),
            GenerationMode::Affinity => Self::new(2.0, -2.0, -2.0, -5.0, 3.0, 3.0),
        }
    }

    pub fn new(
        variance: f64,
        preference: f64,
        nomination: f64,
        priority: f64,
        avoid: f64,
        count_variance: f64,
    ) -> Self {
        Self {
            variance,
            preference,
            nomination,
            priority,
            avoid,
            count_variance,
        }
    }

    /// 加权合计
    pub fn weighted_total(&self, b: &ObjectiveBreakdown) -> f64 {
        self.variance.abs() * b.variance_term
            + self.preference.abs() * b.preference_term
            + self.nomination.abs() * b.nomination_term
            + self.priority.abs() * b.priority_term
            + self.avoid.abs() * b.avoid_penalty
            + self.count_variance.abs() * b.count_variance
    }
}

// ==========================================
// ObjectiveComposer - 目标函数构建引擎
// ==========================================
pub struct ObjectiveComposer<'a> {
    snapshot: &'a PlanningSnapshot,
    slots: &'a [Slot],
}

impl<'a> ObjectiveComposer<'a> {
    pub fn new(snapshot: &'a PlanningSnapshot, slots: &'a [Slot]) -> Self {
        Self { snapshot, slots }
    }

    /// 构建目标函数，并向模型追加偏差辅助变量及其约束
    pub fn compose(&self, model: &mut AssignmentModel, weights: &ObjectiveWeights) -> Expression {
        let doctors = &self.snapshot.doctors;
        let n = doctors.len().max(1) as f64;

        // 需求约束为等式，本月报酬总额与总次数均为常数
        let total_month_fee: f64 = self
            .slots
            .iter()
            .map(|s| (self.snapshot.fee_of(s.clinic_id) * s.required as i64) as f64)
            .sum();
        let total_prior: f64 = doctors
            .iter()
            .map(|d| self.snapshot.prior_fee(d.doctor_id) as f64)
            .sum();
        let mean_fee = (total_month_fee + total_prior) / n;
        let mean_count = self.slots.iter().map(|s| s.required as f64).sum::<f64>() / n;

        let mut fee_exprs: Vec<Expression> = vec![Expression::from(0.0); doctors.len()];
        let mut count_exprs: Vec<Expression> = vec![Expression::from(0.0); doctors.len()];
        let mut preference_term = Expression::from(0.0);
        let mut nomination_term = Expression::from(0.0);
        let mut priority_term = Expression::from(0.0);
        let mut avoid_penalty = Expression::from(0.0);

        for cell in &model.cells {
            let slot = &self.slots[cell.slot_idx];
            let doctor_id = doctors[cell.doctor_idx].doctor_id;
            let fee = self.snapshot.fee_of(slot.clinic_id) as f64;

            fee_exprs[cell.doctor_idx] += fee * cell.var;
            count_exprs[cell.doctor_idx] += cell.var;

            if self.snapshot.prefers(doctor_id, slot.clinic_id) {
                preference_term -= cell.var;
            }
            if self.snapshot.is_nominated(doctor_id, slot.clinic_id) {
                nomination_term -= cell.var;
            }
            let affinity = self.snapshot.affinity(doctor_id, slot.clinic_id).value();
            priority_term -= affinity * cell.var;
            if self.snapshot.is_avoided(doctor_id, slot.date) {
                avoid_penalty += cell.var;
            }
        }

        // ===== 绝对偏差线性化 =====
        let mut variance_term = Expression::from(0.0);
        let mut count_variance = Expression::from(0.0);
        for (idx, doctor) in doctors.iter().enumerate() {
            let prior = self.snapshot.prior_fee(doctor.doctor_id) as f64;

            let fee_pos = model.vars.add(variable().min(0));
            let fee_neg = model.vars.add(variable().min(0));
            let mut fee_dev = fee_exprs[idx].clone();
            fee_dev -= fee_pos;
            fee_dev += fee_neg;
            let fee_rhs = mean_fee - prior;
            model.constraints.push(constraint!(fee_dev == fee_rhs));
            variance_term += fee_pos;
            variance_term += fee_neg;

            let count_pos = model.vars.add(variable().min(0));
            let count_neg = model.vars.add(variable().min(0));
            let mut count_dev = count_exprs[idx].clone();
            count_dev -= count_pos;
            count_dev += count_neg;
            model.constraints.push(constraint!(count_dev == mean_count));
            count_variance += count_pos;
            count_variance += count_neg;

            model.aux_variables += 4;
        }

        debug!(
            mean_fee,
            mean_count,
            aux_variables = model.aux_variables,
            "目标函数构建完成"
        );

        weights.variance.abs() * variance_term
            + weights.preference.abs() * preference_term
            + weights.nomination.abs() * nomination_term
            + weights.priority.abs() * priority_term
            + weights.avoid.abs() * avoid_penalty
            + weights.count_variance.abs() * count_variance
    }

    /// 在最终分配上直接求值六项评分
    pub fn evaluate(&self, assignments: &[Assignment], weights: &ObjectiveWeights) -> ObjectiveBreakdown {
        let doctors = &self.snapshot.doctors;
        let n = doctors.len().max(1) as f64;

        let mut fee: HashMap<DoctorId, f64> = doctors
            .iter()
            .map(|d| (d.doctor_id, self.snapshot.prior_fee(d.doctor_id) as f64))
            .collect();
        let mut count: HashMap<DoctorId, f64> = doctors.iter().map(|d| (d.doctor_id, 0.0)).collect();
        let mut breakdown = ObjectiveBreakdown::default();

        for a in assignments {
            *fee.entry(a.doctor_id).or_default() += self.snapshot.fee_of(a.clinic_id) as f64;
            *count.entry(a.doctor_id).or_default() += 1.0;

            if self.snapshot.prefers(a.doctor_id, a.clinic_id) {
                breakdown.preference_term -= 1.0;
            }
            if self.snapshot.is_nominated(a.doctor_id, a.clinic_id) {
                breakdown.nomination_term -= 1.0;
            }
            breakdown.priority_term -= self.snapshot.affinity(a.doctor_id, a.clinic_id).value();
            if self.snapshot.is_avoided(a.doctor_id, a.date) {
                breakdown.avoid_penalty += 1.0;
            }
        }

        breakdown.variance_term = absolute_deviation(fee.values().copied(), n);
        breakdown.count_variance = absolute_deviation(count.values().copied(), n);
        breakdown.weighted_total = weights.weighted_total(&breakdown);
        breakdown
    }
}

/// Σ|x - mean|
pub fn absolute_deviation(values: impl Iterator<Item = f64> + Clone, n: f64) -> f64 {
    let mean = values.clone().sum::<f64>() / n;
    values.map(|v| (v - mean).abs()).sum()
}
