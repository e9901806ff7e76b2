// ==========================================
// 外勤排班系统 - 约束构建引擎
// ==========================================
// 决策变量: (医员, 外勤枠) 的 0/1 指示变量
// 硬约束:
//   1. 需求充足: 每个枠的指示变量之和 == 所需人数
//   2. 一日一勤: 每名医员每日 <= 1
//   3. NG 日: 不生成变量（等价于固定为 0）
//   4. 优先度 0: 不生成变量（等价于固定为 0）
//   5. 必须派遣: 优先度 2 的组合在本月至少 1 次
//   6. 月上限: max_assignments > 0 的医员本月合计 <= 上限
// 冲突诊断: 求解前可判定的结构性冲突记录为冲突说明
// ==========================================

use crate::domain::plan::Slot;
use crate::domain::types::{AffinityWeight, DoctorId};
use crate::engine::validation::PlanningSnapshot;
use chrono::NaiveDate;
use good_lp::{constraint, variable, Constraint, Expression, ProblemVariables, Variable};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, instrument};

// ==========================================
// AssignmentCell - 指示变量
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct AssignmentCell {
    pub doctor_idx: usize, // snapshot.doctors 下标
    pub slot_idx: usize,   // slots 下标
    pub var: Variable,
}

// ==========================================
// AssignmentModel - 变量空间 + 硬约束
// ==========================================
// 每次求解单独构建，模式之间不共享
pub struct AssignmentModel {
    pub vars: ProblemVariables,
    pub cells: Vec<AssignmentCell>,
    pub constraints: Vec<Constraint>,
    pub conflicts: Vec<String>,
    pub aux_variables: usize,
}

impl AssignmentModel {
    pub fn cells_of_doctor(&self, doctor_idx: usize) -> impl Iterator<Item = &AssignmentCell> {
        self.cells.iter().filter(move |c| c.doctor_idx == doctor_idx)
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    pub fn variable_count(&self) -> usize {
        self.cells.len() + self.aux_variables
    }
}

// ==========================================
// ConstraintBuilder - 约束构建引擎
// ==========================================
pub struct ConstraintBuilder<'a> {
    snapshot: &'a PlanningSnapshot,
    slots: &'a [Slot],
}

impl<'a> ConstraintBuilder<'a> {
    pub fn new(snapshot: &'a PlanningSnapshot, slots: &'a [Slot]) -> Self {
        Self { snapshot, slots }
    }

    /// 构建变量空间与全部硬约束
    ///
    /// 变量按 (枠, 医员) 的顺序创建，枠已按 (date, clinic_id) 排序，
    /// 医员已按 ID 排序，同一输入总是得到同一模型
    #[instrument(skip(self), fields(slots = self.slots.len(), doctors = self.snapshot.doctors.len()))]
    pub fn build(&self) -> AssignmentModel {
        let mut vars = ProblemVariables::new();
        let mut cells = Vec::new();
        let mut constraints = Vec::new();
        let mut conflicts = Vec::new();

        // ===== 变量（剪除 NG 日与优先度 0） =====
        let mut candidates: Vec<Vec<Variable>> = vec![Vec::new(); self.slots.len()];
        for (slot_idx, slot) in self.slots.iter().enumerate() {
            for (doctor_idx, doctor) in self.snapshot.doctors.iter().enumerate() {
                if !self.is_candidate(doctor.doctor_id, slot) {
                    continue;
                }
                let var = vars.add(variable().binary());
                candidates[slot_idx].push(var);
                cells.push(AssignmentCell {
                    doctor_idx,
                    slot_idx,
                    var,
                });
            }
        }

        // ===== 1. 需求充足 =====
        for (slot, slot_vars) in self.slots.iter().zip(&candidates) {
            if slot_vars.len() < slot.required as usize {
                conflicts.push(format!(
                    "{} 外勤先 {} 需要 {} 人，但可派遣医员仅 {} 人",
                    slot.date,
                    slot.clinic_id,
                    slot.required,
                    slot_vars.len()
                ));
                continue;
            }
            let assigned: Expression = slot_vars.iter().copied().sum();
            let required = slot.required as f64;
            constraints.push(constraint!(assigned == required));
        }

        // ===== 2. 一日一勤 =====
        let mut per_day: BTreeMap<(usize, NaiveDate), Vec<Variable>> = BTreeMap::new();
        for cell in &cells {
            per_day
                .entry((cell.doctor_idx, self.slots[cell.slot_idx].date))
                .or_default()
                .push(cell.var);
        }
        for day_vars in per_day.values().filter(|v| v.len() > 1) {
            let duties: Expression = day_vars.iter().copied().sum();
            constraints.push(constraint!(duties <= 1.0));
        }

        // 日别总需求与可出勤医员数
        let mut demand_by_date: BTreeMap<NaiveDate, u32> = BTreeMap::new();
        for slot in self.slots {
            *demand_by_date.entry(slot.date).or_default() += slot.required as u32;
        }
        for (date, demand) in &demand_by_date {
            let available = self
                .snapshot
                .doctors
                .iter()
                .filter(|d| !self.snapshot.is_forbidden(d.doctor_id, *date))
                .count() as u32;
            if *demand > available {
                conflicts.push(format!(
                    "{} 合计需要 {} 人，但可出勤医员仅 {} 人",
                    date, demand, available
                ));
            }
        }

        // ===== 6. 月上限 =====
        for (doctor_idx, doctor) in self.snapshot.doctors.iter().enumerate() {
            let Some(limit) = doctor.monthly_limit() else {
                continue;
            };
            let doctor_vars: Vec<Variable> = cells
                .iter()
                .filter(|c| c.doctor_idx == doctor_idx)
                .map(|c| c.var)
                .collect();
            if doctor_vars.len() <= limit as usize {
                continue;
            }
            let duties: Expression = doctor_vars.into_iter().sum();
            let limit = limit as f64;
            constraints.push(constraint!(duties <= limit));
        }

        // 任一医员不限次数时总容量不受限
        let total_demand: u32 = demand_by_date.values().sum();
        let total_limit: Option<u32> = self
            .snapshot
            .doctors
            .iter()
            .map(|d| d.monthly_limit())
            .sum();
        if let Some(total_limit) = total_limit {
            if total_demand > total_limit {
                conflicts.push(format!(
                    "本月合计需要 {} 人次，但医员出勤上限合计仅 {} 次",
                    total_demand, total_limit
                ));
            }
        }

        // ===== 5. 必须派遣 =====
        let doctor_index: HashMap<DoctorId, usize> = self
            .snapshot
            .doctors
            .iter()
            .enumerate()
            .map(|(i, d)| (d.doctor_id, i))
            .collect();
        for (doctor_id, clinic_id) in self.snapshot.mandatory_pairs() {
            let Some(&doctor_idx) = doctor_index.get(&doctor_id) else {
                continue;
            };
            let clinic_slots = self.slots.iter().filter(|s| s.clinic_id == clinic_id).count();
            if clinic_slots == 0 {
                debug!(doctor_id, clinic_id, "本月无该外勤先的枠，必须派遣约束不生效");
                continue;
            }

            let pair_vars: Vec<Variable> = cells
                .iter()
                .filter(|c| c.doctor_idx == doctor_idx && self.slots[c.slot_idx].clinic_id == clinic_id)
                .map(|c| c.var)
                .collect();
            if pair_vars.is_empty() {
                conflicts.push(format!(
                    "医员 {} 必须派遣至外勤先 {}，但该外勤先本月的 {} 个外勤日均为其 NG 日",
                    doctor_id, clinic_id, clinic_slots
                ));
                continue;
            }
            let visits: Expression = pair_vars.into_iter().sum();
            constraints.push(constraint!(visits >= 1.0));
        }

        info!(
            variables = cells.len(),
            constraints = constraints.len(),
            conflicts = conflicts.len(),
            "约束构建完成"
        );

        AssignmentModel {
            vars,
            cells,
            constraints,
            conflicts,
            aux_variables: 0,
        }
    }

    fn is_candidate(&self, doctor_id: DoctorId, slot: &Slot) -> bool {
        self.snapshot.affinity(doctor_id, slot.clinic_id) != AffinityWeight::Forbidden
            && !self.snapshot.is_forbidden(doctor_id, slot.date)
    }
}
