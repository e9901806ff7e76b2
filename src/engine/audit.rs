// ==========================================
// 外勤排班系统 - 排班案审计
// ==========================================
// 职责: 对任意分配列表复核全部硬约束
// 用途: 每次求解后复核求解结果；人工编辑后的排班案复核
// ==========================================

use crate::domain::plan::{Assignment, Slot};
use crate::domain::types::{AffinityWeight, ClinicId, DoctorId};
use crate::engine::validation::PlanningSnapshot;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

// ==========================================
// PlanViolation - 违反项
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanViolation {
    StaffingMismatch {
        clinic_id: ClinicId,
        date: NaiveDate,
        required: u8,
        assigned: usize,
    },
    NoSuchSlot {
        clinic_id: ClinicId,
        date: NaiveDate,
        doctor_id: DoctorId,
    },
    UnknownDoctor {
        doctor_id: DoctorId,
    },
    DuplicateAssignment {
        clinic_id: ClinicId,
        date: NaiveDate,
        doctor_id: DoctorId,
    },
    DoubleBooked {
        doctor_id: DoctorId,
        date: NaiveDate,
    },
    ForbiddenDate {
        doctor_id: DoctorId,
        date: NaiveDate,
    },
    IneligibleClinic {
        doctor_id: DoctorId,
        clinic_id: ClinicId,
        date: NaiveDate,
    },
    MandatoryUnmet {
        doctor_id: DoctorId,
        clinic_id: ClinicId,
    },
    ExceedsMonthlyLimit {
        doctor_id: DoctorId,
        limit: u32,
        assigned: usize,
    },
}

impl fmt::Display for PlanViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanViolation::StaffingMismatch { clinic_id, date, required, assigned } => write!(
                f,
                "{} 外勤先 {} 需要 {} 人，实际分配 {} 人",
                date, clinic_id, required, assigned
            ),
            PlanViolation::NoSuchSlot { clinic_id, date, doctor_id } => write!(
                f,
                "{} 外勤先 {} 无外勤枠，但分配了医员 {}",
                date, clinic_id, doctor_id
            ),
            PlanViolation::UnknownDoctor { doctor_id } => {
                write!(f, "分配了未知或停用的医员 {}", doctor_id)
            }
            PlanViolation::DuplicateAssignment { clinic_id, date, doctor_id } => write!(
                f,
                "{} 外勤先 {} 重复分配医员 {}",
                date, clinic_id, doctor_id
            ),
            PlanViolation::DoubleBooked { doctor_id, date } => {
                write!(f, "医员 {} 在 {} 有多个外勤", doctor_id, date)
            }
            PlanViolation::ForbiddenDate { doctor_id, date } => {
                write!(f, "医员 {} 被分配在其 NG 日 {}", doctor_id, date)
            }
            PlanViolation::IneligibleClinic { doctor_id, clinic_id, date } => write!(
                f,
                "医员 {} 被分配到不可派遣的外勤先 {}（{}）",
                doctor_id, clinic_id, date
            ),
            PlanViolation::MandatoryUnmet { doctor_id, clinic_id } => write!(
                f,
                "医员 {} 本月未派遣至必须派遣的外勤先 {}",
                doctor_id, clinic_id
            ),
            PlanViolation::ExceedsMonthlyLimit { doctor_id, limit, assigned } => write!(
                f,
                "医员 {} 本月出勤 {} 次，超过上限 {} 次",
                doctor_id, assigned, limit
            ),
        }
    }
}

// ==========================================
// PlanAuditor - 硬约束复核
// ==========================================
pub struct PlanAuditor<'a> {
    snapshot: &'a PlanningSnapshot,
    slots: &'a [Slot],
}

impl<'a> PlanAuditor<'a> {
    pub fn new(snapshot: &'a PlanningSnapshot, slots: &'a [Slot]) -> Self {
        Self { snapshot, slots }
    }

    /// 复核分配列表，返回全部违反项（空 = 通过）
    pub fn audit(&self, assignments: &[Assignment]) -> Vec<PlanViolation> {
        let mut violations = Vec::new();

        let slot_index: HashMap<(ClinicId, NaiveDate), &Slot> =
            self.slots.iter().map(|s| ((s.clinic_id, s.date), s)).collect();
        let active: HashSet<DoctorId> = self.snapshot.doctors.iter().map(|d| d.doctor_id).collect();

        let mut seen = HashSet::new();
        let mut per_slot: HashMap<(ClinicId, NaiveDate), usize> = HashMap::new();
        let mut per_day: BTreeMap<(DoctorId, NaiveDate), usize> = BTreeMap::new();
        let mut per_doctor: HashMap<DoctorId, usize> = HashMap::new();
        let mut reported_unknown = BTreeSet::new();

        for a in assignments {
            if !seen.insert((a.date, a.clinic_id, a.doctor_id)) {
                violations.push(PlanViolation::DuplicateAssignment {
                    clinic_id: a.clinic_id,
                    date: a.date,
                    doctor_id: a.doctor_id,
                });
                continue;
            }
            if !active.contains(&a.doctor_id) && reported_unknown.insert(a.doctor_id) {
                violations.push(PlanViolation::UnknownDoctor { doctor_id: a.doctor_id });
            }
            if !slot_index.contains_key(&(a.clinic_id, a.date)) {
                violations.push(PlanViolation::NoSuchSlot {
                    clinic_id: a.clinic_id,
                    date: a.date,
                    doctor_id: a.doctor_id,
                });
            }
            if self.snapshot.is_forbidden(a.doctor_id, a.date) {
                violations.push(PlanViolation::ForbiddenDate {
                    doctor_id: a.doctor_id,
                    date: a.date,
                });
            }
            if self.snapshot.affinity(a.doctor_id, a.clinic_id) == AffinityWeight::Forbidden {
                violations.push(PlanViolation::IneligibleClinic {
                    doctor_id: a.doctor_id,
                    clinic_id: a.clinic_id,
                    date: a.date,
                });
            }
            *per_slot.entry((a.clinic_id, a.date)).or_default() += 1;
            *per_day.entry((a.doctor_id, a.date)).or_default() += 1;
            *per_doctor.entry(a.doctor_id).or_default() += 1;
        }

        for slot in self.slots {
            let assigned = per_slot.get(&(slot.clinic_id, slot.date)).copied().unwrap_or(0);
            if assigned != slot.required as usize {
                violations.push(PlanViolation::StaffingMismatch {
                    clinic_id: slot.clinic_id,
                    date: slot.date,
                    required: slot.required,
                    assigned,
                });
            }
        }

        for ((doctor_id, date), count) in per_day {
            if count > 1 {
                violations.push(PlanViolation::DoubleBooked { doctor_id, date });
            }
        }

        for doctor in &self.snapshot.doctors {
            let Some(limit) = doctor.monthly_limit() else {
                continue;
            };
            let assigned = per_doctor.get(&doctor.doctor_id).copied().unwrap_or(0);
            if assigned > limit as usize {
                violations.push(PlanViolation::ExceedsMonthlyLimit {
                    doctor_id: doctor.doctor_id,
                    limit,
                    assigned,
                });
            }
        }

        for (doctor_id, clinic_id) in self.snapshot.mandatory_pairs() {
            let reachable = self
                .slots
                .iter()
                .any(|s| s.clinic_id == clinic_id && !self.snapshot.is_forbidden(doctor_id, s.date));
            let met = assignments
                .iter()
                .any(|a| a.doctor_id == doctor_id && a.clinic_id == clinic_id);
            if reachable && !met {
                violations.push(PlanViolation::MandatoryUnmet { doctor_id, clinic_id });
            }
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::NoHolidays;
    use crate::domain::master::{AffinityRecord, Clinic, Doctor, Preference};
    use crate::domain::month::YearMonth;
    use crate::domain::request::PlanningRequest;
    use crate::domain::types::RecurrenceClass;
    use crate::engine::slot_generator::SlotGenerator;
    use crate::engine::validation::InputValidator;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, day).unwrap()
    }

    fn prepare() -> (PlanningSnapshot, Vec<Slot>) {
        prepare_with(vec![Doctor::new(1, "甲"), Doctor::new(2, "乙")])
    }

    fn prepare_with(doctors: Vec<Doctor>) -> (PlanningSnapshot, Vec<Slot>) {
        let mut req = PlanningRequest::new(
            YearMonth::new(2026, 8).unwrap(),
            doctors,
            vec![Clinic::new(10, "A", 10000, RecurrenceClass::FirstOnly)],
        );
        req.clinics.push(Clinic::new(20, "B", 10000, RecurrenceClass::LastOnly));
        req.affinities.push(AffinityRecord { doctor_id: 2, clinic_id: 20, weight: 2.0 });
        req.affinities.push(AffinityRecord { doctor_id: 1, clinic_id: 20, weight: 0.0 });
        req.preferences.push(Preference {
            doctor_id: 1,
            ng_dates: vec![d(29)],
            ..Default::default()
        });
        let snapshot = InputValidator::new(&NoHolidays).validate(&req).unwrap();
        let slots = SlotGenerator::new().generate_slots(
            &snapshot.target_dates,
            &snapshot.clinics,
            snapshot.overrides(),
        );
        (snapshot, slots)
    }

    #[test]
    fn test_valid_plan_passes() {
        let (snapshot, slots) = prepare();
        let assignments = vec![
            Assignment { date: d(1), clinic_id: 10, doctor_id: 1 },
            Assignment { date: d(29), clinic_id: 20, doctor_id: 2 },
        ];
        assert!(PlanAuditor::new(&snapshot, &slots).audit(&assignments).is_empty());
    }

    #[test]
    fn test_monthly_limit() {
        let (snapshot, slots) = prepare_with(vec![
            Doctor::new(1, "甲"),
            Doctor::new(2, "乙").with_max_assignments(1),
        ]);
        let auditor = PlanAuditor::new(&snapshot, &slots);

        let within = vec![
            Assignment { date: d(1), clinic_id: 10, doctor_id: 1 },
            Assignment { date: d(29), clinic_id: 20, doctor_id: 2 },
        ];
        assert!(auditor.audit(&within).is_empty());

        let over = vec![
            Assignment { date: d(1), clinic_id: 10, doctor_id: 2 },
            Assignment { date: d(29), clinic_id: 20, doctor_id: 2 },
        ];
        let violations = auditor.audit(&over);
        assert_eq!(
            violations,
            vec![PlanViolation::ExceedsMonthlyLimit { doctor_id: 2, limit: 1, assigned: 2 }]
        );
        assert!(violations[0].to_string().contains("超过上限 1 次"));
    }

    #[test]
    fn test_detects_every_hard_violation() {
        let (snapshot, slots) = prepare();
        let assignments = vec![
            Assignment { date: d(1), clinic_id: 10, doctor_id: 2 },
            Assignment { date: d(1), clinic_id: 10, doctor_id: 2 },
            Assignment { date: d(29), clinic_id: 20, doctor_id: 1 },
            Assignment { date: d(8), clinic_id: 10, doctor_id: 7 },
        ];
        let violations = PlanAuditor::new(&snapshot, &slots).audit(&assignments);

        assert!(violations.contains(&PlanViolation::DuplicateAssignment {
            clinic_id: 10,
            date: d(1),
            doctor_id: 2
        }));
        assert!(violations.contains(&PlanViolation::ForbiddenDate { doctor_id: 1, date: d(29) }));
        assert!(violations.contains(&PlanViolation::IneligibleClinic {
            doctor_id: 1,
            clinic_id: 20,
            date: d(29)
        }));
        assert!(violations.contains(&PlanViolation::UnknownDoctor { doctor_id: 7 }));
        assert!(violations.contains(&PlanViolation::NoSuchSlot {
            clinic_id: 10,
            date: d(8),
            doctor_id: 7
        }));
        assert!(violations.contains(&PlanViolation::MandatoryUnmet { doctor_id: 2, clinic_id: 20 }));
    }

    #[test]
    fn test_staffing_and_double_booking() {
        let (snapshot, slots) = prepare();
        let assignments = vec![
            Assignment { date: d(1), clinic_id: 10, doctor_id: 1 },
            Assignment { date: d(1), clinic_id: 10, doctor_id: 2 },
        ];
        let violations = PlanAuditor::new(&snapshot, &slots).audit(&assignments);

        assert!(violations.contains(&PlanViolation::StaffingMismatch {
            clinic_id: 10,
            date: d(1),
            required: 1,
            assigned: 2
        }));
        assert!(violations.contains(&PlanViolation::StaffingMismatch {
            clinic_id: 20,
            date: d(29),
            required: 1,
            assigned: 0
        }));
        assert!(violations
            .iter()
            .any(|v| v.to_string().contains("未派遣至必须派遣的外勤先 20")));
    }
}
