// ==========================================
// 外勤排班系统 - 输入校验与快照构建
// ==========================================
// 职责: 在任何求解之前校验外部记录，转换为强类型只读快照
// 红线: 非法输入在边界处以 PlannerError 拒绝，不进入约束构建
// ==========================================

use crate::calendar::{CalendarResolver, HolidayCalendar, TargetDate};
use crate::domain::master::{Clinic, Doctor};
use crate::domain::month::YearMonth;
use crate::domain::request::PlanningRequest;
use crate::domain::types::{AffinityWeight, ClinicId, DoctorId, Staffing};
use crate::engine::error::{PlannerError, PlannerResult};
use chrono::{NaiveDate, Weekday};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, info, warn};

// ==========================================
// DoctorPreference - 规整后的月别希望
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoctorPreference {
    pub forbidden: BTreeSet<NaiveDate>,
    pub avoided: BTreeSet<NaiveDate>,
    pub preferred_clinics: BTreeSet<ClinicId>,
}

// ==========================================
// PlanningSnapshot - 校验后的只读快照
// ==========================================
#[derive(Debug, Clone)]
pub struct PlanningSnapshot {
    pub year_month: YearMonth,
    pub doctors: Vec<Doctor>,      // 在籍医员（按 ID 升序）
    pub clinics: Vec<Clinic>,      // 有效外勤先（按 ID 升序）
    pub target_dates: Vec<TargetDate>,
    affinities: HashMap<(DoctorId, ClinicId), AffinityWeight>,
    overrides: HashMap<(ClinicId, NaiveDate), Staffing>,
    preferences: HashMap<DoctorId, DoctorPreference>,
    prior_fees: HashMap<DoctorId, i64>,
    clinic_index: HashMap<ClinicId, usize>,
}

impl PlanningSnapshot {
    pub fn affinity(&self, doctor_id: DoctorId, clinic_id: ClinicId) -> AffinityWeight {
        self.affinities
            .get(&(doctor_id, clinic_id))
            .copied()
            .unwrap_or_default()
    }

    /// 优先度为 2.0 的（医员, 外勤先）组合，按 ID 升序
    pub fn mandatory_pairs(&self) -> Vec<(DoctorId, ClinicId)> {
        let mut pairs: Vec<(DoctorId, ClinicId)> = self
            .affinities
            .iter()
            .filter(|(_, w)| **w == AffinityWeight::Mandatory)
            .map(|(k, _)| *k)
            .collect();
        pairs.sort();
        pairs
    }

    pub fn staffing(&self, clinic_id: ClinicId, date: NaiveDate) -> Staffing {
        self.overrides
            .get(&(clinic_id, date))
            .copied()
            .unwrap_or_default()
    }

    pub fn overrides(&self) -> &HashMap<(ClinicId, NaiveDate), Staffing> {
        &self.overrides
    }

    pub fn preference(&self, doctor_id: DoctorId) -> Option<&DoctorPreference> {
        self.preferences.get(&doctor_id)
    }

    pub fn is_forbidden(&self, doctor_id: DoctorId, date: NaiveDate) -> bool {
        self.preference(doctor_id)
            .map(|p| p.forbidden.contains(&date))
            .unwrap_or(false)
    }

    pub fn is_avoided(&self, doctor_id: DoctorId, date: NaiveDate) -> bool {
        self.preference(doctor_id)
            .map(|p| p.avoided.contains(&date))
            .unwrap_or(false)
    }

    pub fn prefers(&self, doctor_id: DoctorId, clinic_id: ClinicId) -> bool {
        self.preference(doctor_id)
            .map(|p| p.preferred_clinics.contains(&clinic_id))
            .unwrap_or(false)
    }

    pub fn is_nominated(&self, doctor_id: DoctorId, clinic_id: ClinicId) -> bool {
        self.clinic(clinic_id)
            .map(|c| c.nominates(doctor_id))
            .unwrap_or(false)
    }

    pub fn prior_fee(&self, doctor_id: DoctorId) -> i64 {
        self.prior_fees.get(&doctor_id).copied().unwrap_or(0)
    }

    pub fn clinic(&self, clinic_id: ClinicId) -> Option<&Clinic> {
        self.clinic_index.get(&clinic_id).map(|&i| &self.clinics[i])
    }

    pub fn fee_of(&self, clinic_id: ClinicId) -> i64 {
        self.clinic(clinic_id).map(|c| c.fee).unwrap_or(0)
    }
}

// ==========================================
// InputValidator - 输入校验器
// ==========================================
pub struct InputValidator<'a> {
    holidays: &'a dyn HolidayCalendar,
    weekday: Weekday,
}

impl<'a> InputValidator<'a> {
    pub fn new(holidays: &'a dyn HolidayCalendar) -> Self {
        Self {
            holidays,
            weekday: Weekday::Sat,
        }
    }

    pub fn with_weekday(mut self, weekday: Weekday) -> Self {
        self.weekday = weekday;
        self
    }

    /// 校验请求并构建快照
    ///
    /// # 规则
    /// 1. 至少一名在籍医员、一个有效外勤先、一个出勤日
    /// 2. 医员/外勤先 ID 不得重复，报酬不得为负
    /// 3. 优先度仅允许 0/1/2，日别人数仅允许 0/1/2
    /// 4. 希望记录必须引用已知医员/外勤先，每名医员至多一条
    /// 5. 同一日期同时为 NG 与尽量避开时，按 NG 处理
    /// 6. 对象月以外的日期、未知或停用对象的优先度/日别设定被忽略
    pub fn validate(&self, request: &PlanningRequest) -> PlannerResult<PlanningSnapshot> {
        let year_month = request.year_month;

        // ===== 主数据 =====
        ensure_unique("医员", request.doctors.iter().map(|d| d.doctor_id))?;
        ensure_unique("外勤先", request.clinics.iter().map(|c| c.clinic_id))?;

        if let Some(c) = request.clinics.iter().find(|c| c.fee < 0) {
            return Err(PlannerError::NegativeFee {
                clinic_id: c.clinic_id,
                fee: c.fee,
            });
        }

        let mut doctors: Vec<Doctor> = request
            .doctors
            .iter()
            .filter(|d| d.is_active)
            .cloned()
            .collect();
        doctors.sort_by_key(|d| d.doctor_id);
        if doctors.is_empty() {
            return Err(PlannerError::NoActiveDoctors);
        }

        let mut clinics: Vec<Clinic> = request
            .clinics
            .iter()
            .filter(|c| c.is_active)
            .cloned()
            .collect();
        clinics.sort_by_key(|c| c.clinic_id);
        if clinics.is_empty() {
            return Err(PlannerError::NoActiveClinics);
        }

        // ===== 对象日 =====
        let target_dates = CalendarResolver::new(self.holidays)
            .with_weekday(self.weekday)
            .resolve_target_dates(year_month);
        if target_dates.is_empty() {
            return Err(PlannerError::NoTargetDates {
                year_month: year_month.to_string(),
            });
        }

        let active_doctors: HashSet<DoctorId> = doctors.iter().map(|d| d.doctor_id).collect();
        let active_clinics: HashSet<ClinicId> = clinics.iter().map(|c| c.clinic_id).collect();
        let known_doctors: HashSet<DoctorId> = request.doctors.iter().map(|d| d.doctor_id).collect();
        let known_clinics: HashSet<ClinicId> = request.clinics.iter().map(|c| c.clinic_id).collect();

        // ===== 优先度 =====
        let mut affinities = HashMap::new();
        for record in &request.affinities {
            let weight = AffinityWeight::from_value(record.weight).ok_or(
                PlannerError::InvalidAffinityWeight {
                    doctor_id: record.doctor_id,
                    clinic_id: record.clinic_id,
                    weight: record.weight,
                },
            )?;
            if !active_doctors.contains(&record.doctor_id)
                || !active_clinics.contains(&record.clinic_id)
            {
                debug!(
                    doctor_id = record.doctor_id,
                    clinic_id = record.clinic_id,
                    "优先度记录引用停用或未知对象，忽略"
                );
                continue;
            }
            affinities.insert((record.doctor_id, record.clinic_id), weight);
        }

        // ===== 日别设定 =====
        let mut overrides = HashMap::new();
        for record in &request.overrides {
            let staffing = Staffing::from_required(record.required_doctors).ok_or(
                PlannerError::InvalidStaffing {
                    clinic_id: record.clinic_id,
                    date: record.date,
                    required: record.required_doctors,
                },
            )?;
            if !year_month.contains(record.date) || !active_clinics.contains(&record.clinic_id) {
                continue;
            }
            // 值为 1 与无记录等价
            if staffing != Staffing::Normal {
                overrides.insert((record.clinic_id, record.date), staffing);
            }
        }

        // ===== 月别希望 =====
        let mut preferences = HashMap::new();
        for pref in &request.preferences {
            if !known_doctors.contains(&pref.doctor_id) {
                return Err(PlannerError::UnknownDoctor {
                    doctor_id: pref.doctor_id,
                });
            }
            if let Some(&clinic_id) = pref
                .preferred_clinics
                .iter()
                .find(|c| !known_clinics.contains(c))
            {
                return Err(PlannerError::UnknownClinic {
                    doctor_id: pref.doctor_id,
                    clinic_id,
                });
            }
            if preferences.contains_key(&pref.doctor_id) {
                return Err(PlannerError::DuplicatePreference {
                    doctor_id: pref.doctor_id,
                });
            }

            let forbidden: BTreeSet<NaiveDate> = pref
                .ng_dates
                .iter()
                .copied()
                .filter(|d| year_month.contains(*d))
                .collect();
            let avoided: BTreeSet<NaiveDate> = pref
                .avoid_dates
                .iter()
                .copied()
                .filter(|d| year_month.contains(*d) && !forbidden.contains(d))
                .collect();
            if avoided.len() < pref.avoid_dates.iter().filter(|d| year_month.contains(**d)).count() {
                warn!(doctor_id = pref.doctor_id, "NG 日与尽量避开日重叠，按 NG 处理");
            }

            preferences.insert(
                pref.doctor_id,
                DoctorPreference {
                    forbidden,
                    avoided,
                    preferred_clinics: pref.preferred_clinics.iter().copied().collect(),
                },
            );
        }

        let prior_fees: HashMap<DoctorId, i64> = request
            .prior_cumulative_fees
            .iter()
            .filter(|(id, _)| active_doctors.contains(id))
            .map(|(id, fee)| (*id, *fee))
            .collect();

        let clinic_index = clinics
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clinic_id, i))
            .collect();

        info!(
            year_month = %year_month,
            doctors = doctors.len(),
            clinics = clinics.len(),
            target_dates = target_dates.len(),
            affinities = affinities.len(),
            overrides = overrides.len(),
            preferences = preferences.len(),
            "输入校验完成"
        );

        Ok(PlanningSnapshot {
            year_month,
            doctors,
            clinics,
            target_dates,
            affinities,
            overrides,
            preferences,
            prior_fees,
            clinic_index,
        })
    }
}

fn ensure_unique(entity: &'static str, ids: impl Iterator<Item = i64>) -> PlannerResult<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(PlannerError::DuplicateId { entity, id });
        }
    }
    Ok(())
}
