// ==========================================
// PlanGenerator 集成测试
// ==========================================
// 测试范围:
// 1. 典型场景: 均分、必须派遣冲突、休诊、2 人体制
// 2. 硬约束性质: 需求充足、一日一勤、NG 日、优先度 0/2
// 3. 确定性: 相同输入得到相同分配
// 4. 模式差异与既往报酬、报酬均衡与希望的取舍
// 5. 月出勤上限
// 6. 求解时限: 非最优结果仍满足硬约束
// 7. 输入校验: 求解前快速失败
// ==========================================


use chrono::NaiveDate;
use clinic_duty_planner::engine::{GeneratorSettings, PlanGenerator, PlannerError, SolverSettings};
use clinic_duty_planner::{
    GenerationMode, Plan, PlanningRequest, Preference, RecurrenceClass, SolveStatus,
};
use std::collections::{HashMap, HashSet};
use test_helpers::*;

fn plan_of(plans: &[Plan], mode: GenerationMode) -> &Plan {
    plans.iter().find(|p| p.mode == mode).expect("缺少模式")
}

fn count_by_doctor(plan: &Plan) -> HashMap<i64, usize> {
    let mut counts = HashMap::new();
    for a in &plan.assignments {
        *counts.entry(a.doctor_id).or_default() += 1;
    }
    counts
}

fn visits(plan: &Plan, doctor_id: i64, clinic_id: i64) -> usize {
    plan.assignments
        .iter()
        .filter(|a| a.doctor_id == doctor_id && a.clinic_id == clinic_id)
        .count()
}

// ==========================================
// 典型场景
// ==========================================

#[test]
fn test_scenario_a_均衡方案均分() {
    let request = scenario_a();
    let plans = generate(&request);
    let plan = plan_of(&plans, GenerationMode::Balanced);

    assert_eq!(plan.status, SolveStatus::Optimal);
    assert_eq!(plan.assignments.len(), 4);
    let counts = count_by_doctor(plan);
    assert_eq!(counts.get(&1), Some(&2));
    assert_eq!(counts.get(&2), Some(&2));
    assert_eq!(plan.total_variance, 0.0);

    let objective = plan.objective.as_ref().expect("缺少目标函数分项");
    assert!(objective.variance_term.abs() < 1e-9);
    assert!(objective.count_variance.abs() < 1e-9);
    assert_eq!(objective.priority_term, -4.0);
    assert_hard_invariants(&request, plan);
}

#[test]
fn test_scenario_b_必须派遣且全部ng为无解() {
    let mut request = rich_request();
    let all_days: Vec<NaiveDate> = request.year_month.days().collect();
    for pref in request.preferences.iter_mut().filter(|p| p.doctor_id == 3) {
        pref.ng_dates = all_days.clone();
    }

    let plans = generate(&request);
    assert_eq!(plans.len(), 3);
    for plan in &plans {
        assert_eq!(plan.status, SolveStatus::Infeasible, "模式 {}", plan.mode);
        assert!(plan.assignments.is_empty());
        assert!(plan.objective.is_none());
        assert!(
            plan.conflicts.iter().any(|c| c.contains("医员 3") && c.contains("外勤先 30")),
            "冲突说明应指出医员 3 与外勤先 30: {:?}",
            plan.conflicts
        );
    }
}

#[test]
fn test_scenario_b_其他医员不受影响() {
    // 同一请求去掉冲突后可解，且必须派遣成立
    let request = rich_request();
    let plans = generate(&request);
    for plan in &plans {
        assert!(plan.status.has_assignments(), "模式 {}: {:?}", plan.mode, plan.conflicts);
        assert!(plan
            .assignments
            .iter()
            .any(|a| a.doctor_id == 3 && a.clinic_id == 30));
    }
}

#[test]
fn test_scenario_c_休诊日无枠无分配() {
    let mut request = scenario_a();
    request.year_month = ym(2026, 8);
    request.overrides.push(override_on(10, aug(1), 0));

    let run = PlanGenerator::new(&clinic_duty_planner::NoHolidays, GeneratorSettings::default())
        .prepare(&request)
        .unwrap();
    assert!(run.slots.iter().all(|s| !(s.clinic_id == 10 && s.date == aug(1))));
    assert_eq!(run.slots.len(), 4);

    for plan in generate(&request) {
        assert_eq!(plan.status, SolveStatus::Optimal);
        assert_eq!(plan.count_at(10, aug(1)), 0);
        assert_eq!(plan.assignments.len(), 4);
    }
}

#[test]
fn test_scenario_d_二人体制分配两名不同医员() {
    let mut request = scenario_a();
    request.year_month = ym(2026, 8);
    request.doctors = doctors(&[1, 2, 3]);
    request.overrides.push(override_on(10, aug(15), 2));

    for plan in generate(&request) {
        assert!(plan.status.has_assignments());
        let on_slot: HashSet<i64> = plan
            .assignments
            .iter()
            .filter(|a| a.clinic_id == 10 && a.date == aug(15))
            .map(|a| a.doctor_id)
            .collect();
        assert_eq!(on_slot.len(), 2, "模式 {}", plan.mode);
        assert_eq!(plan.assignments.len(), 6);
    }
}

#[test]
fn test_all_clinics_closed_returns_empty_optimal_plans() {
    let mut request = PlanningRequest::new(
        ym(2026, 8),
        doctors(&[1, 2]),
        vec![clinic(10, 10000, RecurrenceClass::FirstOnly)],
    );
    request.overrides.push(override_on(10, aug(1), 0));

    let plans = generate(&request);
    assert_eq!(plans.len(), 3);
    for plan in &plans {
        assert_eq!(plan.status, SolveStatus::Optimal);
        assert!(plan.assignments.is_empty());
        assert_eq!(plan.doctor_summaries.len(), 2);
    }
}

// ==========================================
// 硬约束性质
// ==========================================

#[test]
fn test_hard_constraints_hold_in_every_mode() {
    let request = rich_request();
    let plans = generate(&request);

    let expected_slots: Vec<(NaiveDate, i64, usize)> = vec![
        (aug(1), 10, 1),
        (aug(8), 10, 1),
        (aug(8), 40, 1),
        (aug(15), 10, 2),
        (aug(15), 20, 1),
        (aug(22), 10, 1),
        (aug(22), 40, 1),
        (aug(29), 10, 1),
        (aug(29), 20, 1),
        (aug(29), 30, 1),
    ];

    for plan in &plans {
        assert!(plan.status.has_assignments(), "模式 {}: {:?}", plan.mode, plan.conflicts);

        // 需求充足
        for (date, clinic_id, required) in &expected_slots {
            assert_eq!(plan.count_at(*clinic_id, *date), *required, "{} {}", date, clinic_id);
        }
        assert_eq!(plan.assignments.len(), 11);
        assert_eq!(plan.count_at(20, aug(1)), 0);

        // 一日一勤
        let mut seen = HashSet::new();
        for a in &plan.assignments {
            assert!(seen.insert((a.doctor_id, a.date)), "医员 {} 在 {} 重复", a.doctor_id, a.date);
        }

        // 优先度 0
        assert!(!plan.assignments.iter().any(|a| a.doctor_id == 2 && a.clinic_id == 20));
        assert!(!plan.assignments.iter().any(|a| a.doctor_id == 5 && a.clinic_id == 10));

        // NG 日
        assert!(!plan
            .assignments
            .iter()
            .any(|a| a.doctor_id == 1 && (a.date == aug(8) || a.date == aug(22))));
        assert!(!plan.assignments.iter().any(|a| a.doctor_id == 4 && a.date == aug(29)));

        // 优先度 2
        assert!(plan.assignments.iter().any(|a| a.doctor_id == 3 && a.clinic_id == 30));

        assert_hard_invariants(&request, plan);
    }
}

#[test]
fn test_plan_records_are_complete() {
    let request = rich_request();
    let plans = generate(&request);

    let modes: Vec<GenerationMode> = plans.iter().map(|p| p.mode).collect();
    assert_eq!(modes, GenerationMode::ALL.to_vec());

    for plan in &plans {
        assert!(!plan.is_confirmed);
        assert_eq!(plan.year_month, ym(2026, 8));
        assert_eq!(plan.plan_name, plan.mode.title_cn());
        assert!((0.0..=100.0).contains(&plan.satisfaction_score));

        // 分配已按 (date, clinic_id, doctor_id) 排序
        let mut sorted = plan.assignments.clone();
        sorted.sort();
        assert_eq!(sorted, plan.assignments);

        // 医员别汇总与分配一致
        assert_eq!(plan.doctor_summaries.len(), 5);
        let total: u32 = plan.doctor_summaries.iter().map(|s| s.assignment_count).sum();
        assert_eq!(total as usize, plan.assignments.len());
        let first = &plan.doctor_summaries[0];
        assert_eq!(first.doctor_id, 1);
        assert_eq!(first.cumulative_fee, 40000 + first.month_fee);
    }

    let ids: HashSet<&str> = plans.iter().map(|p| p.plan_id.as_str()).collect();
    assert_eq!(ids.len(), 3);
}

// ==========================================
// 确定性
// ==========================================

#[test]
fn test_repeated_generation_is_deterministic() {
    let request = rich_request();
    let first = generate(&request);
    let second = generate(&request);

    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.mode, b.mode);
        assert_eq!(a.status, b.status);
        if a.status == SolveStatus::Optimal {
            assert_eq!(
                serde_json::to_string(&a.assignments).unwrap(),
                serde_json::to_string(&b.assignments).unwrap(),
                "模式 {} 的分配不一致",
                a.mode
            );
        }
    }
}

// ==========================================
// 模式差异与既往报酬
// ==========================================

#[test]
fn test_preference_mode_favors_preferred_clinic() {
    // 无报酬外勤先: 均衡方案按次数均分，希望优先方案全部给医员 1
    let request = unpaid_nominated_request();
    let plans = generate(&request);

    let balanced = plan_of(&plans, GenerationMode::Balanced);
    assert_eq!(balanced.status, SolveStatus::Optimal);
    assert_eq!(visits(balanced, 1, 10), 2);
    assert_eq!(visits(balanced, 2, 10), 2);

    let preference = plan_of(&plans, GenerationMode::Preference);
    assert_eq!(preference.status, SolveStatus::Optimal);
    assert_eq!(visits(preference, 1, 10), 4);
    assert_eq!(preference.doctor_summaries[0].preferred_hits, 4);
}

#[test]
fn test_balanced_fee_balance_outweighs_preference() {
    // 外勤先 A 指名医员 1 且为其希望，每次比 B 多 1000
    let mut clinic_a = clinic(10, 10000, RecurrenceClass::Weekly);
    clinic_a.nominated_doctors = vec![1];
    let mut request = PlanningRequest::new(
        ym(2026, 2),
        doctors(&[1, 2]),
        vec![clinic_a, clinic(20, 9000, RecurrenceClass::Weekly)],
    );
    request.preferences.push(Preference {
        doctor_id: 1,
        preferred_clinics: vec![10],
        ..Default::default()
    });

    let plans = generate(&request);

    // 报酬偏差以金额计: 1000 的差额远大于全部奖励
    let balanced = plan_of(&plans, GenerationMode::Balanced);
    assert_eq!(balanced.status, SolveStatus::Optimal);
    assert_eq!(visits(balanced, 1, 10), 2);
    assert_eq!(visits(balanced, 2, 10), 2);
    assert_eq!(balanced.total_variance, 0.0);
    let breakdown = balanced.objective.as_ref().expect("缺少目标函数分项");
    assert_eq!(breakdown.variance_term, 0.0);
    assert_eq!(breakdown.nomination_term, -2.0);

    // 希望优先方案的取舍不固定，只要求可行
    let preference = plan_of(&plans, GenerationMode::Preference);
    assert!(preference.status.has_assignments());
    assert_hard_invariants(&request, preference);
}

#[test]
fn test_prior_fees_shift_balance() {
    let mut request = scenario_a();
    request.prior_cumulative_fees.insert(1, 20000);

    let plans = generate(&request);
    let plan = plan_of(&plans, GenerationMode::Balanced);
    let counts = count_by_doctor(plan);

    assert_eq!(counts.get(&1).copied().unwrap_or(0), 1);
    assert_eq!(counts.get(&2).copied().unwrap_or(0), 3);
    assert_eq!(plan.doctor_summaries[0].cumulative_fee, 30000);
    assert_eq!(plan.doctor_summaries[1].cumulative_fee, 30000);
}

#[test]
fn test_custom_weights_apply_to_single_mode() {
    let mut settings = GeneratorSettings::default();
    settings.modes = vec![GenerationMode::Affinity];

    let plans = PlanGenerator::new(&clinic_duty_planner::NoHolidays, settings)
        .generate_plans(&scenario_a())
        .unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].mode, GenerationMode::Affinity);
    assert_eq!(plans[0].plan_name, "优先度优先");
}

// ==========================================
// 月出勤上限
// ==========================================

#[test]
fn test_monthly_limit_shifts_duties_to_other_doctors() {
    let mut request = scenario_a();
    request.doctors[0].max_assignments = 1;

    let plans = generate(&request);
    for plan in &plans {
        assert_eq!(plan.status, SolveStatus::Optimal, "模式 {}", plan.mode);
        let counts = count_by_doctor(plan);
        assert_eq!(counts.get(&1).copied().unwrap_or(0), 1, "模式 {}", plan.mode);
        assert_eq!(counts.get(&2).copied().unwrap_or(0), 3, "模式 {}", plan.mode);
        assert_hard_invariants(&request, plan);
    }
}

#[test]
fn test_monthly_limits_below_demand_are_infeasible() {
    let mut request = scenario_a();
    request.doctors.iter_mut().for_each(|d| d.max_assignments = 1);

    let plans = generate(&request);
    assert_eq!(plans.len(), 3);
    for plan in &plans {
        assert_eq!(plan.status, SolveStatus::Infeasible);
        assert!(plan.assignments.is_empty());
        assert!(plan.conflicts.iter().any(|c| c.contains("上限")), "{:?}", plan.conflicts);
    }
}

// ==========================================
// 求解时限
// ==========================================

#[test]
fn test_tiny_time_limit_never_returns_invalid_plan() {
    // 16 名医员 × 6 个每周外勤先 × 5 个周六
    let ids: Vec<i64> = (1..=16).collect();
    let clinics = (1..=6)
        .map(|i| clinic(i * 10, 8000 + i * 1500, RecurrenceClass::Weekly))
        .collect();
    let mut request = PlanningRequest::new(ym(2026, 8), doctors(&ids), clinics);
    request.overrides = vec![override_on(10, aug(8), 2), override_on(30, aug(22), 2)];
    request.affinities = vec![affinity(3, 20, 2.0), affinity(7, 40, 2.0), affinity(9, 10, 0.0)];
    request.preferences = (1..=16)
        .map(|id| Preference {
            doctor_id: id,
            ng_dates: vec![aug(1 + 7 * (id as u32 % 5))],
            preferred_clinics: vec![10 * (id % 6 + 1)],
            ..Default::default()
        })
        .collect();
    request.prior_cumulative_fees = [(2, 25000), (11, 9500)].into_iter().collect();

    let settings = GeneratorSettings {
        solver: SolverSettings {
            time_limit_secs: 0.0,
            ..SolverSettings::default()
        },
        ..GeneratorSettings::default()
    };
    let plans = PlanGenerator::new(&clinic_duty_planner::NoHolidays, settings)
        .generate_plans(&request)
        .unwrap();

    assert_eq!(plans.len(), 3);
    for plan in &plans {
        match plan.status {
            SolveStatus::Optimal => assert_hard_invariants(&request, plan),
            SolveStatus::Feasible => {
                assert_hard_invariants(&request, plan);
                assert!(
                    plan.conflicts.iter().any(|c| c.contains("不保证最优")),
                    "{:?}",
                    plan.conflicts
                );
            }
            // 时限内无可行解
            SolveStatus::Error => {
                assert!(plan.assignments.is_empty());
                assert!(!plan.conflicts.is_empty());
            }
            SolveStatus::Infeasible => panic!("模式 {} 不应判定为无解", plan.mode),
        }
    }
}

// ==========================================
// 输入校验
// ==========================================

#[test]
fn test_validation_errors_fail_before_solving() {
    let mut request = scenario_a();
    request.doctors.iter_mut().for_each(|d| d.is_active = false);
    let err = PlanGenerator::new(&clinic_duty_planner::NoHolidays, GeneratorSettings::default())
        .generate_plans(&request)
        .unwrap_err();
    assert!(matches!(err, PlannerError::NoActiveDoctors));

    let mut request = scenario_a();
    request.preferences.push(Preference {
        doctor_id: 1,
        preferred_clinics: vec![999],
        ..Default::default()
    });
    let err = PlanGenerator::new(&clinic_duty_planner::NoHolidays, GeneratorSettings::default())
        .generate_plans(&request)
        .unwrap_err();
    assert!(matches!(err, PlannerError::UnknownClinic { clinic_id: 999, .. }));
    assert!(err.is_validation());

    let every_day_off = |_: NaiveDate| true;
    let err = PlanGenerator::new(&every_day_off, GeneratorSettings::default())
        .generate_plans(&scenario_a())
        .unwrap_err();
    assert!(matches!(err, PlannerError::NoTargetDates { .. }));
}
