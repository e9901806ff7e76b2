// ==========================================
// 日历与月间衔接集成测试
// ==========================================
// 测试范围:
// 1. 日本祝日排除后的出现序号与外勤枠
// 2. 出勤星期变更
// 3. 已确定排班案 → 累计报酬 → 次月均衡
// ==========================================


use chrono::{Datelike, Weekday};
use clinic_duty_planner::engine::{GeneratorSettings, PlanGenerator};
use clinic_duty_planner::{
    cumulative_fees, CalendarResolver, GenerationMode, JapaneseHolidayCalendar, PlanningRequest,
    RecurrenceClass, SlotGenerator, SolveStatus,
};
use std::collections::HashMap;
use test_helpers::*;

fn balanced_only() -> GeneratorSettings {
    GeneratorSettings {
        modes: vec![GenerationMode::Balanced],
        ..GeneratorSettings::default()
    }
}

#[test]
fn test_saturday_holiday_shifts_occurrence() {
    let holidays = JapaneseHolidayCalendar::new();
    // 2025-05-03（周六）为祝日 → 5/10 成为第 1 次
    let dates = CalendarResolver::new(&holidays).resolve_target_dates(ym(2025, 5));
    let days: Vec<u32> = dates.iter().map(|t| t.date.day()).collect();
    assert_eq!(days, vec![10, 17, 24, 31]);

    let clinics = vec![
        clinic(1, 10000, RecurrenceClass::FirstOnly),
        clinic(2, 10000, RecurrenceClass::BiweeklyEven),
        clinic(3, 10000, RecurrenceClass::LastOnly),
    ];
    let slots = SlotGenerator::new().generate_slots(&dates, &clinics, &HashMap::new());
    let layout: Vec<(i64, u32)> = slots.iter().map(|s| (s.clinic_id, s.date.day())).collect();
    assert_eq!(layout, vec![(1, 10), (2, 17), (2, 31), (3, 31)]);
}

#[test]
fn test_generation_skips_holiday() {
    let request = PlanningRequest::new(
        ym(2025, 5),
        doctors(&[1, 2]),
        vec![clinic(10, 10000, RecurrenceClass::FirstOnly)],
    );
    let plans = PlanGenerator::new(&JapaneseHolidayCalendar::new(), balanced_only())
        .generate_plans(&request)
        .unwrap();

    assert_eq!(plans[0].status, SolveStatus::Optimal);
    assert_eq!(plans[0].assignments.len(), 1);
    assert_eq!(plans[0].assignments[0].date, date(2025, 5, 10));
}

#[test]
fn test_duty_weekday_change() {
    let settings = GeneratorSettings {
        duty_weekday: Weekday::Fri,
        ..balanced_only()
    };
    let request = PlanningRequest::new(
        ym(2025, 5),
        doctors(&[1, 2]),
        vec![clinic(10, 10000, RecurrenceClass::Weekly)],
    );
    let plans = PlanGenerator::new(&JapaneseHolidayCalendar::new(), settings)
        .generate_plans(&request)
        .unwrap();

    // 2025-05 的周五: 2, 9, 16, 23, 30
    let plan = &plans[0];
    assert_eq!(plan.assignments.len(), 5);
    assert!(plan.assignments.iter().all(|a| a.date.weekday() == Weekday::Fri));
}

#[test]
fn test_confirmed_plan_feeds_next_month() {
    let calendar = JapaneseHolidayCalendar::new();
    let generator = PlanGenerator::new(&calendar, balanced_only());
    let clinics = vec![clinic(10, 10000, RecurrenceClass::Weekly)];

    // 4 月: 4 个枠分给 3 人
    let april = PlanningRequest::new(ym(2025, 4), doctors(&[1, 2, 3]), clinics.clone());
    let mut april_plan = generator.generate_plans(&april).unwrap().remove(0);
    assert_eq!(april_plan.status, SolveStatus::Optimal);
    april_plan.is_confirmed = true;

    let prior = cumulative_fees(&[april_plan], &clinics, ym(2025, 5));
    assert_eq!(prior.values().sum::<i64>(), 40000);

    // 5 月: 累计后 8 次应为 3/3/2
    let mut may = PlanningRequest::new(ym(2025, 5), doctors(&[1, 2, 3]), clinics);
    may.prior_cumulative_fees = prior;
    let may_plan = generator.generate_plans(&may).unwrap().remove(0);

    assert_eq!(may_plan.status, SolveStatus::Optimal);
    assert_eq!(may_plan.assignments.len(), 4);
    let mut cumulative: Vec<i64> = may_plan
        .doctor_summaries
        .iter()
        .map(|s| s.cumulative_fee)
        .collect();
    cumulative.sort();
    assert_eq!(cumulative, vec![20000, 30000, 30000]);
}
