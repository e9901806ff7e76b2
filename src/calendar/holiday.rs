// ==========================================
// 外勤排班系统 - 祝日判定
// ==========================================
// 职责: 祝日判定协作方接口（按具体日期判定）
// 实现: 固定集合 / 闭包 / 日本国民祝日规则
// ==========================================

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::{BTreeSet, HashSet};

// ==========================================
// HolidayCalendar Trait
// ==========================================
pub trait HolidayCalendar: Send + Sync {
    /// 该日期是否为祝日
    fn is_holiday(&self, date: NaiveDate) -> bool;
}

impl<F> HolidayCalendar for F
where
    F: Fn(NaiveDate) -> bool + Send + Sync,
{
    fn is_holiday(&self, date: NaiveDate) -> bool {
        self(date)
    }
}

// ==========================================
// NoHolidays - 无祝日
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHolidays;

impl HolidayCalendar for NoHolidays {
    fn is_holiday(&self, _date: NaiveDate) -> bool {
        false
    }
}

// ==========================================
// HolidaySet - 显式祝日集合
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct HolidaySet {
    holidays: HashSet<NaiveDate>,
}

impl HolidaySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_holiday(&mut self, date: NaiveDate) {
        self.holidays.insert(date);
    }

    pub fn add_holidays(&mut self, dates: &[NaiveDate]) {
        self.holidays.extend(dates);
    }

    pub fn len(&self) -> usize {
        self.holidays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holidays.is_empty()
    }
}

impl FromIterator<NaiveDate> for HolidaySet {
    fn from_iter<I: IntoIterator<Item = NaiveDate>>(iter: I) -> Self {
        Self {
            holidays: iter.into_iter().collect(),
        }
    }
}

impl HolidayCalendar for HolidaySet {
    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }
}

// ==========================================
// JapaneseHolidayCalendar - 日本国民祝日
// ==========================================
// 规则: 2020 年以后的祝日法（含 2020/2021 奥运特例）
// 春分/秋分按近似公式计算，适用 1980~2099 年
#[derive(Debug, Clone, Copy, Default)]
pub struct JapaneseHolidayCalendar;

impl JapaneseHolidayCalendar {
    pub fn new() -> Self {
        Self
    }

    /// 计算某年全部祝日（含振替休日、国民の休日）
    pub fn holidays_of_year(year: i32) -> BTreeSet<NaiveDate> {
        let mut base: BTreeSet<NaiveDate> = BTreeSet::new();
        let mut fixed = |month: u32, day: u32| {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                base.insert(date);
            }
        };

        fixed(1, 1); // 元日
        fixed(2, 11); // 建国記念の日
        fixed(2, 23); // 天皇誕生日
        fixed(4, 29); // 昭和の日
        fixed(5, 3); // 憲法記念日
        fixed(5, 4); // みどりの日
        fixed(5, 5); // こどもの日
        fixed(11, 3); // 文化の日
        fixed(11, 23); // 勤労感謝の日

        // 奥运特例年份的移动祝日
        let (marine, mountain, sports) = match year {
            2020 => (ymd(2020, 7, 23), ymd(2020, 8, 10), ymd(2020, 7, 24)),
            2021 => (ymd(2021, 7, 22), ymd(2021, 8, 8), ymd(2021, 7, 23)),
            _ => (
                nth_weekday(year, 7, Weekday::Mon, 3),
                ymd(year, 8, 11),
                nth_weekday(year, 10, Weekday::Mon, 2),
            ),
        };

        let movable = [
            nth_weekday(year, 1, Weekday::Mon, 2), // 成人の日
            nth_weekday(year, 9, Weekday::Mon, 3), // 敬老の日
            marine,
            mountain,
            sports,
            vernal_equinox(year),
            autumnal_equinox(year),
        ];
        base.extend(movable.into_iter().flatten());

        let mut all = base.clone();

        // 国民の休日: 前后均为祝日的平日
        for date in &base {
            let between = *date + Duration::days(1);
            let after = *date + Duration::days(2);
            if base.contains(&after)
                && !base.contains(&between)
                && between.weekday() != Weekday::Sun
            {
                all.insert(between);
            }
        }

        // 振替休日: 祝日落在周日时，顺延到下一个非祝日
        for date in &base {
            if date.weekday() == Weekday::Sun {
                let mut substitute = *date + Duration::days(1);
                while all.contains(&substitute) {
                    substitute += Duration::days(1);
                }
                all.insert(substitute);
            }
        }

        all
    }
}

impl HolidayCalendar for JapaneseHolidayCalendar {
    fn is_holiday(&self, date: NaiveDate) -> bool {
        Self::holidays_of_year(date.year()).contains(&date)
    }
}

fn ymd(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

/// 某月第 n 个指定星期
fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u32) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n as u8)
}

fn vernal_equinox(year: i32) -> Option<NaiveDate> {
    equinox_day(year, 20.8431).and_then(|day| ymd(year, 3, day))
}

fn autumnal_equinox(year: i32) -> Option<NaiveDate> {
    equinox_day(year, 23.2488).and_then(|day| ymd(year, 9, day))
}

fn equinox_day(year: i32, base: f64) -> Option<u32> {
    if !(1980..=2099).contains(&year) {
        return None;
    }
    let elapsed = (year - 1980) as f64;
    let day = (base + 0.242194 * elapsed - (elapsed / 4.0).floor()).floor();
    Some(day as u32)
}
