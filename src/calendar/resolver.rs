// ==========================================
// 外勤排班系统 - 对象日解析
// ==========================================
// 职责: 计算对象月的出勤日（默认周六，排除祝日），并给出月内出现序号
// 说明: 出现序号按过滤后的序列计数（1 起），与 ISO 周序号无关；
//       月初第 1 个周六若为祝日，则第 2 个周六成为“第 1 次”
// ==========================================

use crate::calendar::holiday::HolidayCalendar;
use crate::domain::month::YearMonth;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ==========================================
// TargetDate - 对象日
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TargetDate {
    pub date: NaiveDate,
    pub occurrence: u32, // 月内出现序号（1 起）
    pub is_last: bool,   // 是否为月内最后一次
}

// ==========================================
// CalendarResolver - 对象日解析器
// ==========================================
pub struct CalendarResolver<'a> {
    holidays: &'a dyn HolidayCalendar,
    weekday: Weekday,
}

impl<'a> CalendarResolver<'a> {
    /// 创建解析器（出勤星期为周六）
    pub fn new(holidays: &'a dyn HolidayCalendar) -> Self {
        Self {
            holidays,
            weekday: Weekday::Sat,
        }
    }

    /// 指定出勤星期
    pub fn with_weekday(mut self, weekday: Weekday) -> Self {
        self.weekday = weekday;
        self
    }

    /// 解析对象月的出勤日
    ///
    /// # 返回
    /// 升序排列的对象日，已排除祝日并标注出现序号
    pub fn resolve_target_dates(&self, month: YearMonth) -> Vec<TargetDate> {
        let dates: Vec<NaiveDate> = month
            .days()
            .filter(|d| d.weekday() == self.weekday)
            .filter(|d| {
                let holiday = self.holidays.is_holiday(*d);
                if holiday {
                    debug!(date = %d, "祝日排除");
                }
                !holiday
            })
            .collect();

        let total = dates.len();
        dates
            .into_iter()
            .enumerate()
            .map(|(i, date)| TargetDate {
                date,
                occurrence: (i + 1) as u32,
                is_last: i + 1 == total,
            })
            .collect()
    }
}
