// ==========================================
// 外勤排班系统 - 日历层
// ==========================================
// 职责: 祝日判定接口 + 对象日解析
// ==========================================

pub mod holiday;
pub mod resolver;

pub use holiday::{HolidayCalendar, HolidaySet, JapaneseHolidayCalendar, NoHolidays};
pub use resolver::{CalendarResolver, TargetDate};
