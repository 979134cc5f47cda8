// ==========================================
// 起重机点检排期系统 - 维保窗口解析器
// ==========================================
// 窗口: HSM 1-5 / HBM 6-12 / PTM 13-23 / RESCHEDULE 24-月末
// 约定: 月份 1 起始; 入参日期已是厂区本地日历日
// 红线: 纯函数, 不读取系统时钟, 不做 I/O
// ==========================================

use crate::domain::maintenance::{DepartmentWindow, TodayOverview};
use crate::domain::types::{
    Department, InspectionTiming, MaintenancePeriod, RESCHEDULE_START_DAY,
};
use crate::engine::error::{ScheduleError, ScheduleResult};
use chrono::{Datelike, NaiveDate};

/// 支持的年份范围 (数据库以 YYYY-MM-DD 文本存储)
pub const MIN_YEAR: i32 = 1970;
pub const MAX_YEAR: i32 = 9999;

/// 校验年月
pub fn validate_year_month(year: i32, month: u32) -> ScheduleResult<()> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(ScheduleError::InvalidDate(format!(
            "年份超出范围 [{}, {}]: {}",
            MIN_YEAR, MAX_YEAR, year
        )));
    }
    if !(1..=12).contains(&month) {
        return Err(ScheduleError::InvalidDate(format!(
            "月份必须在 1-12 之间: {}",
            month
        )));
    }
    Ok(())
}

/// 解析日期字符串 (YYYY-MM-DD 或 YYYY/MM/DD)
pub fn parse_date(raw: &str) -> ScheduleResult<NaiveDate> {
    let trimmed = raw.trim();
    let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y/%m/%d"))
        .map_err(|e| ScheduleError::InvalidDate(format!("{} ({})", raw, e)))?;
    validate_year_month(date.year(), date.month())?;
    Ok(date)
}

/// 构造某月某日, 日期不存在时返回 InvalidDate
pub fn date_of(year: i32, month: u32, day: u32) -> ScheduleResult<NaiveDate> {
    validate_year_month(year, month)?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        ScheduleError::InvalidDate(format!("{}-{:02}-{:02} 不是有效日期", year, month, day))
    })
}

/// 月末日 (28/29/30/31)
///
/// 取下月 1 日的前一天, 12 月进位到次年 1 月
pub fn last_day_of_month(year: i32, month: u32) -> ScheduleResult<u32> {
    validate_year_month(year, month)?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .ok_or_else(|| ScheduleError::InvalidDate(format!("无法计算 {}-{:02} 的月末", year, month)))
}

/// 按日号判定时段 (只看日号, 不看月份长度)
fn period_of_day(day: u32) -> MaintenancePeriod {
    Department::ALL
        .iter()
        .find(|d| day >= d.start_day() && day <= d.end_day())
        .map(|d| MaintenancePeriod::from(*d))
        .unwrap_or(MaintenancePeriod::Reschedule)
}

/// resolveDepartmentByDate: 日期所属时段
pub fn resolve_period_by_date(date: NaiveDate) -> MaintenancePeriod {
    period_of_day(date.day())
}

/// 按年月日判定时段, 日号不在该月范围内时报错
pub fn resolve_period_by_day(year: i32, month: u32, day: u32) -> ScheduleResult<MaintenancePeriod> {
    let date = date_of(year, month, day)?;
    Ok(resolve_period_by_date(date))
}

/// departmentWindow: 某时段在某月的起止
pub fn department_window(
    period: MaintenancePeriod,
    year: i32,
    month: u32,
) -> ScheduleResult<DepartmentWindow> {
    let (start_day, end_day) = match period.department() {
        Some(department) => (department.start_day(), department.end_day()),
        None => (RESCHEDULE_START_DAY, last_day_of_month(year, month)?),
    };

    Ok(DepartmentWindow {
        period,
        start_day,
        end_day,
        start_date: date_of(year, month, start_day)?,
        end_date: date_of(year, month, end_day)?,
    })
}

/// 按代码取窗口 (HSM/HBM/PTM/RESCHEDULE)
pub fn department_window_by_code(
    code: &str,
    year: i32,
    month: u32,
) -> ScheduleResult<DepartmentWindow> {
    let period = MaintenancePeriod::from_code(code)
        .ok_or_else(|| ScheduleError::InvalidDepartment(code.to_string()))?;
    department_window(period, year, month)
}

/// 解析部门代码
pub fn parse_department(code: &str) -> ScheduleResult<Department> {
    Department::from_code(code).ok_or_else(|| ScheduleError::InvalidDepartment(code.to_string()))
}

/// isReschedulePeriod
pub fn is_reschedule_period(date: NaiveDate) -> bool {
    resolve_period_by_date(date).is_reschedule()
}

/// isWithinOrPastWindow: 当前是本部门窗口, 或处于补检期
pub fn is_within_or_past_window(date: NaiveDate, department: Department) -> bool {
    match resolve_period_by_date(date) {
        MaintenancePeriod::Reschedule => true,
        period => period == MaintenancePeriod::from(department),
    }
}

/// hasWindowPassed: 日号已超过部门窗口结束日
pub fn has_window_passed(department: Department, date: NaiveDate) -> bool {
    date.day() > department.end_day()
}

/// 点检时机分类 (窗口外点检提示)
pub fn inspection_timing(department: Department, date: NaiveDate) -> InspectionTiming {
    let day = date.day();
    if day < department.start_day() {
        InspectionTiming::BeforeWindow
    } else if day <= department.end_day() {
        InspectionTiming::InWindow
    } else if is_reschedule_period(date) {
        InspectionTiming::ReschedulePeriod
    } else {
        InspectionTiming::AfterWindow
    }
}

/// 当前时段剩余天数 (含当天)
pub fn days_remaining_in_period(date: NaiveDate) -> ScheduleResult<u32> {
    let window = department_window(resolve_period_by_date(date), date.year(), date.month())?;
    Ok(window.end_day - date.day() + 1)
}

/// 今日概览
pub fn today_overview(date: NaiveDate) -> ScheduleResult<TodayOverview> {
    let period = resolve_period_by_date(date);
    let window = department_window(period, date.year(), date.month())?;
    Ok(TodayOverview {
        date,
        period,
        window,
        days_remaining: window.end_day - date.day() + 1,
    })
}

/// 次日 (12-31 进位到次年 1-1)
pub fn next_day(date: NaiveDate) -> ScheduleResult<NaiveDate> {
    date.succ_opt()
        .ok_or_else(|| ScheduleError::InvalidDate(format!("{} 没有次日", date)))
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_last_day_of_month() {
        assert_eq!(last_day_of_month(2024, 2).unwrap(), 29);
        assert_eq!(last_day_of_month(2023, 2).unwrap(), 28);
        assert_eq!(last_day_of_month(2024, 4).unwrap(), 30);
        assert_eq!(last_day_of_month(2024, 12).unwrap(), 31);
    }

    #[test]
    fn test_last_day_century_rules() {
        assert_eq!(last_day_of_month(2100, 2).unwrap(), 28);
        assert_eq!(last_day_of_month(2000, 2).unwrap(), 29);
    }

    #[test]
    fn test_last_day_rejects_bad_month() {
        assert!(matches!(last_day_of_month(2024, 0), Err(ScheduleError::InvalidDate(_))));
        assert!(matches!(last_day_of_month(2024, 13), Err(ScheduleError::InvalidDate(_))));
        assert!(matches!(last_day_of_month(1969, 5), Err(ScheduleError::InvalidDate(_))));
    }

    #[test]
    fn test_resolve_boundaries() {
        let cases = [
            (1, MaintenancePeriod::Hsm),
            (5, MaintenancePeriod::Hsm),
            (6, MaintenancePeriod::Hbm),
            (12, MaintenancePeriod::Hbm),
            (13, MaintenancePeriod::Ptm),
            (23, MaintenancePeriod::Ptm),
            (24, MaintenancePeriod::Reschedule),
            (31, MaintenancePeriod::Reschedule),
        ];
        for (day, expected) in cases {
            assert_eq!(resolve_period_by_date(d(2024, 1, day)), expected, "day={}", day);
        }
    }

    #[test]
    fn test_windows_partition_every_month() {
        for year in [2023, 2024] {
            for month in 1..=12 {
                let last = last_day_of_month(year, month).unwrap();
                let mut covered = vec![0u32; last as usize + 1];
                for period in MaintenancePeriod::ALL {
                    let w = department_window(period, year, month).unwrap();
                    for day in w.start_day..=w.end_day {
                        covered[day as usize] += 1;
                        assert_eq!(resolve_period_by_date(d(year, month, day)), period);
                    }
                }
                assert!(covered[1..].iter().all(|&c| c == 1), "{}-{}", year, month);
            }
        }
    }

    #[test]
    fn test_reschedule_window_length() {
        let feb = department_window(MaintenancePeriod::Reschedule, 2023, 2).unwrap();
        assert_eq!((feb.start_day, feb.end_day, feb.len_days()), (24, 28, 5));
        let jan = department_window(MaintenancePeriod::Reschedule, 2024, 1).unwrap();
        assert_eq!((jan.end_day, jan.len_days()), (31, 8));
        assert_eq!(jan.end_date, d(2024, 1, 31));
    }

    #[test]
    fn test_window_by_code_invalid() {
        let err = department_window_by_code("CRM", 2024, 1).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidDepartment(code) if code == "CRM"));

        let w = department_window_by_code("hbm", 2024, 3).unwrap();
        assert_eq!(w.start_date, d(2024, 3, 6));
        assert_eq!(w.end_date, d(2024, 3, 12));
    }

    #[test]
    fn test_within_or_past_window() {
        assert!(is_within_or_past_window(d(2024, 5, 8), Department::Hbm));
        assert!(!is_within_or_past_window(d(2024, 5, 8), Department::Hsm));
        assert!(!is_within_or_past_window(d(2024, 5, 8), Department::Ptm));
        assert!(is_within_or_past_window(d(2024, 5, 25), Department::Hsm));
    }

    #[test]
    fn test_has_window_passed() {
        assert!(!has_window_passed(Department::Hbm, d(2024, 5, 12)));
        assert!(has_window_passed(Department::Hbm, d(2024, 5, 13)));
        assert!(has_window_passed(Department::Hsm, d(2024, 5, 6)));
        assert!(!has_window_passed(Department::Ptm, d(2024, 5, 23)));
        assert!(has_window_passed(Department::Ptm, d(2024, 5, 24)));
    }

    #[test]
    fn test_inspection_timing() {
        assert_eq!(inspection_timing(Department::Ptm, d(2024, 5, 2)), InspectionTiming::BeforeWindow);
        assert_eq!(inspection_timing(Department::Ptm, d(2024, 5, 13)), InspectionTiming::InWindow);
        assert_eq!(inspection_timing(Department::Hsm, d(2024, 5, 9)), InspectionTiming::AfterWindow);
        assert_eq!(
            inspection_timing(Department::Hsm, d(2024, 5, 30)),
            InspectionTiming::ReschedulePeriod
        );
        assert!(!InspectionTiming::InWindow.is_out_of_window());
    }

    #[test]
    fn test_today_overview_and_remaining() {
        let overview = today_overview(d(2024, 2, 26)).unwrap();
        assert_eq!(overview.period, MaintenancePeriod::Reschedule);
        assert_eq!(overview.days_remaining, 4);
        assert_eq!(days_remaining_in_period(d(2024, 2, 6)).unwrap(), 7);
        assert_eq!(days_remaining_in_period(d(2024, 2, 5)).unwrap(), 1);
    }

    #[test]
    fn test_next_day_rolls_over_year() {
        assert_eq!(next_day(d(2023, 12, 31)).unwrap(), d(2024, 1, 1));
        assert_eq!(next_day(d(2024, 2, 28)).unwrap(), d(2024, 2, 29));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-03-15").unwrap(), d(2024, 3, 15));
        assert_eq!(parse_date(" 2024/03/15 ").unwrap(), d(2024, 3, 15));
        assert!(matches!(parse_date("2023-02-29"), Err(ScheduleError::InvalidDate(_))));
        assert!(matches!(parse_date("15/03/2024"), Err(ScheduleError::InvalidDate(_))));
        assert!(matches!(resolve_period_by_day(2024, 4, 31), Err(ScheduleError::InvalidDate(_))));
    }
}
