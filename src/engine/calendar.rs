// ==========================================
// 起重机点检排期系统 - 月排期与日历网格
// ==========================================
// 职责: 为日历界面生成逐日时段与 7 列周网格
// 说明: 网格列号以周日为 0, 这是全系统唯一的 0 起始换算点
// ==========================================

use crate::domain::maintenance::{CalendarCell, CalendarWeek, ScheduleDay};
use crate::engine::error::ScheduleResult;
use crate::engine::window_resolver::{date_of, last_day_of_month, resolve_period_by_date};
use chrono::{Datelike, NaiveDate};

// ==========================================
// MonthSchedule - 逐日排期迭代器
// ==========================================
// 有限、按日升序; clone 即可从头重新遍历
#[derive(Debug, Clone)]
pub struct MonthSchedule {
    first: NaiveDate,
    next_day: u32,
    last_day: u32,
}

impl MonthSchedule {
    pub fn first_date(&self) -> NaiveDate {
        self.first
    }

    pub fn last_day(&self) -> u32 {
        self.last_day
    }
}

impl Iterator for MonthSchedule {
    type Item = ScheduleDay;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_day > self.last_day {
            return None;
        }
        let date = self.first.with_day(self.next_day)?;
        self.next_day += 1;
        Some(ScheduleDay {
            day: date.day(),
            period: resolve_period_by_date(date),
            date,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.last_day + 1).saturating_sub(self.next_day) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for MonthSchedule {}

/// generateMonthSchedule: 每天一项, 日号升序
pub fn generate_month_schedule(year: i32, month: u32) -> ScheduleResult<MonthSchedule> {
    let last_day = last_day_of_month(year, month)?;
    Ok(MonthSchedule {
        first: date_of(year, month, 1)?,
        next_day: 1,
        last_day,
    })
}

/// generateCalendarGrid: 完整周组成的日历网格
///
/// 首行从 1 日所在星期开始, 月外单元为占位格
pub fn generate_calendar_grid(year: i32, month: u32) -> ScheduleResult<Vec<CalendarWeek>> {
    let schedule = generate_month_schedule(year, month)?;
    let leading = schedule.first_date().weekday().num_days_from_sunday() as usize;

    let mut cells: Vec<CalendarCell> = Vec::with_capacity(42);
    cells.extend(std::iter::repeat(CalendarCell::placeholder()).take(leading));
    cells.extend(schedule.map(|day| CalendarCell {
        day: Some(day.day),
        date: Some(day.date),
        period: Some(day.period),
    }));

    let trailing = (7 - cells.len() % 7) % 7;
    cells.extend(std::iter::repeat(CalendarCell::placeholder()).take(trailing));

    let weeks = cells
        .chunks_exact(7)
        .map(|chunk| {
            let mut week = [CalendarCell::placeholder(); 7];
            week.copy_from_slice(chunk);
            week
        })
        .collect();

    Ok(weeks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::MaintenancePeriod;
    use crate::engine::error::ScheduleError;

    #[test]
    fn test_month_schedule_covers_every_day() {
        let days: Vec<ScheduleDay> = generate_month_schedule(2024, 2).unwrap().collect();
        assert_eq!(days.len(), 29);
        assert_eq!(days.first().unwrap().day, 1);
        assert_eq!(days.last().unwrap().day, 29);
        assert!(days.windows(2).all(|w| w[0].day + 1 == w[1].day));
        assert_eq!(days[4].period, MaintenancePeriod::Hsm);
        assert_eq!(days[5].period, MaintenancePeriod::Hbm);
        assert_eq!(days[23].period, MaintenancePeriod::Reschedule);
    }

    #[test]
    fn test_month_schedule_is_restartable() {
        let schedule = generate_month_schedule(2024, 4).unwrap();
        assert_eq!(schedule.len(), 30);
        let first_pass: Vec<_> = schedule.clone().collect();
        let second_pass: Vec<_> = schedule.collect();
        assert_eq!(first_pass, second_pass);
    }

    #[test]
    fn test_calendar_grid_complete_weeks() {
        for year in [2023, 2024, 2026] {
            for month in 1..=12 {
                let grid = generate_calendar_grid(year, month).unwrap();
                let day_cells = grid
                    .iter()
                    .flat_map(|week| week.iter())
                    .filter(|c| !c.is_placeholder())
                    .count() as u32;
                assert_eq!(day_cells, last_day_of_month(year, month).unwrap());
                assert!(grid.len() >= 4 && grid.len() <= 6);
            }
        }
    }

    #[test]
    fn test_calendar_grid_first_row_alignment() {
        // 2024-09-01 是周日, 2024-03-01 是周五
        let sept = generate_calendar_grid(2024, 9).unwrap();
        assert_eq!(sept[0][0].day, Some(1));

        let march = generate_calendar_grid(2024, 3).unwrap();
        assert!(march[0][..5].iter().all(|c| c.is_placeholder()));
        assert_eq!(march[0][5].day, Some(1));
        assert_eq!(march[0][6].day, Some(2));
        assert_eq!(march[0][5].period, Some(MaintenancePeriod::Hsm));
    }

    #[test]
    fn test_february_2015_fits_four_weeks() {
        // 2015-02-01 为周日且该月 28 天
        let grid = generate_calendar_grid(2015, 2).unwrap();
        assert_eq!(grid.len(), 4);
        assert!(grid.iter().flatten().all(|c| !c.is_placeholder()));
    }

    #[test]
    fn test_invalid_month_rejected() {
        assert!(matches!(generate_calendar_grid(2024, 0), Err(ScheduleError::InvalidDate(_))));
        assert!(matches!(generate_month_schedule(2024, 13), Err(ScheduleError::InvalidDate(_))));
    }
}
