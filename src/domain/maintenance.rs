// ==========================================
// 起重机点检排期系统 - 月度维保状态模型
// ==========================================
// 主键: (crane_id, year, month), 月份 1 起始
// 归属: 状态的创建与迁移只由 ScheduleTracker 负责, 展示层只读
// ==========================================

use crate::domain::types::{Department, MaintenancePeriod, MaintenanceStatus};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// MonthlyCraneStatus - 单台起重机的月度维保记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyCraneStatus {
    pub record_id: String,
    pub crane_id: String,
    pub department: Department, // 初始化时从台账带出
    pub shed_id: String,        // 台账快照
    pub crane_number: String,   // 台账快照
    pub year: i32,
    pub month: u32,

    // ===== 状态 =====
    pub status: MaintenanceStatus,
    pub completed_date: Option<NaiveDate>, // COMPLETED / RESCHEDULED 时写入
    pub completed_in_reschedule: bool,     // 完成日期落在补检期
    pub manually_marked: bool,             // 管理员手工标记
    pub notes: Option<String>,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// 人工标记结果: 被覆盖的状态与标记后的记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub previous: MaintenanceStatus,
    pub record: MonthlyCraneStatus,
}

// ==========================================
// DepartmentWindow - 某月某时段的日期范围
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentWindow {
    pub period: MaintenancePeriod,
    pub start_day: u32,
    pub end_day: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DepartmentWindow {
    /// 窗口包含的天数
    pub fn len_days(&self) -> u32 {
        self.end_day - self.start_day + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

// ==========================================
// DepartmentSummary - 部门月度汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DepartmentSummary {
    pub total: u32,
    pub completed: u32,
    pub pending: u32,
    pub missed: u32,
    pub rescheduled: u32,
}

impl DepartmentSummary {
    /// 累加一条记录
    pub fn add(&mut self, status: MaintenanceStatus) {
        self.total += 1;
        match status {
            MaintenanceStatus::Pending => self.pending += 1,
            MaintenanceStatus::Completed => self.completed += 1,
            MaintenanceStatus::Missed => self.missed += 1,
            MaintenanceStatus::Rescheduled => self.rescheduled += 1,
        }
    }

    /// 已完成台数 (含补检完成)
    pub fn done(&self) -> u32 {
        self.completed + self.rescheduled
    }

    /// 完成率 (百分比, total=0 时为 0)
    pub fn completion_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.done() as f64 * 100.0 / self.total as f64
    }
}

// ==========================================
// MonthCalendar - 月历汇总视图 (getCalendar)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthCalendar {
    pub year: i32,
    pub month: u32,
    pub summaries: BTreeMap<Department, DepartmentSummary>,
    pub department_windows: BTreeMap<Department, DepartmentWindow>,
    pub reschedule_window: DepartmentWindow,
}

// ==========================================
// CraneStatusView - 部门明细行 (getDepartmentStatus)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CraneStatusView {
    pub crane_id: String,
    pub crane_number: String,
    pub shed_id: String,
    pub department: Department,
    pub status: MaintenanceStatus,
    pub completed_date: Option<NaiveDate>,
    pub completed_in_reschedule: bool,
    pub manually_marked: bool,
    pub notes: Option<String>,
}

impl From<MonthlyCraneStatus> for CraneStatusView {
    fn from(record: MonthlyCraneStatus) -> Self {
        Self {
            crane_id: record.crane_id,
            crane_number: record.crane_number,
            shed_id: record.shed_id,
            department: record.department,
            status: record.status,
            completed_date: record.completed_date,
            completed_in_reschedule: record.completed_in_reschedule,
            manually_marked: record.manually_marked,
            notes: record.notes,
        }
    }
}

// ==========================================
// 补检清单 (getRescheduleCranes)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissedCrane {
    pub crane_id: String,
    pub crane_number: String,
    pub shed_id: String,
    pub department: Department,
    pub original_window: DepartmentWindow, // 原定窗口, 供展示
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleCranes {
    pub year: i32,
    pub month: u32,
    pub missed_cranes: Vec<MissedCrane>,
    pub reschedule_window: DepartmentWindow,
}

// ==========================================
// 日历辅助结构
// ==========================================

/// 月排期中的一天
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDay {
    pub day: u32,
    pub period: MaintenancePeriod,
    pub date: NaiveDate,
}

/// 日历网格单元, 月外占位单元三个字段均为 None
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CalendarCell {
    pub day: Option<u32>,
    pub date: Option<NaiveDate>,
    pub period: Option<MaintenancePeriod>,
}

impl CalendarCell {
    pub fn placeholder() -> Self {
        Self::default()
    }

    pub fn is_placeholder(&self) -> bool {
        self.day.is_none()
    }
}

/// 一周 7 格 (周日在第 0 列)
pub type CalendarWeek = [CalendarCell; 7];

/// 今日概览: 当前时段及剩余天数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodayOverview {
    pub date: NaiveDate,
    pub period: MaintenancePeriod,
    pub window: DepartmentWindow,
    pub days_remaining: u32, // 含当天
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts_and_rate() {
        let mut summary = DepartmentSummary::default();
        summary.add(MaintenanceStatus::Completed);
        summary.add(MaintenanceStatus::Rescheduled);
        summary.add(MaintenanceStatus::Missed);
        summary.add(MaintenanceStatus::Pending);

        assert_eq!(summary.total, 4);
        assert_eq!(summary.done(), 2);
        assert!((summary.completion_rate() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_summary_rate_is_zero() {
        assert_eq!(DepartmentSummary::default().completion_rate(), 0.0);
    }

    #[test]
    fn test_window_contains() {
        let window = DepartmentWindow {
            period: MaintenancePeriod::Hbm,
            start_day: 6,
            end_day: 12,
            start_date: NaiveDate::from_ymd_opt(2024, 3, 6).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 12).unwrap(),
        };
        assert_eq!(window.len_days(), 7);
        assert!(window.contains(NaiveDate::from_ymd_opt(2024, 3, 12).unwrap()));
        assert!(!window.contains(NaiveDate::from_ymd_opt(2024, 3, 13).unwrap()));
    }
}
