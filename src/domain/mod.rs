// ==========================================
// 起重机点检排期系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod crane;
pub mod maintenance;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use crane::ActiveCrane;
pub use maintenance::{
    CalendarCell, CalendarWeek, CraneStatusView, DepartmentSummary, DepartmentWindow,
    MissedCrane, MonthCalendar, MonthlyCraneStatus, RescheduleCranes, ScheduleDay,
    TodayOverview,
};
pub use types::{
    Department, InspectionTiming, MaintenancePeriod, MaintenanceStatus, RESCHEDULE_START_DAY,
};
