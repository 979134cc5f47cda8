// ==========================================
// 起重机点检排期系统 - 引擎层
// ==========================================
// 职责: 维保窗口解析、月历生成、月度状态跟踪
// 红线: Engine 不拼 SQL; 窗口判断不读取系统时钟
// ==========================================

pub mod calendar;
pub mod error;
pub mod events;
pub mod schedule_tracker;
pub mod window_resolver;

// 重导出核心引擎
pub use calendar::{generate_calendar_grid, generate_month_schedule, MonthSchedule};
pub use error::{ScheduleError, ScheduleResult};
pub use events::{
    MaintenanceEvent, MaintenanceEventPublisher, NoOpEventPublisher, OptionalEventPublisher,
};
pub use schedule_tracker::{InspectionRecordedHook, ScheduleTracker};
