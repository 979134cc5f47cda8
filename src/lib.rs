// ==========================================
// 起重机点检排期系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 按部门日窗口排定起重机月度点检, 跟踪完成/错过/补检
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 窗口解析与状态跟踪
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{Department, InspectionTiming, MaintenancePeriod, MaintenanceStatus};

// 领域实体
pub use domain::{
    ActionLog, ActionType, ActiveCrane, DepartmentWindow, MonthCalendar, MonthlyCraneStatus,
    RescheduleCranes,
};

// 引擎
pub use engine::{InspectionRecordedHook, ScheduleError, ScheduleTracker};

// API
pub use api::{ApiError, MaintenanceApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "起重机点检排期系统";
