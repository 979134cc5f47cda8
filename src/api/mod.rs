// ==========================================
// 起重机点检排期系统 - API 层
// ==========================================
// 职责: 面向命令行/前端的业务接口, 参数校验与审计
// ==========================================

pub mod error;
pub mod maintenance_api;

pub use error::{ApiError, ApiResult};
pub use maintenance_api::{facility_time_at, CompletionOutcome, MaintenanceApi, SYSTEM_ACTOR};
