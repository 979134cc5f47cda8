// ==========================================
// 起重机点检排期系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 仓储错误原样透传, 不在引擎内重试
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 排期引擎错误类型
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("无效的部门代码: {0}")]
    InvalidDepartment(String),

    #[error("无效的日期: {0}")]
    InvalidDate(String),

    #[error("月度维保记录不存在: crane_id={crane_id}, {year}-{month:02} (请先初始化该月)")]
    NotFound {
        crane_id: String,
        year: i32,
        month: u32,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result 类型别名
pub type ScheduleResult<T> = Result<T, ScheduleError>;
