// ==========================================
// 起重机点检排期系统 - 排期配置读取 Trait
// ==========================================
// 职责: 定义 API 层所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

/// 配置读取结果
pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// 厂区时差上限 (分钟, ±14h)
pub const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

// ==========================================
// ScheduleConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ScheduleConfigReader: Send + Sync {
    /// 厂区相对 UTC 的偏移 (分钟)
    ///
    /// 用于把系统时钟换算为厂区本地日历日; 超出 ±14h 时截断
    ///
    /// # 默认值
    /// - 0
    async fn get_facility_utc_offset_minutes(&self) -> ConfigResult<i32>;

    /// 查询月历/部门状态前是否自动初始化当月记录
    ///
    /// # 默认值
    /// - true
    async fn get_auto_initialize_month(&self) -> ConfigResult<bool>;

    /// 人工标记是否写入操作日志
    ///
    /// # 默认值
    /// - true
    async fn get_audit_manual_marks(&self) -> ConfigResult<bool>;
}
