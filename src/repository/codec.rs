// ==========================================
// 起重机点检排期系统 - 行解码工具
// ==========================================
// 职责: 统一日期/时间戳/枚举列的读写格式
// 说明: 解码失败返回 FromSqlConversionFailure, 不回退默认值
// ==========================================

use crate::domain::types::{Department, MaintenanceStatus};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Type;
use rusqlite::Row;

/// 日期列格式
pub const DATE_FMT: &str = "%Y-%m-%d";

/// 时间戳列格式
pub const TS_FMT: &str = "%Y-%m-%d %H:%M:%S";

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FMT).to_string()
}

pub fn format_ts(ts: NaiveDateTime) -> String {
    ts.format(TS_FMT).to_string()
}

/// 读取部门列
pub fn department_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Department> {
    let raw: String = row.get(idx)?;
    Department::from_code(&raw).ok_or_else(|| conversion_error(idx, format!("未知部门代码: {}", raw)))
}

/// 读取状态列 (经归一化)
pub fn status_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<MaintenanceStatus> {
    let raw: String = row.get(idx)?;
    MaintenanceStatus::normalize(&raw)
        .ok_or_else(|| conversion_error(idx, format!("未知维保状态: {}", raw)))
}

/// 读取可空日期列
pub fn optional_date_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) => NaiveDate::parse_from_str(&raw, DATE_FMT)
            .map(Some)
            .map_err(|e| conversion_error(idx, format!("日期格式错误 {}: {}", raw, e))),
        None => Ok(None),
    }
}

/// 读取时间戳列
pub fn ts_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, TS_FMT)
        .map_err(|e| conversion_error(idx, format!("时间戳格式错误 {}: {}", raw, e)))
}

/// 读取布尔列 (INTEGER 0/1)
pub fn bool_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<bool> {
    Ok(row.get::<_, i64>(idx)? != 0)
}
