// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、台账数据、组件组装
// ==========================================
#![allow(dead_code)]

use chrono::NaiveDate;
use crane_maintenance::domain::crane::ActiveCrane;
use crane_maintenance::domain::types::Department;
use crane_maintenance::engine::ScheduleTracker;
use crane_maintenance::repository::{CraneRepository, MaintenanceStatusRepository};
use std::error::Error;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().ok_or("临时路径不是 UTF-8")?.to_string();

    let conn = crane_maintenance::db::open_sqlite_connection(&db_path)?;
    crane_maintenance::db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 标准台账: 每个部门两台
pub fn standard_roster() -> Vec<ActiveCrane> {
    vec![
        ActiveCrane::new("HSM-A", Department::Hsm, "S1", "HSM-01"),
        ActiveCrane::new("HSM-B", Department::Hsm, "S1", "HSM-02"),
        ActiveCrane::new("HBM-A", Department::Hbm, "S2", "HBM-01"),
        ActiveCrane::new("HBM-B", Department::Hbm, "S2", "HBM-02"),
        ActiveCrane::new("PTM-A", Department::Ptm, "S3", "PTM-01"),
        ActiveCrane::new("PTM-B", Department::Ptm, "S3", "PTM-02"),
    ]
}

/// 写入台账
pub fn seed_cranes(db_path: &str, cranes: &[ActiveCrane]) -> Result<(), Box<dyn Error>> {
    let repo = CraneRepository::new(db_path)?;
    for crane in cranes {
        repo.upsert(crane)?;
    }
    Ok(())
}

/// 基于独立连接组装跟踪器
pub fn build_tracker(db_path: &str) -> Result<ScheduleTracker, Box<dyn Error>> {
    let roster = Arc::new(CraneRepository::new(db_path)?);
    let status_repo = Arc::new(MaintenanceStatusRepository::new(db_path)?);
    Ok(ScheduleTracker::new(roster, status_repo))
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
