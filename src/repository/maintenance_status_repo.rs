// ==========================================
// 起重机点检排期系统 - 月度维保状态仓储
// ==========================================
// 红线: Repository 不含业务逻辑, 只做数据映射
// 并发: 所有状态迁移都以“当前状态仍为预期值”为条件写入,
//       由单条 UPDATE 原子完成
// ==========================================

use crate::domain::maintenance::MonthlyCraneStatus;
use crate::domain::types::{Department, MaintenanceStatus};
use crate::repository::codec::{
    bool_at, department_at, format_date, format_ts, optional_date_at, status_at, ts_at,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{
    params, Connection, OptionalExtension, Result as SqliteResult, Row, TransactionBehavior,
};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT
        record_id, crane_id, department, shed_id, crane_number,
        year, month, status, completed_date, completed_in_reschedule,
        manually_marked, notes, created_at, updated_at
    FROM monthly_crane_status
"#;

/// 一次过期扫描中, 某部门某月被置为 MISSED 的记录数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiredBatch {
    pub department: Department,
    pub year: i32,
    pub month: u32,
    pub count: usize,
}

// ==========================================
// MaintenanceStatusRepository - 月度维保状态仓储
// ==========================================
pub struct MaintenanceStatusRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MaintenanceStatusRepository {
    /// 创建新的仓储实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> SqliteResult<MonthlyCraneStatus> {
        Ok(MonthlyCraneStatus {
            record_id: row.get(0)?,
            crane_id: row.get(1)?,
            department: department_at(row, 2)?,
            shed_id: row.get(3)?,
            crane_number: row.get(4)?,
            year: row.get(5)?,
            month: row.get(6)?,
            status: status_at(row, 7)?,
            completed_date: optional_date_at(row, 8)?,
            completed_in_reschedule: bool_at(row, 9)?,
            manually_marked: bool_at(row, 10)?,
            notes: row.get(11)?,
            created_at: ts_at(row, 12)?,
            updated_at: ts_at(row, 13)?,
        })
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 批量“仅在不存在时插入”
    ///
    /// 依赖 UNIQUE(crane_id, year, month): 已存在的记录保持原样, 不覆盖进度
    ///
    /// # 返回
    /// - Ok(usize): 实际新插入的记录数
    pub fn insert_if_absent(&self, records: &[MonthlyCraneStatus]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO monthly_crane_status (
                    record_id, crane_id, department, shed_id, crane_number,
                    year, month, status, completed_date, completed_in_reschedule,
                    manually_marked, notes, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                ON CONFLICT(crane_id, year, month) DO NOTHING
                "#,
            )?;

            for record in records {
                inserted += stmt.execute(params![
                    record.record_id,
                    record.crane_id,
                    record.department.code(),
                    record.shed_id,
                    record.crane_number,
                    record.year,
                    record.month,
                    record.status.as_str(),
                    record.completed_date.map(format_date),
                    record.completed_in_reschedule as i64,
                    record.manually_marked as i64,
                    record.notes,
                    format_ts(record.created_at),
                    format_ts(record.updated_at),
                ])?;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    /// 条件迁移: 仅当当前状态仍为 `expected` 时写入完成信息
    ///
    /// # 返回
    /// - Ok(true): 迁移成功
    /// - Ok(false): 记录不存在或状态已被并发修改
    #[allow(clippy::too_many_arguments)]
    pub fn complete_if_status(
        &self,
        crane_id: &str,
        year: i32,
        month: u32,
        expected: MaintenanceStatus,
        new_status: MaintenanceStatus,
        completed_date: NaiveDate,
        completed_in_reschedule: bool,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE monthly_crane_status
            SET status = ?5,
                completed_date = ?6,
                completed_in_reschedule = ?7,
                updated_at = ?8
            WHERE crane_id = ?1 AND year = ?2 AND month = ?3 AND status = ?4
            "#,
            params![
                crane_id,
                year,
                month,
                expected.as_str(),
                new_status.as_str(),
                format_date(completed_date),
                completed_in_reschedule as i64,
                format_ts(updated_at),
            ],
        )?;
        Ok(affected == 1)
    }

    /// 人工标记 (无状态前置条件, notes 为 None 时保留原备注)
    ///
    /// 读取原状态与写入在同一写事务内, 返回值即被覆盖的状态
    ///
    /// # 返回
    /// - Ok(Some(status)): 标记前的状态
    /// - Ok(None): 记录不存在
    #[allow(clippy::too_many_arguments)]
    pub fn update_manual(
        &self,
        crane_id: &str,
        year: i32,
        month: u32,
        status: MaintenanceStatus,
        completed_date: Option<NaiveDate>,
        completed_in_reschedule: bool,
        notes: Option<&str>,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<Option<MaintenanceStatus>> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let previous = tx
            .query_row(
                "SELECT status FROM monthly_crane_status WHERE crane_id = ?1 AND year = ?2 AND month = ?3",
                params![crane_id, year, month],
                |row| status_at(row, 0),
            )
            .optional()?;
        let Some(previous) = previous else {
            return Ok(None);
        };

        tx.execute(
            r#"
            UPDATE monthly_crane_status
            SET status = ?4,
                completed_date = ?5,
                completed_in_reschedule = ?6,
                manually_marked = 1,
                notes = COALESCE(?7, notes),
                updated_at = ?8
            WHERE crane_id = ?1 AND year = ?2 AND month = ?3
            "#,
            params![
                crane_id,
                year,
                month,
                status.as_str(),
                completed_date.map(format_date),
                completed_in_reschedule as i64,
                notes,
                format_ts(updated_at),
            ],
        )?;

        tx.commit()?;
        Ok(Some(previous))
    }

    /// 单条记录 PENDING -> MISSED (条件写入)
    ///
    /// # 返回
    /// - Ok(true): 本次置为 MISSED
    /// - Ok(false): 记录不存在或已不是 PENDING
    pub fn miss_if_pending(
        &self,
        crane_id: &str,
        year: i32,
        month: u32,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE monthly_crane_status
            SET status = 'MISSED', updated_at = ?4
            WHERE crane_id = ?1 AND year = ?2 AND month = ?3 AND status = 'PENDING'
            "#,
            params![crane_id, year, month, format_ts(updated_at)],
        )?;
        Ok(affected == 1)
    }

    /// 将某部门某月仍为 PENDING 的记录置为 MISSED
    ///
    /// 条件与更新在同一条语句内, 并发完成的记录不会被回写
    pub fn expire_pending_for_department(
        &self,
        department: Department,
        year: i32,
        month: u32,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE monthly_crane_status
            SET status = 'MISSED', updated_at = ?4
            WHERE year = ?1 AND month = ?2 AND department = ?3 AND status = 'PENDING'
            "#,
            params![year, month, department.code(), format_ts(updated_at)],
        )?;
        Ok(affected)
    }

    /// 将 (year, month) 之前各月仍为 PENDING 的记录置为 MISSED
    ///
    /// # 返回
    /// - 按 部门/年/月 分组的更新数量
    pub fn expire_pending_before(
        &self,
        year: i32,
        month: u32,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<Vec<ExpiredBatch>> {
        let mut conn = self.get_conn()?;
        // 先读后写: 立即取得写锁, 避免多连接下锁升级失败
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let batches = {
            let mut stmt = tx.prepare(
                r#"
                SELECT department, year, month, COUNT(*)
                FROM monthly_crane_status
                WHERE status = 'PENDING' AND (year < ?1 OR (year = ?1 AND month < ?2))
                GROUP BY department, year, month
                ORDER BY year, month, department
                "#,
            )?;
            let rows = stmt.query_map(params![year, month], |row| {
                Ok(ExpiredBatch {
                    department: department_at(row, 0)?,
                    year: row.get(1)?,
                    month: row.get(2)?,
                    count: row.get::<_, i64>(3)? as usize,
                })
            })?;
            let collected = rows.collect::<SqliteResult<Vec<_>>>()?;
            collected
        };

        tx.execute(
            r#"
            UPDATE monthly_crane_status
            SET status = 'MISSED', updated_at = ?3
            WHERE status = 'PENDING' AND (year < ?1 OR (year = ?1 AND month < ?2))
            "#,
            params![year, month, format_ts(updated_at)],
        )?;

        tx.commit()?;
        Ok(batches)
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 起重机+年月 查询
    pub fn find_by_crane_month(
        &self,
        crane_id: &str,
        year: i32,
        month: u32,
    ) -> RepositoryResult<Option<MonthlyCraneStatus>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE crane_id = ?1 AND year = ?2 AND month = ?3", SELECT_COLUMNS);
        let record = conn
            .query_row(&sql, params![crane_id, year, month], Self::map_row)
            .optional()?;
        Ok(record)
    }

    /// 某月全部记录
    pub fn find_by_month(&self, year: i32, month: u32) -> RepositoryResult<Vec<MonthlyCraneStatus>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE year = ?1 AND month = ?2 ORDER BY department, shed_id, crane_number",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![year, month], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(records)
    }

    /// 某部门某月记录 (按厂房、编号排序)
    pub fn find_by_department_month(
        &self,
        department: Department,
        year: i32,
        month: u32,
    ) -> RepositoryResult<Vec<MonthlyCraneStatus>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE department = ?1 AND year = ?2 AND month = ?3 ORDER BY shed_id, crane_number",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![department.code(), year, month], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(records)
    }

    /// 某月某状态记录
    pub fn find_by_month_status(
        &self,
        year: i32,
        month: u32,
        status: MaintenanceStatus,
    ) -> RepositoryResult<Vec<MonthlyCraneStatus>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE year = ?1 AND month = ?2 AND status = ?3 ORDER BY department, shed_id, crane_number",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![year, month, status.as_str()], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(records)
    }

    /// 单台起重机的历史记录 (新月份在前)
    pub fn find_by_crane(&self, crane_id: &str) -> RepositoryResult<Vec<MonthlyCraneStatus>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE crane_id = ?1 ORDER BY year DESC, month DESC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![crane_id], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(records)
    }

    /// 某月记录数
    pub fn count_by_month(&self, year: i32, month: u32) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM monthly_crane_status WHERE year = ?1 AND month = ?2",
            params![year, month],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_repo() -> MaintenanceStatusRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        MaintenanceStatusRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn pending(crane_id: &str, department: Department, year: i32, month: u32) -> MonthlyCraneStatus {
        MonthlyCraneStatus {
            record_id: format!("{}-{}-{}", crane_id, year, month),
            crane_id: crane_id.to_string(),
            department,
            shed_id: "S1".to_string(),
            crane_number: format!("N-{}", crane_id),
            year,
            month,
            status: MaintenanceStatus::Pending,
            completed_date: None,
            completed_in_reschedule: false,
            manually_marked: false,
            notes: None,
            created_at: ts(),
            updated_at: ts(),
        }
    }

    #[test]
    fn test_insert_if_absent_skips_existing() {
        let repo = setup_repo();
        let first = vec![pending("C1", Department::Hsm, 2024, 3)];
        assert_eq!(repo.insert_if_absent(&first).unwrap(), 1);

        let mut again = pending("C1", Department::Hsm, 2024, 3);
        again.record_id = "other-id".to_string();
        let second = vec![again, pending("C2", Department::Hbm, 2024, 3)];
        assert_eq!(repo.insert_if_absent(&second).unwrap(), 1);

        let stored = repo.find_by_crane_month("C1", 2024, 3).unwrap().unwrap();
        assert_eq!(stored.record_id, "C1-2024-3");
        assert_eq!(repo.count_by_month(2024, 3).unwrap(), 2);
    }

    #[test]
    fn test_complete_if_status_is_conditional() {
        let repo = setup_repo();
        repo.insert_if_absent(&[pending("C1", Department::Hbm, 2024, 3)]).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();

        let first = repo
            .complete_if_status(
                "C1", 2024, 3,
                MaintenanceStatus::Pending, MaintenanceStatus::Completed,
                date, false, ts(),
            )
            .unwrap();
        let second = repo
            .complete_if_status(
                "C1", 2024, 3,
                MaintenanceStatus::Pending, MaintenanceStatus::Completed,
                date, false, ts(),
            )
            .unwrap();
        assert!(first);
        assert!(!second);

        let stored = repo.find_by_crane_month("C1", 2024, 3).unwrap().unwrap();
        assert_eq!(stored.status, MaintenanceStatus::Completed);
        assert_eq!(stored.completed_date, Some(date));
    }

    #[test]
    fn test_expire_only_touches_pending_of_department() {
        let repo = setup_repo();
        repo.insert_if_absent(&[
            pending("C1", Department::Hsm, 2024, 3),
            pending("C2", Department::Hsm, 2024, 3),
            pending("C3", Department::Hbm, 2024, 3),
        ])
        .unwrap();
        repo.complete_if_status(
            "C2", 2024, 3,
            MaintenanceStatus::Pending, MaintenanceStatus::Completed,
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(), false, ts(),
        )
        .unwrap();

        assert_eq!(repo.expire_pending_for_department(Department::Hsm, 2024, 3, ts()).unwrap(), 1);
        assert_eq!(repo.expire_pending_for_department(Department::Hsm, 2024, 3, ts()).unwrap(), 0);

        let missed = repo.find_by_month_status(2024, 3, MaintenanceStatus::Missed).unwrap();
        assert_eq!(missed.len(), 1);
        assert_eq!(missed[0].crane_id, "C1");
        let hbm = repo.find_by_department_month(Department::Hbm, 2024, 3).unwrap();
        assert_eq!(hbm[0].status, MaintenanceStatus::Pending);
    }

    #[test]
    fn test_expire_pending_before_groups_by_month() {
        let repo = setup_repo();
        repo.insert_if_absent(&[
            pending("C1", Department::Hsm, 2023, 12),
            pending("C2", Department::Ptm, 2024, 1),
            pending("C3", Department::Ptm, 2024, 1),
            pending("C4", Department::Ptm, 2024, 2),
        ])
        .unwrap();

        let batches = repo.expire_pending_before(2024, 2, ts()).unwrap();
        assert_eq!(
            batches,
            vec![
                ExpiredBatch { department: Department::Hsm, year: 2023, month: 12, count: 1 },
                ExpiredBatch { department: Department::Ptm, year: 2024, month: 1, count: 2 },
            ]
        );
        let feb = repo.find_by_crane_month("C4", 2024, 2).unwrap().unwrap();
        assert_eq!(feb.status, MaintenanceStatus::Pending);
    }

    #[test]
    fn test_update_manual_keeps_notes_when_none() {
        let repo = setup_repo();
        repo.insert_if_absent(&[pending("C1", Department::Ptm, 2024, 3)]).unwrap();

        let previous = repo
            .update_manual("C1", 2024, 3, MaintenanceStatus::Missed, None, false, Some("停机检修"), ts())
            .unwrap();
        assert_eq!(previous, Some(MaintenanceStatus::Pending));
        let previous = repo
            .update_manual("C1", 2024, 3, MaintenanceStatus::Pending, None, false, None, ts())
            .unwrap();
        assert_eq!(previous, Some(MaintenanceStatus::Missed));

        let stored = repo.find_by_crane_month("C1", 2024, 3).unwrap().unwrap();
        assert!(stored.manually_marked);
        assert_eq!(stored.notes.as_deref(), Some("停机检修"));
        assert_eq!(
            repo.update_manual("C9", 2024, 3, MaintenanceStatus::Pending, None, false, None, ts())
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_miss_if_pending_is_conditional() {
        let repo = setup_repo();
        repo.insert_if_absent(&[
            pending("C1", Department::Hbm, 2024, 3),
            pending("C2", Department::Hbm, 2024, 3),
        ])
        .unwrap();
        repo.complete_if_status(
            "C2", 2024, 3,
            MaintenanceStatus::Pending, MaintenanceStatus::Completed,
            NaiveDate::from_ymd_opt(2024, 3, 8).unwrap(), false, ts(),
        )
        .unwrap();

        assert!(repo.miss_if_pending("C1", 2024, 3, ts()).unwrap());
        assert!(!repo.miss_if_pending("C1", 2024, 3, ts()).unwrap());
        assert!(!repo.miss_if_pending("C2", 2024, 3, ts()).unwrap());
        assert!(!repo.miss_if_pending("C9", 2024, 3, ts()).unwrap());

        let c2 = repo.find_by_crane_month("C2", 2024, 3).unwrap().unwrap();
        assert_eq!(c2.status, MaintenanceStatus::Completed);
    }

    #[test]
    fn test_history_newest_first() {
        let repo = setup_repo();
        repo.insert_if_absent(&[
            pending("C1", Department::Hsm, 2023, 11),
            pending("C1", Department::Hsm, 2024, 1),
            pending("C1", Department::Hsm, 2023, 12),
        ])
        .unwrap();

        let months: Vec<(i32, u32)> = repo
            .find_by_crane("C1")
            .unwrap()
            .iter()
            .map(|r| (r.year, r.month))
            .collect();
        assert_eq!(months, vec![(2024, 1), (2023, 12), (2023, 11)]);
    }
}
