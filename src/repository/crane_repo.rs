// ==========================================
// 起重机点检排期系统 - 起重机台账仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 说明: CraneRoster 是排期引擎依赖的台账接口,
//       CraneRepository 是基于 crane 表的默认实现
// ==========================================

use crate::domain::crane::ActiveCrane;
use crate::repository::codec::department_at;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// CraneRoster - 台账协作方接口
// ==========================================
pub trait CraneRoster: Send + Sync {
    /// 全部在用起重机
    fn list_active_cranes(&self) -> RepositoryResult<Vec<ActiveCrane>>;
}

// ==========================================
// CraneRepository - 起重机台账仓储
// ==========================================
pub struct CraneRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CraneRepository {
    /// 创建新的 CraneRepository 实例
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

    fn map_row(row: &Row<'_>) -> SqliteResult<ActiveCrane> {
        Ok(ActiveCrane {
            crane_id: row.get(0)?,
            department: department_at(row, 1)?,
            shed_id: row.get(2)?,
            crane_number: row.get(3)?,
        })
    }

    /// 新增或更新起重机 (重新登记时恢复为在用)
    pub fn upsert(&self, crane: &ActiveCrane) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO crane (crane_id, department, shed_id, crane_number, is_active)
            VALUES (?1, ?2, ?3, ?4, 1)
            ON CONFLICT(crane_id) DO UPDATE SET
                department = excluded.department,
                shed_id = excluded.shed_id,
                crane_number = excluded.crane_number,
                is_active = 1,
                updated_at = datetime('now')
            "#,
            params![
                crane.crane_id,
                crane.department.code(),
                crane.shed_id,
                crane.crane_number,
            ],
        )?;
        Ok(())
    }

    /// 启用/停用
    ///
    /// # 返回
    /// - Err(NotFound): 起重机不存在
    pub fn set_active(&self, crane_id: &str, active: bool) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE crane SET is_active = ?2, updated_at = datetime('now') WHERE crane_id = ?1",
            params![crane_id, active as i64],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Crane".to_string(),
                id: crane_id.to_string(),
            });
        }
        Ok(())
    }

    /// 按ID查询 (含停用)
    pub fn find_by_id(&self, crane_id: &str) -> RepositoryResult<Option<ActiveCrane>> {
        let conn = self.get_conn()?;
        let crane = conn
            .query_row(
                "SELECT crane_id, department, shed_id, crane_number FROM crane WHERE crane_id = ?1",
                params![crane_id],
                Self::map_row,
            )
            .optional()?;
        Ok(crane)
    }
}

impl CraneRoster for CraneRepository {
    fn list_active_cranes(&self) -> RepositoryResult<Vec<ActiveCrane>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT crane_id, department, shed_id, crane_number
            FROM crane
            WHERE is_active = 1
            ORDER BY department, shed_id, crane_number
            "#,
        )?;
        let cranes = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(cranes)
    }
}
