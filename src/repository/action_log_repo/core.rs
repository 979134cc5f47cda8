use crate::domain::action_log::ActionLog;
use crate::repository::codec::{format_ts, ts_at};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// ActionLogRepository - 操作日志仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
pub struct ActionLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ActionLogRepository {
    /// 创建新的操作日志仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> SqliteResult<ActionLog> {
        let payload: Option<String> = row.get(7)?;
        Ok(ActionLog {
            action_id: row.get(0)?,
            action_type: row.get(1)?,
            action_ts: ts_at(row, 2)?,
            actor: row.get(3)?,
            crane_id: row.get(4)?,
            year: row.get(5)?,
            month: row.get(6)?,
            // 损坏的 payload 不影响日志可读性
            payload_json: payload.and_then(|s| serde_json::from_str(&s).ok()),
            detail: row.get(8)?,
        })
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 插入操作日志
    ///
    /// # 返回
    /// - `Ok(action_id)`: 成功插入,返回action_id
    /// - `Err(...)`: 数据库错误
    pub fn insert(&self, log: &ActionLog) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO action_log (
                action_id, action_type, action_ts, actor,
                crane_id, year, month, payload_json, detail
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                log.action_id,
                log.action_type,
                format_ts(log.action_ts),
                log.actor,
                log.crane_id,
                log.year,
                log.month,
                log.payload_json.as_ref().map(|v| v.to_string()),
                log.detail,
            ],
        )?;

        Ok(log.action_id.clone())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按ID查询
    pub fn find_by_id(&self, action_id: &str) -> RepositoryResult<Option<ActionLog>> {
        let conn = self.get_conn()?;
        let log = conn
            .query_row(
                r#"
                SELECT action_id, action_type, action_ts, actor,
                       crane_id, year, month, payload_json, detail
                FROM action_log
                WHERE action_id = ?1
                "#,
                params![action_id],
                Self::map_row,
            )
            .optional()?;
        Ok(log)
    }

    /// 查询某台起重机的操作日志 (时间倒序)
    pub fn find_by_crane(&self, crane_id: &str, limit: i32) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT action_id, action_type, action_ts, actor,
                   crane_id, year, month, payload_json, detail
            FROM action_log
            WHERE crane_id = ?1
            ORDER BY action_ts DESC
            LIMIT ?2
            "#,
        )?;
        let logs = stmt
            .query_map(params![crane_id, limit], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }

    /// 查询最近的操作日志
    pub fn find_recent(&self, limit: i32) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT action_id, action_type, action_ts, actor,
                   crane_id, year, month, payload_json, detail
            FROM action_log
            ORDER BY action_ts DESC
            LIMIT ?1
            "#,
        )?;
        let logs = stmt
            .query_map(params![limit], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }
}
