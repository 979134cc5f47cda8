// ==========================================
// 起重机点检排期系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::MaintenanceApi;
use crate::config::config_manager::ConfigManager;
use crate::engine::events::MaintenanceEventPublisher;
use crate::engine::schedule_tracker::ScheduleTracker;
use crate::repository::{
    action_log_repo::ActionLogRepository, crane_repo::CraneRepository,
    maintenance_status_repo::MaintenanceStatusRepository,
};

/// 应用状态
///
/// 所有仓储共享同一个 SQLite 连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 维保排期API
    pub maintenance_api: Arc<MaintenanceApi>,

    /// 月度状态跟踪器 (点检记录协作方的回调入口)
    pub tracker: Arc<ScheduleTracker>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        Self::build(db_path, None)
    }

    /// 创建带事件发布者的AppState (通知协作方接入时使用)
    pub fn with_event_publisher(
        db_path: String,
        publisher: Arc<dyn MaintenanceEventPublisher>,
    ) -> Result<Self, String> {
        Self::build(db_path, Some(publisher))
    }

    fn build(
        db_path: String,
        publisher: Option<Arc<dyn MaintenanceEventPublisher>>,
    ) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = crate::db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        crate::db::init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let crane_repo = Arc::new(CraneRepository::from_connection(conn.clone()));
        let status_repo = Arc::new(MaintenanceStatusRepository::from_connection(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let mut tracker = ScheduleTracker::new(crane_repo.clone(), status_repo);
        if let Some(publisher) = publisher {
            tracker = tracker.with_event_publisher(publisher);
        }
        let tracker = Arc::new(tracker);

        // ==========================================
        // 初始化API层
        // ==========================================
        let maintenance_api = Arc::new(MaintenanceApi::new(
            tracker.clone(),
            crane_repo,
            action_log_repo,
            config_manager.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            maintenance_api,
            tracker,
            config_manager,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 CRANE_MAINTENANCE_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("CRANE_MAINTENANCE_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./crane_maintenance.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("crane-maintenance");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("crane_maintenance.db");
        }
    }

    path.to_string_lossy().to_string()
}
