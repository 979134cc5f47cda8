// ==========================================
// 起重机点检排期系统 - 维保排期 API
// ==========================================
// 职责: 参数校验、厂区日期换算、人工标记审计
// 说明: 窗口判断所需的“今天”在此处由系统时钟 + 厂区时差得出,
//       引擎只接收显式日期
// ==========================================

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::schedule_config_trait::ScheduleConfigReader;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::crane::ActiveCrane;
use crate::domain::maintenance::{
    CalendarWeek, CraneStatusView, DepartmentWindow, MonthCalendar, MonthlyCraneStatus,
    RescheduleCranes, ScheduleDay, TodayOverview,
};
use crate::domain::types::{InspectionTiming, MaintenancePeriod, MaintenanceStatus};
use crate::engine::calendar::{generate_calendar_grid, generate_month_schedule};
use crate::engine::schedule_tracker::ScheduleTracker;
use crate::engine::window_resolver;
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::crane_repo::{CraneRepository, CraneRoster};

/// 系统操作的审计人
pub const SYSTEM_ACTOR: &str = "system";

/// 把 UTC 时刻换算为厂区本地时刻
pub fn facility_time_at(now_utc: DateTime<Utc>, offset_minutes: i32) -> NaiveDateTime {
    now_utc.naive_utc() + Duration::minutes(offset_minutes as i64)
}

// ==========================================
// CompletionOutcome - 点检记入结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionOutcome {
    pub record: MonthlyCraneStatus,
    pub timing: InspectionTiming, // 点检日期相对部门窗口的位置
}

// ==========================================
// MaintenanceApi - 维保排期 API
// ==========================================
pub struct MaintenanceApi {
    tracker: Arc<ScheduleTracker>,
    crane_repo: Arc<CraneRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    config: Arc<dyn ScheduleConfigReader>,
}

impl MaintenanceApi {
    pub fn new(
        tracker: Arc<ScheduleTracker>,
        crane_repo: Arc<CraneRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        config: Arc<dyn ScheduleConfigReader>,
    ) -> Self {
        Self {
            tracker,
            crane_repo,
            action_log_repo,
            config,
        }
    }

    // ==========================================
    // 厂区时间
    // ==========================================

    /// 厂区本地当前时刻
    pub async fn facility_now(&self) -> ApiResult<NaiveDateTime> {
        let offset = self
            .config
            .get_facility_utc_offset_minutes()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        Ok(facility_time_at(Utc::now(), offset))
    }

    /// 厂区本地日历日
    pub async fn facility_today(&self) -> ApiResult<NaiveDate> {
        Ok(self.facility_now().await?.date())
    }

    /// 查询前按配置初始化厂区当月
    ///
    /// 其他月份只读: 历史月份不按当前台账补建记录
    async fn ensure_month_initialized(&self, year: i32, month: u32) -> ApiResult<()> {
        let auto = self
            .config
            .get_auto_initialize_month()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        if !auto {
            return Ok(());
        }

        let today = self.facility_today().await?;
        if (year, month) == (today.year(), today.month()) {
            self.tracker.initialize_month(year, month)?;
        } else {
            debug!(year, month, today = %today, "非当月查询，不自动初始化");
        }
        Ok(())
    }

    fn audit(&self, log: ActionLog) {
        // 审计失败只记录警告，不影响主要操作
        if let Err(e) = self.action_log_repo.insert(&log) {
            warn!(error = %e, action_type = %log.action_type, "记录操作日志失败");
        }
    }

    // ==========================================
    // 窗口查询 (无状态)
    // ==========================================

    /// 今日概览
    pub async fn today_overview(&self) -> ApiResult<TodayOverview> {
        let today = self.facility_today().await?;
        Ok(window_resolver::today_overview(today)?)
    }

    /// 解析日期所属时段
    pub fn resolve_period(&self, date: &str) -> ApiResult<MaintenancePeriod> {
        let date = window_resolver::parse_date(date)?;
        Ok(window_resolver::resolve_period_by_date(date))
    }

    /// 部门/补检窗口
    pub fn department_window(&self, code: &str, year: i32, month: u32) -> ApiResult<DepartmentWindow> {
        Ok(window_resolver::department_window_by_code(code, year, month)?)
    }

    /// 月排期 (逐日)
    pub fn month_schedule(&self, year: i32, month: u32) -> ApiResult<Vec<ScheduleDay>> {
        Ok(generate_month_schedule(year, month)?.collect())
    }

    /// 月历网格
    pub fn calendar_grid(&self, year: i32, month: u32) -> ApiResult<Vec<CalendarWeek>> {
        Ok(generate_calendar_grid(year, month)?)
    }

    // ==========================================
    // 月度状态
    // ==========================================

    /// 显式初始化某月
    pub fn initialize_month(&self, year: i32, month: u32, actor: &str) -> ApiResult<usize> {
        let inserted = self.tracker.initialize_month(year, month)?;
        if inserted > 0 {
            let mut log = ActionLog::new(ActionType::InitializeMonth, actor, Utc::now().naive_utc());
            log.year = Some(year);
            log.month = Some(month);
            log.payload_json = Some(serde_json::json!({ "inserted": inserted }));
            self.audit(log);
        }
        Ok(inserted)
    }

    /// 月度汇总
    pub async fn get_calendar(&self, year: i32, month: u32) -> ApiResult<MonthCalendar> {
        self.ensure_month_initialized(year, month).await?;
        Ok(self.tracker.get_calendar(year, month)?)
    }

    /// 部门明细
    pub async fn get_department_status(
        &self,
        department: &str,
        year: i32,
        month: u32,
    ) -> ApiResult<Vec<CraneStatusView>> {
        let department = window_resolver::parse_department(department)?;
        self.ensure_month_initialized(year, month).await?;
        Ok(self.tracker.get_department_status(department, year, month)?)
    }

    /// 补检清单
    pub async fn get_reschedule_cranes(&self, year: i32, month: u32) -> ApiResult<RescheduleCranes> {
        self.ensure_month_initialized(year, month).await?;
        Ok(self.tracker.get_reschedule_cranes(year, month)?)
    }

    /// 单台起重机历史
    pub fn get_crane_history(&self, crane_id: &str) -> ApiResult<Vec<MonthlyCraneStatus>> {
        Ok(self.tracker.get_crane_history(crane_id)?)
    }

    /// 人工标记状态
    ///
    /// # 参数
    /// - status: 状态字符串, 经 MaintenanceStatus::normalize 归一化
    /// - actor: 操作人 (写入操作日志)
    pub async fn mark_status(
        &self,
        crane_id: &str,
        year: i32,
        month: u32,
        status: &str,
        notes: Option<&str>,
        actor: &str,
    ) -> ApiResult<MonthlyCraneStatus> {
        if crane_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("起重机ID不能为空".to_string()));
        }
        let new_status = MaintenanceStatus::normalize(status)
            .ok_or_else(|| ApiError::InvalidInput(format!("未知维保状态: {}", status)))?;
        let notes = notes.map(str::trim).filter(|n| !n.is_empty());

        let now = self.facility_now().await?;
        let change = self
            .tracker
            .mark_status(crane_id, year, month, new_status, notes, now.date())?;
        let record = change.record;

        let audit_enabled = self
            .config
            .get_audit_manual_marks()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        if audit_enabled {
            let mut log = ActionLog::new(ActionType::ManualMark, actor, now);
            log.crane_id = Some(crane_id.to_string());
            log.year = Some(year);
            log.month = Some(month);
            log.payload_json = Some(serde_json::json!({
                "from": change.previous,
                "to": record.status,
                "notes": notes,
            }));
            log.detail = notes.map(str::to_string);
            self.audit(log);
        }

        Ok(record)
    }

    /// 以厂区今天为基准执行过期扫描
    pub async fn update_expired_statuses(&self) -> ApiResult<usize> {
        let today = self.facility_today().await?;
        self.update_expired_statuses_on(today)
    }

    /// 以指定日期执行过期扫描 (补跑/测试)
    pub fn update_expired_statuses_on(&self, today: NaiveDate) -> ApiResult<usize> {
        let updated = self.tracker.update_expired_statuses(today)?;
        if updated > 0 {
            let mut log = ActionLog::new(ActionType::ExpireStatuses, SYSTEM_ACTOR, Utc::now().naive_utc());
            log.payload_json = Some(serde_json::json!({
                "today": today,
                "updated": updated,
            }));
            self.audit(log);
        }
        Ok(updated)
    }

    /// 点检完成记入
    ///
    /// # 参数
    /// - inspection_date: YYYY-MM-DD 或 YYYY/MM/DD
    pub fn record_completion(&self, crane_id: &str, inspection_date: &str) -> ApiResult<CompletionOutcome> {
        if crane_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("起重机ID不能为空".to_string()));
        }
        let date = window_resolver::parse_date(inspection_date)?;
        let record = self.tracker.record_completion(crane_id, date)?;
        let timing = window_resolver::inspection_timing(record.department, date);
        Ok(CompletionOutcome { record, timing })
    }

    // ==========================================
    // 台账
    // ==========================================

    /// 登记起重机
    pub fn register_crane(
        &self,
        crane_id: &str,
        department: &str,
        shed_id: &str,
        crane_number: &str,
    ) -> ApiResult<ActiveCrane> {
        if crane_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("起重机ID不能为空".to_string()));
        }
        let department = window_resolver::parse_department(department)?;
        let crane = ActiveCrane::new(crane_id.trim(), department, shed_id.trim(), crane_number.trim());
        self.crane_repo.upsert(&crane)?;
        info!(crane_id = %crane.crane_id, department = %department, "起重机已登记");
        Ok(crane)
    }

    /// 启用/停用起重机 (影响之后初始化的月份)
    pub fn set_crane_active(&self, crane_id: &str, active: bool) -> ApiResult<()> {
        self.crane_repo.set_active(crane_id, active)?;
        info!(crane_id, active, "起重机在用状态已更新");
        Ok(())
    }

    /// 在用起重机
    pub fn list_active_cranes(&self) -> ApiResult<Vec<ActiveCrane>> {
        Ok(self.crane_repo.list_active_cranes()?)
    }

    /// 最近操作日志
    pub fn recent_actions(&self, limit: i32) -> ApiResult<Vec<ActionLog>> {
        Ok(self.action_log_repo.find_recent(limit)?)
    }

    /// 单台起重机的操作日志
    pub fn crane_actions(&self, crane_id: &str, limit: i32) -> ApiResult<Vec<ActionLog>> {
        Ok(self.action_log_repo.find_by_crane(crane_id, limit)?)
    }
}
