// ==========================================
// 起重机点检排期系统 - 月度维保状态跟踪器
// ==========================================
// 状态机: PENDING -> COMPLETED          (窗口结束前点检记入)
//         PENDING -> MISSED             (窗口已过: 过期扫描, 或窗口后点检记入时先行迁移)
//         MISSED  -> RESCHEDULED        (错过后点检记入)
// 红线: MISSED 不得迁移为 COMPLETED; COMPLETED / RESCHEDULED 不再被自动流程改写
// 红线: 判断“窗口是否已过”的日期一律由调用方传入
// ==========================================

use crate::domain::maintenance::{
    CraneStatusView, DepartmentSummary, MissedCrane, MonthCalendar, MonthlyCraneStatus,
    RescheduleCranes, StatusChange,
};
use crate::domain::types::{Department, MaintenancePeriod, MaintenanceStatus};
use crate::engine::error::{ScheduleError, ScheduleResult};
use crate::engine::events::{MaintenanceEvent, MaintenanceEventPublisher, OptionalEventPublisher};
use crate::engine::window_resolver::{
    department_window, has_window_passed, inspection_timing, is_reschedule_period,
    validate_year_month,
};
use crate::repository::crane_repo::CraneRoster;
use crate::repository::error::RepositoryError;
use crate::repository::maintenance_status_repo::MaintenanceStatusRepository;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 条件写入失败后重新读取的最大次数
///
/// 一次记入最多经历 PENDING -> MISSED -> RESCHEDULED 两步, 另留一次给并发修改
const MAX_COMPLETION_ATTEMPTS: usize = 3;

/// 记录元数据的时间戳 (不参与任何窗口判断)
fn bookkeeping_ts() -> NaiveDateTime {
    Utc::now().naive_utc()
}

// ==========================================
// InspectionRecordedHook - 点检记录回调
// ==========================================
// 点检记录协作方在点检保存成功后调用
pub trait InspectionRecordedHook: Send + Sync {
    fn on_inspection_recorded(
        &self,
        crane_id: &str,
        inspection_date: NaiveDate,
    ) -> ScheduleResult<MonthlyCraneStatus>;
}

// ==========================================
// ScheduleTracker - 月度维保状态跟踪器
// ==========================================
pub struct ScheduleTracker {
    roster: Arc<dyn CraneRoster>,
    status_repo: Arc<MaintenanceStatusRepository>,
    events: OptionalEventPublisher,
}

impl ScheduleTracker {
    pub fn new(roster: Arc<dyn CraneRoster>, status_repo: Arc<MaintenanceStatusRepository>) -> Self {
        Self {
            roster,
            status_repo,
            events: OptionalEventPublisher::none(),
        }
    }

    /// 挂接事件发布者 (通知协作方)
    pub fn with_event_publisher(mut self, publisher: Arc<dyn MaintenanceEventPublisher>) -> Self {
        self.events = OptionalEventPublisher::with_publisher(publisher);
        self
    }

    // ==========================================
    // 月度初始化
    // ==========================================

    /// initializeMonth: 为每台在用起重机确保存在 PENDING 记录
    ///
    /// 幂等: 已存在的记录不覆盖、不重置进度; 重复或并发调用均视为成功
    ///
    /// # 返回
    /// - Ok(usize): 本次新建的记录数
    pub fn initialize_month(&self, year: i32, month: u32) -> ScheduleResult<usize> {
        validate_year_month(year, month)?;

        let cranes = self.roster.list_active_cranes()?;
        let ts = bookkeeping_ts();
        let records: Vec<MonthlyCraneStatus> = cranes
            .into_iter()
            .map(|crane| MonthlyCraneStatus {
                record_id: uuid::Uuid::new_v4().to_string(),
                crane_id: crane.crane_id,
                department: crane.department,
                shed_id: crane.shed_id,
                crane_number: crane.crane_number,
                year,
                month,
                status: MaintenanceStatus::Pending,
                completed_date: None,
                completed_in_reschedule: false,
                manually_marked: false,
                notes: None,
                created_at: ts,
                updated_at: ts,
            })
            .collect();

        let inserted = self.status_repo.insert_if_absent(&records)?;
        if inserted > 0 {
            info!(year, month, active = records.len(), inserted, "月度维保记录初始化完成");
        } else {
            debug!(year, month, active = records.len(), "月度维保记录已存在，跳过初始化");
        }
        Ok(inserted)
    }

    // ==========================================
    // 查询
    // ==========================================

    /// getCalendar: 按部门汇总某月状态, 附各部门窗口
    pub fn get_calendar(&self, year: i32, month: u32) -> ScheduleResult<MonthCalendar> {
        validate_year_month(year, month)?;

        let mut summaries: BTreeMap<Department, DepartmentSummary> = Department::ALL
            .iter()
            .map(|d| (*d, DepartmentSummary::default()))
            .collect();
        for record in self.status_repo.find_by_month(year, month)? {
            summaries.entry(record.department).or_default().add(record.status);
        }

        let mut department_windows = BTreeMap::new();
        for department in Department::ALL {
            department_windows.insert(department, department_window(department.into(), year, month)?);
        }

        Ok(MonthCalendar {
            year,
            month,
            summaries,
            department_windows,
            reschedule_window: department_window(MaintenancePeriod::Reschedule, year, month)?,
        })
    }

    /// getDepartmentStatus: 部门内逐台状态 (按厂房、编号排序)
    pub fn get_department_status(
        &self,
        department: Department,
        year: i32,
        month: u32,
    ) -> ScheduleResult<Vec<CraneStatusView>> {
        validate_year_month(year, month)?;
        let records = self
            .status_repo
            .find_by_department_month(department, year, month)?;
        Ok(records.into_iter().map(CraneStatusView::from).collect())
    }

    /// getRescheduleCranes: 本月错过窗口的起重机及其原定窗口
    pub fn get_reschedule_cranes(&self, year: i32, month: u32) -> ScheduleResult<RescheduleCranes> {
        validate_year_month(year, month)?;

        let missed = self
            .status_repo
            .find_by_month_status(year, month, MaintenanceStatus::Missed)?;

        let mut missed_cranes = Vec::with_capacity(missed.len());
        for record in missed {
            missed_cranes.push(MissedCrane {
                original_window: department_window(record.department.into(), year, month)?,
                crane_id: record.crane_id,
                crane_number: record.crane_number,
                shed_id: record.shed_id,
                department: record.department,
                notes: record.notes,
            });
        }

        Ok(RescheduleCranes {
            year,
            month,
            missed_cranes,
            reschedule_window: department_window(MaintenancePeriod::Reschedule, year, month)?,
        })
    }

    /// 单台起重机某月记录
    pub fn get_crane_month(
        &self,
        crane_id: &str,
        year: i32,
        month: u32,
    ) -> ScheduleResult<MonthlyCraneStatus> {
        validate_year_month(year, month)?;
        self.status_repo
            .find_by_crane_month(crane_id, year, month)?
            .ok_or_else(|| ScheduleError::NotFound {
                crane_id: crane_id.to_string(),
                year,
                month,
            })
    }

    /// 单台起重机历史 (新月份在前)
    pub fn get_crane_history(&self, crane_id: &str) -> ScheduleResult<Vec<MonthlyCraneStatus>> {
        Ok(self.status_repo.find_by_crane(crane_id)?)
    }

    // ==========================================
    // 状态迁移
    // ==========================================

    /// markStatus: 管理员人工标记
    ///
    /// 人工标记不受状态机约束; COMPLETED / RESCHEDULED 写入 completed_date = today,
    /// PENDING / MISSED 清空完成信息。
    /// completed_in_reschedule 仅当 today 落在该记录所属月份的补检期内
    ///
    /// # 返回
    /// - StatusChange: 标记前状态 (与写入同一事务读取) 与标记后记录
    pub fn mark_status(
        &self,
        crane_id: &str,
        year: i32,
        month: u32,
        status: MaintenanceStatus,
        notes: Option<&str>,
        today: NaiveDate,
    ) -> ScheduleResult<StatusChange> {
        validate_year_month(year, month)?;

        let (completed_date, in_reschedule) = if status.is_done() {
            let same_month = today.year() == year && today.month() == month;
            (Some(today), same_month && is_reschedule_period(today))
        } else {
            (None, false)
        };

        let previous = self.status_repo.update_manual(
            crane_id,
            year,
            month,
            status,
            completed_date,
            in_reschedule,
            notes,
            bookkeeping_ts(),
        )?;
        let Some(previous) = previous else {
            return Err(ScheduleError::NotFound {
                crane_id: crane_id.to_string(),
                year,
                month,
            });
        };

        info!(crane_id, year, month, from = %previous, to = %status, "人工标记维保状态");
        self.events.publish(MaintenanceEvent::StatusMarked {
            crane_id: crane_id.to_string(),
            year,
            month,
            status,
        });

        Ok(StatusChange {
            previous,
            record: self.get_crane_month(crane_id, year, month)?,
        })
    }

    /// updateExpiredStatuses: 将窗口已过仍为 PENDING 的记录置为 MISSED
    ///
    /// - 当月: 按部门窗口分批, 仅处理 has_window_passed 的部门
    /// - 更早月份: 全部窗口均已过, 一并处理
    ///
    /// 幂等; 条件写入保证并发完成的记录不会被改回 MISSED
    ///
    /// # 返回
    /// - Ok(usize): 本次置为 MISSED 的记录数
    pub fn update_expired_statuses(&self, today: NaiveDate) -> ScheduleResult<usize> {
        let (year, month) = (today.year(), today.month());
        validate_year_month(year, month)?;
        let ts = bookkeeping_ts();
        let mut total = 0;

        for batch in self.status_repo.expire_pending_before(year, month, ts)? {
            total += batch.count;
            self.events.publish(MaintenanceEvent::WindowsMissed {
                department: batch.department,
                year: batch.year,
                month: batch.month,
                count: batch.count,
            });
        }

        for department in Department::ALL {
            if !has_window_passed(department, today) {
                continue;
            }
            let count = self
                .status_repo
                .expire_pending_for_department(department, year, month, ts)?;
            if count > 0 {
                total += count;
                self.events.publish(MaintenanceEvent::WindowsMissed {
                    department,
                    year,
                    month,
                    count,
                });
            }
        }

        if total > 0 {
            info!(today = %today, updated = total, "过期维保记录已置为 MISSED");
        } else {
            debug!(today = %today, "无过期维保记录");
        }
        Ok(total)
    }

    /// recordCompletion: 点检完成记入当月状态
    ///
    /// - PENDING, 部门窗口未过 -> COMPLETED
    /// - PENDING, 部门窗口已过 -> 先条件迁移为 MISSED, 再按 MISSED 处理
    /// - MISSED  -> RESCHEDULED
    /// - COMPLETED / RESCHEDULED: 首次完成为准, 原样返回
    ///
    /// completed_in_reschedule 取决于点检日期是否处于补检期
    pub fn record_completion(
        &self,
        crane_id: &str,
        inspection_date: NaiveDate,
    ) -> ScheduleResult<MonthlyCraneStatus> {
        let (year, month) = (inspection_date.year(), inspection_date.month());
        let in_reschedule = is_reschedule_period(inspection_date);

        for _ in 0..MAX_COMPLETION_ATTEMPTS {
            let record = self.get_crane_month(crane_id, year, month)?;

            let target = match record.status {
                MaintenanceStatus::Completed | MaintenanceStatus::Rescheduled => {
                    debug!(crane_id, year, month, status = %record.status, "已完成，忽略重复点检");
                    return Ok(record);
                }
                MaintenanceStatus::Pending if has_window_passed(record.department, inspection_date) => {
                    // 窗口后的点检与是否已跑过期扫描无关, 一律经 MISSED 记为 RESCHEDULED
                    if self
                        .status_repo
                        .miss_if_pending(crane_id, year, month, bookkeeping_ts())?
                    {
                        info!(crane_id, year, month, "窗口已过的点检: PENDING 先置为 MISSED");
                        self.events.publish(MaintenanceEvent::WindowsMissed {
                            department: record.department,
                            year,
                            month,
                            count: 1,
                        });
                    }
                    continue;
                }
                MaintenanceStatus::Pending => MaintenanceStatus::Completed,
                MaintenanceStatus::Missed => MaintenanceStatus::Rescheduled,
            };

            let timing = inspection_timing(record.department, inspection_date);
            if timing.is_out_of_window() {
                warn!(
                    crane_id,
                    department = %record.department,
                    inspection_date = %inspection_date,
                    timing = %timing,
                    "点检日期不在部门窗口内"
                );
            }

            let applied = self.status_repo.complete_if_status(
                crane_id,
                year,
                month,
                record.status,
                target,
                inspection_date,
                in_reschedule,
                bookkeeping_ts(),
            )?;

            if applied {
                info!(
                    crane_id,
                    year,
                    month,
                    from = %record.status,
                    to = %target,
                    in_reschedule,
                    "点检完成已记入"
                );
                self.events.publish(MaintenanceEvent::CompletionRecorded {
                    crane_id: crane_id.to_string(),
                    year,
                    month,
                    status: target,
                    completed_date: inspection_date,
                    completed_in_reschedule: in_reschedule,
                });
                return self.get_crane_month(crane_id, year, month);
            }

            debug!(crane_id, year, month, "状态已被并发修改，重新读取");
        }

        Err(ScheduleError::Repository(RepositoryError::InternalError(format!(
            "记录完成状态重试耗尽: crane_id={}, {}-{:02}",
            crane_id, year, month
        ))))
    }
}

impl InspectionRecordedHook for ScheduleTracker {
    fn on_inspection_recorded(
        &self,
        crane_id: &str,
        inspection_date: NaiveDate,
    ) -> ScheduleResult<MonthlyCraneStatus> {
        self.record_completion(crane_id, inspection_date)
    }
}
