// ==========================================
// 起重机点检排期系统 - 维保事件发布
// ==========================================
// 职责: 定义维保事件发布 trait, 由通知协作方实现
// 说明: 引擎只发布事件, 不关心消息如何送达接收人
// ==========================================

use crate::domain::types::{Department, MaintenanceStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 维保事件
// ==========================================

/// 维保事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaintenanceEvent {
    /// 过期扫描将一批记录置为 MISSED
    WindowsMissed {
        department: Department,
        year: i32,
        month: u32,
        count: usize,
    },
    /// 点检完成已记入月度状态
    CompletionRecorded {
        crane_id: String,
        year: i32,
        month: u32,
        status: MaintenanceStatus,
        completed_date: NaiveDate,
        completed_in_reschedule: bool,
    },
    /// 管理员人工标记
    StatusMarked {
        crane_id: String,
        year: i32,
        month: u32,
        status: MaintenanceStatus,
    },
}

impl MaintenanceEvent {
    /// 事件类型标识
    pub fn as_str(&self) -> &str {
        match self {
            MaintenanceEvent::WindowsMissed { .. } => "WindowsMissed",
            MaintenanceEvent::CompletionRecorded { .. } => "CompletionRecorded",
            MaintenanceEvent::StatusMarked { .. } => "StatusMarked",
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 维保事件发布者
///
/// # 实现说明
/// - 通知协作方实现此 trait (如推送到外部群聊)
/// - 发布失败由调用方记录日志, 不影响状态写入
pub trait MaintenanceEventPublisher: Send + Sync {
    fn publish(&self, event: MaintenanceEvent) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl MaintenanceEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: MaintenanceEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!("NoOpEventPublisher: 跳过事件发布 - event_type={}", event.as_str());
        Ok(())
    }
}

/// 可选的事件发布者包装
///
/// 发布失败只记录 warn, 不向上传播
#[derive(Clone, Default)]
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn MaintenanceEventPublisher>>,
}

impl OptionalEventPublisher {
    pub fn with_publisher(publisher: Arc<dyn MaintenanceEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    pub fn none() -> Self {
        Self { inner: None }
    }

    pub fn publish(&self, event: MaintenanceEvent) {
        let Some(publisher) = &self.inner else {
            tracing::debug!(
                "OptionalEventPublisher: 未配置发布者，跳过事件 - event_type={}",
                event.as_str()
            );
            return;
        };

        let event_type = event.as_str().to_string();
        if let Err(e) = publisher.publish(event) {
            tracing::warn!(event_type = %event_type, error = %e, "维保事件发布失败");
        }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}
