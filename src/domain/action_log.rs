// ==========================================
// 起重机点检排期系统 - 操作日志领域模型
// ==========================================
// 用途: 审计追踪 (人工标记状态、月度初始化、过期扫描)
// 对齐: action_log 表
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,
    pub action_type: String,       // 操作类型 (存储为字符串)
    pub action_ts: NaiveDateTime,
    pub actor: String,

    // ===== 作用范围 =====
    pub crane_id: Option<String>,  // 月度批量操作为 None
    pub year: Option<i32>,
    pub month: Option<u32>,

    pub payload_json: Option<JsonValue>,
    pub detail: Option<String>,
}

impl ActionLog {
    /// 创建新日志, action_id 自动生成
    pub fn new(action_type: ActionType, actor: &str, action_ts: NaiveDateTime) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            action_type: action_type.to_string(),
            action_ts,
            actor: actor.to_string(),
            crane_id: None,
            year: None,
            month: None,
            payload_json: None,
            detail: None,
        }
    }
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    InitializeMonth, // 月度初始化
    ManualMark,      // 人工标记状态
    ExpireStatuses,  // 过期扫描
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionType::InitializeMonth => write!(f, "InitializeMonth"),
            ActionType::ManualMark => write!(f, "ManualMark"),
            ActionType::ExpireStatuses => write!(f, "ExpireStatuses"),
        }
    }
}
