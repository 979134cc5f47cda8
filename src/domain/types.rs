// ==========================================
// 起重机点检排期系统 - 领域类型定义
// ==========================================
// 依据: 维保窗口划分 (HSM 1-5 / HBM 6-12 / PTM 13-23 / 补检 24-月末)
// 约定: 月份一律 1 起始 (1 = 一月)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 部门 (Department)
// ==========================================
// 每个部门拥有固定的月内点检窗口
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Department {
    Hsm, // 热轧
    Hbm, // 热卷
    Ptm, // 精整
}

impl Department {
    /// 按窗口先后排列的全部部门
    pub const ALL: [Department; 3] = [Department::Hsm, Department::Hbm, Department::Ptm];

    /// 部门代码（与数据库一致）
    pub fn code(&self) -> &'static str {
        match self {
            Department::Hsm => "HSM",
            Department::Hbm => "HBM",
            Department::Ptm => "PTM",
        }
    }

    /// 从部门代码解析（忽略大小写与首尾空白）
    ///
    /// # 返回
    /// - Some(Department): 已知部门
    /// - None: 未知代码（调用方负责转换为 InvalidDepartment 错误）
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "HSM" => Some(Department::Hsm),
            "HBM" => Some(Department::Hbm),
            "PTM" => Some(Department::Ptm),
            _ => None,
        }
    }

    /// 窗口起始日（含）
    pub fn start_day(&self) -> u32 {
        match self {
            Department::Hsm => 1,
            Department::Hbm => 6,
            Department::Ptm => 13,
        }
    }

    /// 窗口结束日（含）
    pub fn end_day(&self) -> u32 {
        match self {
            Department::Hsm => 5,
            Department::Hbm => 12,
            Department::Ptm => 23,
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ==========================================
// 维保时段 (Maintenance Period)
// ==========================================
// 三个部门窗口 + 月末补检期, 四段恰好覆盖整月
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaintenancePeriod {
    Hsm,
    Hbm,
    Ptm,
    Reschedule, // 补检期: 24 日至月末
}

/// 补检期起始日
pub const RESCHEDULE_START_DAY: u32 = 24;

impl MaintenancePeriod {
    pub const ALL: [MaintenancePeriod; 4] = [
        MaintenancePeriod::Hsm,
        MaintenancePeriod::Hbm,
        MaintenancePeriod::Ptm,
        MaintenancePeriod::Reschedule,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            MaintenancePeriod::Hsm => "HSM",
            MaintenancePeriod::Hbm => "HBM",
            MaintenancePeriod::Ptm => "PTM",
            MaintenancePeriod::Reschedule => "RESCHEDULE",
        }
    }

    /// 解析时段代码（部门代码或 RESCHEDULE）
    pub fn from_code(code: &str) -> Option<Self> {
        let normalized = code.trim().to_ascii_uppercase();
        if normalized == "RESCHEDULE" {
            return Some(MaintenancePeriod::Reschedule);
        }
        Department::from_code(&normalized).map(MaintenancePeriod::from)
    }

    /// 对应部门（补检期返回 None）
    pub fn department(&self) -> Option<Department> {
        match self {
            MaintenancePeriod::Hsm => Some(Department::Hsm),
            MaintenancePeriod::Hbm => Some(Department::Hbm),
            MaintenancePeriod::Ptm => Some(Department::Ptm),
            MaintenancePeriod::Reschedule => None,
        }
    }

    pub fn is_reschedule(&self) -> bool {
        matches!(self, MaintenancePeriod::Reschedule)
    }
}

impl From<Department> for MaintenancePeriod {
    fn from(department: Department) -> Self {
        match department {
            Department::Hsm => MaintenancePeriod::Hsm,
            Department::Hbm => MaintenancePeriod::Hbm,
            Department::Ptm => MaintenancePeriod::Ptm,
        }
    }
}

impl fmt::Display for MaintenancePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ==========================================
// 月度维保状态 (Maintenance Status)
// ==========================================
// 状态机: PENDING -> COMPLETED
//         PENDING -> MISSED -> RESCHEDULED
// COMPLETED / RESCHEDULED 为终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaintenanceStatus {
    Pending,     // 待检
    Completed,   // 窗口内完成
    Missed,      // 窗口已过未完成
    Rescheduled, // 错过后补检完成
}

impl MaintenanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenanceStatus::Pending => "PENDING",
            MaintenanceStatus::Completed => "COMPLETED",
            MaintenanceStatus::Missed => "MISSED",
            MaintenanceStatus::Rescheduled => "RESCHEDULED",
        }
    }

    /// 边界处唯一的状态字符串归一化入口
    ///
    /// 接受大小写、空格、连字符混用的写法，例如
    /// "completed" / "Re Scheduled" / "re-scheduled"
    pub fn normalize(raw: &str) -> Option<Self> {
        let key: String = raw
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_ascii_uppercase();

        match key.as_str() {
            "PENDING" => Some(MaintenanceStatus::Pending),
            "COMPLETED" | "DONE" => Some(MaintenanceStatus::Completed),
            "MISSED" => Some(MaintenanceStatus::Missed),
            "RESCHEDULED" => Some(MaintenanceStatus::Rescheduled),
            _ => None,
        }
    }

    /// 是否为终态（自动流程不再迁移）
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MaintenanceStatus::Completed | MaintenanceStatus::Rescheduled
        )
    }

    /// 是否计入“已完成”进度
    pub fn is_done(&self) -> bool {
        self.is_terminal()
    }
}

impl fmt::Display for MaintenanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 点检时机 (Inspection Timing)
// ==========================================
// 用于窗口外点检提示
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InspectionTiming {
    BeforeWindow,     // 窗口尚未开始
    InWindow,         // 窗口内
    AfterWindow,      // 窗口已过, 未到补检期
    ReschedulePeriod, // 补检期内
}

impl InspectionTiming {
    pub fn is_out_of_window(&self) -> bool {
        !matches!(self, InspectionTiming::InWindow)
    }
}

impl fmt::Display for InspectionTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InspectionTiming::BeforeWindow => write!(f, "BEFORE_WINDOW"),
            InspectionTiming::InWindow => write!(f, "IN_WINDOW"),
            InspectionTiming::AfterWindow => write!(f, "AFTER_WINDOW"),
            InspectionTiming::ReschedulePeriod => write!(f, "RESCHEDULE_PERIOD"),
        }
    }
}
