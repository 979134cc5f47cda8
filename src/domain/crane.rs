// ==========================================
// 起重机点检排期系统 - 起重机台账模型
// ==========================================
// 来源: 台账协作方 (listActiveCranes)
// ==========================================

use crate::domain::types::Department;
use serde::{Deserialize, Serialize};

// ==========================================
// ActiveCrane - 在用起重机
// ==========================================
// 用途: 月度初始化时逐台生成状态记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveCrane {
    pub crane_id: String,       // 起重机ID
    pub department: Department, // 所属部门 (决定点检窗口)
    pub shed_id: String,        // 厂房/跨
    pub crane_number: String,   // 起重机编号 (现场铭牌)
}

impl ActiveCrane {
    pub fn new(crane_id: &str, department: Department, shed_id: &str, crane_number: &str) -> Self {
        Self {
            crane_id: crane_id.to_string(),
            department,
            shed_id: shed_id.to_string(),
            crane_number: crane_number.to_string(),
        }
    }
}
