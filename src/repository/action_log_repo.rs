// ==========================================
// 起重机点检排期系统 - 操作日志数据仓储
// ==========================================
// 对齐: action_log 表
// 红线: 人工标记必须留痕
// ==========================================

mod core;

#[cfg(test)]
mod tests;

pub use self::core::ActionLogRepository;
