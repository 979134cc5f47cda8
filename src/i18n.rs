// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持中文（默认）和英文
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

use crate::domain::types::{Department, InspectionTiming, MaintenancePeriod, MaintenanceStatus};

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"zh-CN" 或 "en"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// 翻译消息（无参数）
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数）
///
/// # 示例
/// ```no_run
/// use crane_maintenance::i18n::t_with_args;
/// let msg = t_with_args("common.not_initialized", &[("year", "2024"), ("month", "03")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

pub fn department_label(department: Department) -> String {
    t(&format!("department.{}", department.code()))
}

pub fn period_label(period: MaintenancePeriod) -> String {
    t(&format!("period.{}", period.code()))
}

pub fn status_label(status: MaintenanceStatus) -> String {
    t(&format!("status.{}", status.as_str()))
}

pub fn timing_label(timing: InspectionTiming) -> String {
    t(&format!("timing.{}", timing))
}
