// ==========================================
// 起重机点检排期系统 - 命令行入口
// ==========================================
// 输出: stdout 为 JSON, 日志写 stderr
// 环境变量:
// - CRANE_MAINTENANCE_DB_PATH: 数据库路径
// - CRANE_MAINTENANCE_LANG: 标签语言 (zh-CN / en)
// - CRANE_MAINTENANCE_ACTOR: 人工标记的操作人
// ==========================================

use std::error::Error;

use crane_maintenance::api::{ApiError, ApiResult, MaintenanceApi};
use crane_maintenance::app::{get_default_db_path, AppState};
use crane_maintenance::{i18n, logging};
use serde::Serialize;
use serde_json::json;

const USAGE: &str = r#"用法: crane-maintenance <命令> [参数]

窗口查询:
  today                                   今日时段与剩余天数
  period <日期>                           日期所属时段
  window <HSM|HBM|PTM|RESCHEDULE> <年> <月>
  schedule <年> <月>                      逐日时段
  grid <年> <月>                          月历网格 (周日起)

月度状态:
  init <年> <月>                          初始化月度记录
  calendar <年> <月>                      各部门汇总
  department <部门> <年> <月>             部门明细
  reschedule <年> <月>                    补检清单
  mark <起重机ID> <年> <月> <状态> [备注] 人工标记
  complete <起重机ID> <日期>              记入点检完成
  expire [日期]                           过期扫描 (默认厂区今天)
  history <起重机ID>                      历史记录

台账与配置:
  register <起重机ID> <部门> <厂房> <编号>
  activate <起重机ID> | deactivate <起重机ID>
  cranes                                  在用起重机
  actions [条数]                          最近操作日志
  config-get <键> | config-set <键> <值>
"#;

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn arg<'a>(args: &'a [String], idx: usize, name: &str) -> ApiResult<&'a str> {
    args.get(idx)
        .map(String::as_str)
        .ok_or_else(|| ApiError::InvalidInput(format!("缺少参数: {}", name)))
}

fn year_month(args: &[String], idx: usize) -> ApiResult<(i32, u32)> {
    let year = arg(args, idx, "年")?;
    let month = arg(args, idx + 1, "月")?;
    let year = year
        .parse::<i32>()
        .map_err(|_| ApiError::InvalidDate(format!("年份不是整数: {}", year)))?;
    let month = month
        .parse::<u32>()
        .map_err(|_| ApiError::InvalidDate(format!("月份不是整数: {}", month)))?;
    Ok((year, month))
}

fn actor() -> String {
    std::env::var("CRANE_MAINTENANCE_ACTOR")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "admin".to_string())
}

async fn run(state: &AppState, args: &[String]) -> Result<(), Box<dyn Error>> {
    let api: &MaintenanceApi = &state.maintenance_api;
    let command = args.first().map(String::as_str).unwrap_or("help");

    match command {
        "today" => {
            let overview = api.today_overview().await?;
            print_json(&json!({
                "overview": overview,
                "label": i18n::period_label(overview.period),
            }))
        }
        "period" => {
            let period = api.resolve_period(arg(args, 1, "日期")?)?;
            print_json(&json!({ "period": period, "label": i18n::period_label(period) }))
        }
        "window" => {
            let (year, month) = year_month(args, 2)?;
            print_json(&api.department_window(arg(args, 1, "部门")?, year, month)?)
        }
        "schedule" => {
            let (year, month) = year_month(args, 1)?;
            print_json(&api.month_schedule(year, month)?)
        }
        "grid" => {
            let (year, month) = year_month(args, 1)?;
            print_json(&api.calendar_grid(year, month)?)
        }
        "init" => {
            let (year, month) = year_month(args, 1)?;
            let inserted = api.initialize_month(year, month, &actor())?;
            print_json(&json!({ "year": year, "month": month, "inserted": inserted }))
        }
        "calendar" => {
            let (year, month) = year_month(args, 1)?;
            print_json(&api.get_calendar(year, month).await?)
        }
        "department" => {
            let (year, month) = year_month(args, 2)?;
            print_json(&api.get_department_status(arg(args, 1, "部门")?, year, month).await?)
        }
        "reschedule" => {
            let (year, month) = year_month(args, 1)?;
            print_json(&api.get_reschedule_cranes(year, month).await?)
        }
        "mark" => {
            let crane_id = arg(args, 1, "起重机ID")?;
            let (year, month) = year_month(args, 2)?;
            let status = arg(args, 4, "状态")?;
            let notes = args.get(5).map(String::as_str);
            match api.mark_status(crane_id, year, month, status, notes, &actor()).await {
                Ok(record) => print_json(&record),
                Err(ApiError::NotFound(msg)) => {
                    let (y, m) = (year.to_string(), format!("{:02}", month));
                    let hint = i18n::t_with_args(
                        "common.not_initialized",
                        &[("year", y.as_str()), ("month", m.as_str())],
                    );
                    eprintln!("{}", hint);
                    Err(ApiError::NotFound(msg).into())
                }
                Err(e) => Err(e.into()),
            }
        }
        "complete" => {
            let outcome = api.record_completion(arg(args, 1, "起重机ID")?, arg(args, 2, "日期")?)?;
            print_json(&json!({
                "record": outcome.record,
                "timing": outcome.timing,
                "timing_label": i18n::timing_label(outcome.timing),
            }))
        }
        "expire" => {
            let updated = match args.get(1) {
                Some(date) => {
                    let date = crane_maintenance::engine::window_resolver::parse_date(date)
                        .map_err(ApiError::from)?;
                    api.update_expired_statuses_on(date)?
                }
                None => api.update_expired_statuses().await?,
            };
            print_json(&json!({ "updated": updated }))
        }
        "history" => print_json(&api.get_crane_history(arg(args, 1, "起重机ID")?)?),
        "register" => {
            let crane = api.register_crane(
                arg(args, 1, "起重机ID")?,
                arg(args, 2, "部门")?,
                arg(args, 3, "厂房")?,
                arg(args, 4, "编号")?,
            )?;
            print_json(&crane)
        }
        "activate" | "deactivate" => {
            let crane_id = arg(args, 1, "起重机ID")?;
            api.set_crane_active(crane_id, command == "activate")?;
            print_json(&json!({ "crane_id": crane_id, "active": command == "activate" }))
        }
        "cranes" => print_json(&api.list_active_cranes()?),
        "actions" => {
            let limit = match args.get(1) {
                Some(raw) => raw
                    .parse::<i32>()
                    .map_err(|_| ApiError::InvalidInput(format!("条数不是整数: {}", raw)))?,
                None => 20,
            };
            print_json(&api.recent_actions(limit)?)
        }
        "config-get" => {
            let key = arg(args, 1, "键")?;
            let value = state.config_manager.get_global_config_value(key).map_err(|e| e.to_string())?;
            print_json(&json!({ "key": key, "value": value }))
        }
        "config-set" => {
            let key = arg(args, 1, "键")?;
            let value = arg(args, 2, "值")?;
            state
                .config_manager
                .set_global_config_value(key, value)
                .map_err(|e| e.to_string())?;
            print_json(&json!({ "key": key, "value": value }))
        }
        _ => {
            print!("{}", USAGE);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    logging::init();

    if let Ok(lang) = std::env::var("CRANE_MAINTENANCE_LANG") {
        i18n::set_locale(lang.trim());
    }

    let args: Vec<String> = std::env::args().skip(1).collect();

    let db_path = get_default_db_path();
    tracing::debug!("使用数据库: {}", db_path);
    let state = AppState::new(db_path)?;

    run(&state, &args).await
}
