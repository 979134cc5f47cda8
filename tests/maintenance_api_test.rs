// ==========================================
// MaintenanceApi 集成测试
// ==========================================
// 覆盖: 参数校验、自动初始化配置、人工标记审计、错误转换
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod maintenance_api_test {
    use crane_maintenance::api::ApiError;
    use crane_maintenance::app::AppState;
    use crane_maintenance::config::config_keys;
    use crane_maintenance::domain::action_log::ActionType;
    use crane_maintenance::domain::types::{InspectionTiming, MaintenancePeriod, MaintenanceStatus};
    use chrono::Datelike;
    use tempfile::NamedTempFile;

    use crate::test_helpers::{create_test_db, date};

    fn setup() -> (NamedTempFile, AppState) {
        let (temp_file, db_path) = create_test_db().unwrap();
        let state = AppState::new(db_path).unwrap();
        let api = &state.maintenance_api;
        api.register_crane("HSM-A", "HSM", "S1", "HSM-01").unwrap();
        api.register_crane("HBM-A", "hbm", "S2", "HBM-01").unwrap();
        api.register_crane("PTM-A", " ptm ", "S3", "PTM-01").unwrap();
        (temp_file, state)
    }

    #[tokio::test]
    async fn test_calendar_auto_initializes_current_month() {
        let (_temp_file, state) = setup();
        let today = state.maintenance_api.facility_today().await.unwrap();

        let calendar = state
            .maintenance_api
            .get_calendar(today.year(), today.month())
            .await
            .unwrap();
        let total: u32 = calendar.summaries.values().map(|s| s.total).sum();
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn test_past_month_reads_do_not_create_records() {
        let (_temp_file, state) = setup();
        let api = &state.maintenance_api;

        let calendar = api.get_calendar(2019, 1).await.unwrap();
        assert!(calendar.summaries.values().all(|s| s.total == 0));
        assert!(api.get_department_status("HBM", 2019, 1).await.unwrap().is_empty());
        assert!(api.get_reschedule_cranes(2019, 1).await.unwrap().missed_cranes.is_empty());

        // 后续过期扫描也不会出现凭空的 MISSED 记录
        api.update_expired_statuses_on(date(2024, 3, 1)).unwrap();
        assert!(api.get_crane_history("HSM-A").unwrap().is_empty());
        assert!(api.get_crane_history("HBM-A").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_auto_initialize_can_be_disabled() {
        let (_temp_file, state) = setup();
        state
            .config_manager
            .set_global_config_value(config_keys::AUTO_INITIALIZE_MONTH, "false")
            .unwrap();
        let today = state.maintenance_api.facility_today().await.unwrap();

        let rows = state
            .maintenance_api
            .get_department_status("HSM", today.year(), today.month())
            .await
            .unwrap();
        assert!(rows.is_empty());

        // 未初始化的月份: 记入点检返回 NotFound, 不可直接重试
        let err = state
            .maintenance_api
            .record_completion("HSM-A", "2024-03-02")
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_department_status_rejects_unknown_code() {
        let (_temp_file, state) = setup();
        let err = state
            .maintenance_api
            .get_department_status("XYZ", 2024, 3)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidDepartment(_)));

        let err = state
            .maintenance_api
            .department_window("RESCHEDULED", 2024, 3)
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidDepartment(_)));
    }

    #[tokio::test]
    async fn test_record_completion_reports_timing() {
        let (_temp_file, state) = setup();
        let api = &state.maintenance_api;
        api.initialize_month(2024, 3, "tester").unwrap();

        let outcome = api.record_completion("HBM-A", "2024/03/09").unwrap();
        assert_eq!(outcome.record.status, MaintenanceStatus::Completed);
        assert_eq!(outcome.timing, InspectionTiming::InWindow);

        let outcome = api.record_completion("PTM-A", "2024-03-05").unwrap();
        assert_eq!(outcome.timing, InspectionTiming::BeforeWindow);

        let err = api.record_completion("PTM-A", "2024-02-30").unwrap_err();
        assert!(matches!(err, ApiError::InvalidDate(_)));
    }

    #[tokio::test]
    async fn test_mark_status_is_audited() {
        let (_temp_file, state) = setup();
        let api = &state.maintenance_api;
        api.initialize_month(2024, 3, "tester").unwrap();

        let record = api
            .mark_status("HSM-A", 2024, 3, "re-scheduled", Some("纸质记录补录"), "admin01")
            .await
            .unwrap();
        assert_eq!(record.status, MaintenanceStatus::Rescheduled);
        assert!(record.manually_marked);
        assert!(record.completed_date.is_some());

        let logs = api.crane_actions("HSM-A", 10).unwrap();
        assert_eq!(logs.len(), 1);
        let log = &logs[0];
        assert_eq!(log.action_type, ActionType::ManualMark.to_string());
        assert_eq!(log.actor, "admin01");
        let payload = log.payload_json.as_ref().unwrap();
        assert_eq!(payload["from"], "PENDING");
        assert_eq!(payload["to"], "RESCHEDULED");

        // 初始化也留痕
        let recent = api.recent_actions(10).unwrap();
        assert!(recent
            .iter()
            .any(|l| l.action_type == ActionType::InitializeMonth.to_string()));
    }

    #[tokio::test]
    async fn test_mark_status_audit_can_be_disabled() {
        let (_temp_file, state) = setup();
        state
            .config_manager
            .set_global_config_value(config_keys::AUDIT_MANUAL_MARKS, "false")
            .unwrap();
        let api = &state.maintenance_api;
        api.initialize_month(2024, 3, "tester").unwrap();

        api.mark_status("HBM-A", 2024, 3, "missed", None, "admin01")
            .await
            .unwrap();
        assert!(api.crane_actions("HBM-A", 10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mark_status_validates_input() {
        let (_temp_file, state) = setup();
        let api = &state.maintenance_api;
        api.initialize_month(2024, 3, "tester").unwrap();

        let err = api
            .mark_status("HSM-A", 2024, 3, "DONE-ISH", None, "admin01")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let err = api
            .mark_status("HSM-A", 2024, 13, "PENDING", None, "admin01")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidDate(_)));

        let err = api
            .mark_status("NOPE", 2024, 3, "PENDING", None, "admin01")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_expire_on_date_writes_audit_entry() {
        let (_temp_file, state) = setup();
        let api = &state.maintenance_api;
        api.initialize_month(2024, 3, "tester").unwrap();

        assert_eq!(api.update_expired_statuses_on(date(2024, 3, 24)).unwrap(), 3);
        assert_eq!(api.update_expired_statuses_on(date(2024, 3, 24)).unwrap(), 0);

        let expire_logs: Vec<_> = api
            .recent_actions(10)
            .unwrap()
            .into_iter()
            .filter(|l| l.action_type == ActionType::ExpireStatuses.to_string())
            .collect();
        assert_eq!(expire_logs.len(), 1);

        let reschedule = api.get_reschedule_cranes(2024, 3).await.unwrap();
        assert_eq!(reschedule.missed_cranes.len(), 3);
    }

    #[tokio::test]
    async fn test_window_queries() {
        let (_temp_file, state) = setup();
        let api = &state.maintenance_api;

        assert_eq!(api.resolve_period("2024-04-24").unwrap(), MaintenancePeriod::Reschedule);
        assert_eq!(api.resolve_period("2024-04-06").unwrap(), MaintenancePeriod::Hbm);
        assert!(matches!(api.resolve_period("not-a-date"), Err(ApiError::InvalidDate(_))));

        let window = api.department_window("reschedule", 2024, 4).unwrap();
        assert_eq!((window.start_day, window.end_day), (24, 30));

        assert_eq!(api.month_schedule(2024, 4).unwrap().len(), 30);
        let grid = api.calendar_grid(2024, 9).unwrap();
        // 2024-09-01 是周日
        assert_eq!(grid[0][0].day, Some(1));

        let overview = api.today_overview().await.unwrap();
        assert!(overview.days_remaining >= 1);
    }
}
