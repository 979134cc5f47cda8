use super::ActionLogRepository;
use crate::domain::action_log::{ActionLog, ActionType};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde_json::json;
use std::sync::{Arc, Mutex};

fn setup_test_db() -> Arc<Mutex<Connection>> {
    let conn = Connection::open_in_memory().unwrap();
    crate::db::configure_sqlite_connection(&conn).unwrap();
    crate::db::init_schema(&conn).unwrap();
    Arc::new(Mutex::new(conn))
}

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn make_test_log(crane_id: &str, ts: NaiveDateTime) -> ActionLog {
    let mut log = ActionLog::new(ActionType::ManualMark, "admin", ts);
    log.crane_id = Some(crane_id.to_string());
    log.year = Some(2024);
    log.month = Some(3);
    log.payload_json = Some(json!({"from": "PENDING", "to": "COMPLETED"}));
    log.detail = Some("Test log".to_string());
    log
}

#[test]
fn test_insert_and_find_by_id() {
    let repo = ActionLogRepository::new(setup_test_db());

    let log = make_test_log("C1", at(5, 9));
    let action_id = repo.insert(&log).unwrap();
    assert_eq!(action_id, log.action_id);

    let found = repo.find_by_id(&action_id).unwrap().unwrap();
    assert_eq!(found.action_type, "ManualMark");
    assert_eq!(found.actor, "admin");
    assert_eq!(found.crane_id.as_deref(), Some("C1"));
    assert_eq!(found.month, Some(3));
    assert_eq!(found.action_ts, at(5, 9));
    assert_eq!(found.payload_json.unwrap()["to"], "COMPLETED");
}

#[test]
fn test_find_by_crane_newest_first() {
    let repo = ActionLogRepository::new(setup_test_db());

    repo.insert(&make_test_log("C1", at(2, 8))).unwrap();
    repo.insert(&make_test_log("C1", at(9, 8))).unwrap();
    repo.insert(&make_test_log("C2", at(3, 8))).unwrap();

    let logs = repo.find_by_crane("C1", 10).unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].action_ts, at(9, 8));

    assert_eq!(repo.find_recent(1).unwrap()[0].action_ts, at(9, 8));
}

#[test]
fn test_find_missing() {
    let repo = ActionLogRepository::new(setup_test_db());
    assert!(repo.find_by_id("missing").unwrap().is_none());
}
