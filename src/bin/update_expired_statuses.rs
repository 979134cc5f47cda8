// Cron trigger: move PENDING records whose department window has passed to MISSED.
//
// Usage:
//   update_expired_statuses [db_path] [YYYY-MM-DD]
//
// Without a date the facility's local "today" (config: facility_utc_offset_minutes) is used.
// Safe to run repeatedly.

use crane_maintenance::app::{get_default_db_path, AppState};
use crane_maintenance::engine::window_resolver::parse_date;
use crane_maintenance::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let db_path = args
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(get_default_db_path);

    let state = AppState::new(db_path)?;
    let api = &state.maintenance_api;

    let updated = match args.next() {
        Some(raw) => api.update_expired_statuses_on(parse_date(&raw)?)?,
        None => api.update_expired_statuses().await?,
    };

    println!("updated={}", updated);
    Ok(())
}
