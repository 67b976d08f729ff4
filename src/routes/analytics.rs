//! # 출시(ship) 분석 API
//!
//! | 메서드 | 경로 | 설명 |
//! |--------|------|------|
//! | POST | /api/analytics/ship | 오늘 출시 수 증가 (`{ "count": 1, "project_id": "..." }`) |
//! | GET | /api/analytics/streak | 현재/최장 연속 출시 일수 |
//! | GET | /api/analytics/daily?days=30 | 최근 N일 출시 수 (빈 날은 0) |
//!
//! 날짜는 모두 UTC 기준입니다.

use std::collections::HashMap;

use axum::extract::State;
use chrono::{Duration, NaiveDate, Utc};
use serde_json::{json, Value};

use crate::{
    db,
    error::AppError,
    extract::{AppJson, AppQuery},
    middleware::auth::AuthUser,
    models::*,
    response::ApiResponse,
    routes::AppState,
    services::streak::{compute_streak, ShipDay, StreakSummary},
};

const MAX_SHIPS_PER_CALL: i64 = 100;
const DEFAULT_DAILY_DAYS: i64 = 30;
const MAX_DAILY_DAYS: i64 = 365;

async fn load_streak(
    state: &AppState,
    user_id: &str,
    today: NaiveDate,
) -> Result<StreakSummary, AppError> {
    let records = db::list_records(&state.pool, user_id).await?;
    let days = records
        .iter()
        .map(AnalyticsRecord::to_ship_day)
        .collect::<Result<Vec<ShipDay>, _>>()?;
    Ok(compute_streak(&days, today))
}

/// `POST /api/analytics/ship` — 갱신된 오늘 기록과 연속 출시 요약을 돌려줍니다.
pub async fn record_ship(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<ShipRequest>,
) -> Result<ApiResponse<Value>, AppError> {
    let count = req.count.unwrap_or(1);
    if !(1..=MAX_SHIPS_PER_CALL).contains(&count) {
        return Err(AppError::invalid(
            "count",
            format!("Count must be between 1 and {MAX_SHIPS_PER_CALL}"),
        ));
    }

    if let Some(project_id) = req.project_id.as_deref() {
        let project = db::get_project(&state.pool, project_id)
            .await?
            .ok_or(AppError::NotFound)?;
        user.ensure_owns(&project.user_id)?;
    }

    let today = Utc::now().date_naive();
    let record = db::record_ship(&state.pool, &user.user_id, &format_date(today), count).await?;
    if let Some(project_id) = req.project_id.as_deref() {
        db::touch_project_activity(&state.pool, project_id).await?;
    }
    tracing::debug!(user_id = %user.user_id, ship_count = record.ship_count, "Ship recorded");

    let streak = load_streak(&state, &user.user_id, today).await?;
    Ok(ApiResponse::ok(json!({
        "record": record,
        "streak": streak,
    })))
}

/// `GET /api/analytics/streak`
pub async fn get_streak(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<StreakSummary>, AppError> {
    let streak = load_streak(&state, &user.user_id, Utc::now().date_naive()).await?;
    Ok(ApiResponse::ok(streak))
}

/// `GET /api/analytics/daily?days=30`
///
/// 오래된 날짜부터 오늘까지 하루 한 항목씩, 기록이 없는 날은 0으로 채웁니다.
pub async fn get_daily(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(query): AppQuery<DailyQuery>,
) -> Result<ApiResponse<Vec<Value>>, AppError> {
    let days = query.days.unwrap_or(DEFAULT_DAILY_DAYS);
    if !(1..=MAX_DAILY_DAYS).contains(&days) {
        return Err(AppError::invalid(
            "days",
            format!("Days must be between 1 and {MAX_DAILY_DAYS}"),
        ));
    }

    let today = Utc::now().date_naive();
    let since = today - Duration::days(days - 1);
    let counts: HashMap<String, i64> =
        db::list_records_since(&state.pool, &user.user_id, &format_date(since))
            .await?
            .into_iter()
            .map(|r| (r.date, r.ship_count))
            .collect();

    let series: Vec<Value> = since
        .iter_days()
        .take_while(|d| *d <= today)
        .map(|d| {
            let date = format_date(d);
            let ship_count = counts.get(&date).copied().unwrap_or(0);
            json!({ "date": date, "ship_count": ship_count })
        })
        .collect();

    Ok(ApiResponse::ok(series))
}
