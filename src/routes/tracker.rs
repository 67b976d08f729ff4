//! # 뮤지션 트래커 API
//!
//! | 메서드 | 경로 | 설명 |
//! |--------|------|------|
//! | GET | /api/tracker?q= | 일정과 할 일 (검색어가 있으면 할 일만 필터) |
//! | POST | /api/tracker/actions | 리듀서 동작 적용 후 새 상태 반환 |
//! | DELETE | /api/tracker | 상태 초기화 |

use axum::extract::State;

use crate::{
    error::AppError,
    extract::{AppJson, AppQuery},
    middleware::auth::AuthUser,
    models::*,
    response::ApiResponse,
    routes::AppState,
    services::{filter::filter_by_query, tracker},
};

pub async fn get_tracker(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(query): AppQuery<TrackerQuery>,
) -> Result<ApiResponse<TrackerState>, AppError> {
    let mut tracker_state = tracker::load_state(&state.kv, &user.user_id).await?;
    tracker_state.tasks = filter_by_query(tracker_state.tasks, query.q.as_deref());
    Ok(ApiResponse::ok(tracker_state))
}

/// `POST /api/tracker/actions` + `{ "type": "delete_event", "id": "..." }`
pub async fn dispatch_action(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(action): AppJson<TrackerAction>,
) -> Result<ApiResponse<TrackerState>, AppError> {
    let next =
        tracker::dispatch(&state.kv, &state.tracker_locks, &user.user_id, action).await?;
    Ok(ApiResponse::ok(next))
}

pub async fn reset_tracker(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<TrackerState>, AppError> {
    tracker::reset(&state.kv, &state.tracker_locks, &user.user_id).await?;
    tracing::info!(user_id = %user.user_id, "Tracker state reset");
    Ok(ApiResponse::ok(TrackerState::default()))
}
