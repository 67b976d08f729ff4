//! # 헬스체크(Health Check) 핸들러
//!
//! ## 엔드포인트
//! - `GET /api/health` → `{ "success": true, "data": { "status": "ok", "running_timers": 0 } }`
//!
//! 로드밸런서나 컨테이너 헬스체크용이므로 인증이 필요 없습니다.

use axum::extract::State;
use serde_json::{json, Value};

use crate::response::ApiResponse;
use crate::routes::AppState;

/// `GET /health` — 서버 상태와 실행 중인 세션 타이머 수를 돌려줍니다.
pub async fn health_check(State(state): State<AppState>) -> ApiResponse<Value> {
    ApiResponse::ok(json!({
        "status": "ok",
        "running_timers": state.timers.running_count(),
    }))
}
