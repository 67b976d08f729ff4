//! # 코딩 세션 API 라우트 핸들러
//!
//! ## 엔드포인트 목록
//! | 메서드 | 경로 | 핸들러 | 설명 |
//! |--------|------|--------|------|
//! | GET | /api/sessions | `list_sessions` | 내 세션 목록 (`?status=`) |
//! | POST | /api/sessions | `start_session` | 새 세션 시작 |
//! | GET | /api/sessions/{id} | `get_session` | 세션 조회 (시간, 건강도 포함) |
//! | PATCH | /api/sessions/{id} | `update_session` | pause / resume / complete / abandon |
//! | PUT | /api/sessions/{id}/duration | `sync_duration` | 외부에서 센 경과 시간 기록 |
//! | GET | /api/sessions/{id}/checkpoints | `list_checkpoints` | 체크포인트 목록 |
//! | POST | /api/sessions/{id}/checkpoints | `create_checkpoint` | 체크포인트 추가 |
//!
//! ## 세션 타이머
//! ```text
//! start_session ─▶ timers.start()      (ACTIVE)
//! pause         ─▶ timers.stop().await → 경과 시간 저장 (PAUSED)
//! resume        ─▶ timers.start(저장된 경과 시간부터) (ACTIVE)
//! complete/abandon ─▶ timers.stop(), duration = ended_at - started_at
//! ```

use axum::extract::{Path, State};
use chrono::Utc;

use crate::{
    config::MAX_CONTEXT_HEALTH,
    db,
    error::{AppError, FieldErrors},
    extract::{AppJson, AppQuery},
    middleware::auth::AuthUser,
    models::*,
    response::ApiResponse,
    routes::AppState,
    services::duration::{
        context_health, format_duration, format_timestamp, parse_timestamp, session_duration,
    },
};

const MAX_TITLE_LEN: usize = 200;
const MAX_NOTE_LEN: usize = 1000;

/// 세션을 불러오고 소유자를 확인합니다. 없으면 404, 남의 세션이면 403.
async fn load_owned_session(
    state: &AppState,
    user: &AuthUser,
    id: &str,
) -> Result<CodingSession, AppError> {
    let session = db::get_session(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound)?;
    user.ensure_owns(&session.user_id)?;
    Ok(session)
}

/// 저장된 세션에 표시용 값(경과 시간, 포맷, 건강도)을 붙입니다.
///
/// 실행 중인 타이머가 있으면 DB 값보다 타이머 값이 최신입니다.
fn session_view(state: &AppState, session: CodingSession) -> Result<SessionView, AppError> {
    let live = state.timers.elapsed(&session.id);
    let started = parse_timestamp(&session.started_at)?;
    let ended = session
        .ended_at
        .as_deref()
        .map(parse_timestamp)
        .transpose()?;

    let elapsed = session_duration(started, ended, live.unwrap_or(session.duration_seconds));
    let health = context_health(
        session.initial_health,
        elapsed - session.checkpoint_elapsed,
    );

    Ok(SessionView {
        elapsed_seconds: elapsed,
        formatted_duration: format_duration(elapsed),
        context_health: health,
        timer_running: live.is_some(),
        session,
    })
}

/// `GET /api/sessions?status=ACTIVE`
pub async fn list_sessions(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(query): AppQuery<ListSessionsQuery>,
) -> Result<ApiResponse<Vec<SessionView>>, AppError> {
    let sessions = db::list_sessions(&state.pool, &user.user_id, query.status).await?;
    let views = sessions
        .into_iter()
        .map(|s| session_view(&state, s))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ApiResponse::ok(views))
}

/// `POST /api/sessions` + `{ "title": "Refactor parser", "project_id": "..." }`
///
/// 세션을 ACTIVE로 만들고 바로 타이머를 시작합니다.
/// 프로젝트를 지정하면 그 프로젝트의 마지막 활동 시각도 갱신합니다.
pub async fn start_session(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<StartSessionRequest>,
) -> Result<ApiResponse<SessionView>, AppError> {
    let title = req
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let mut errors = FieldErrors::new();
    if title.is_some_and(|t| t.chars().count() > MAX_TITLE_LEN) {
        errors.add("title", format!("Title must be at most {MAX_TITLE_LEN} characters"));
    }
    if req
        .initial_health
        .is_some_and(|h| !(0..=MAX_CONTEXT_HEALTH).contains(&h))
    {
        errors.add("initial_health", "Initial health must be between 0 and 100");
    }
    errors.into_result()?;

    if let Some(project_id) = req.project_id.as_deref() {
        let project = db::get_project(&state.pool, project_id)
            .await?
            .ok_or(AppError::NotFound)?;
        user.ensure_owns(&project.user_id)?;
    }

    let session = db::create_session(
        &state.pool,
        &user.user_id,
        req.project_id.as_deref(),
        title,
        req.initial_health.unwrap_or(state.initial_context_health),
    )
    .await?;

    if let Some(project_id) = req.project_id.as_deref() {
        db::touch_project_activity(&state.pool, project_id).await?;
    }

    state.timers.start(
        &session.id,
        0,
        state.sync_every_ticks,
        state.duration_sink.clone(),
    );
    tracing::info!(session_id = %session.id, user_id = %user.user_id, "Coding session started");

    Ok(ApiResponse::created(session_view(&state, session)?))
}

/// `GET /api/sessions/{id}`
pub async fn get_session(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<SessionView>, AppError> {
    let session = load_owned_session(&state, &user, &id).await?;
    Ok(ApiResponse::ok(session_view(&state, session)?))
}

/// `PATCH /api/sessions/{id}` + `{ "action": "pause" }`
///
/// 허용되지 않는 전이(종료된 세션 재개 등)는 409를 돌려줍니다.
pub async fn update_session(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    AppJson(req): AppJson<UpdateSessionRequest>,
) -> Result<ApiResponse<SessionView>, AppError> {
    if req.duration_seconds.is_some_and(|d| d < 0) {
        return Err(AppError::invalid(
            "duration_seconds",
            "Duration must not be negative",
        ));
    }

    let session = load_owned_session(&state, &user, &id).await?;
    let next = session.status.transition(req.action.target())?;

    let updated = match req.action {
        SessionAction::Pause => {
            let elapsed = state
                .timers
                .stop(&id)
                .await
                .or(req.duration_seconds)
                .unwrap_or(session.duration_seconds);
            db::update_status(&state.pool, &id, next, None, elapsed).await?
        }
        SessionAction::Resume => {
            let elapsed = req.duration_seconds.unwrap_or(session.duration_seconds);
            let updated = db::update_status(&state.pool, &id, next, None, elapsed).await?;
            state
                .timers
                .start(&id, elapsed, state.sync_every_ticks, state.duration_sink.clone());
            updated
        }
        SessionAction::Complete | SessionAction::Abandon => {
            state.timers.stop(&id).await;
            let started = parse_timestamp(&session.started_at)?;
            let ended = match session.ended_at.as_deref() {
                Some(ended) => parse_timestamp(ended)?,
                None => Utc::now(),
            };
            let duration = session_duration(started, Some(ended), session.duration_seconds);
            db::update_status(
                &state.pool,
                &id,
                next,
                Some(&format_timestamp(ended)),
                duration,
            )
            .await?
        }
    };

    let updated = updated.ok_or(AppError::NotFound)?;
    tracing::info!(session_id = %id, status = next.as_str(), "Session status changed");
    Ok(ApiResponse::ok(session_view(&state, updated)?))
}

/// `PUT /api/sessions/{id}/duration` + `{ "duration_seconds": 1800 }`
///
/// 클라이언트가 따로 센 경과 시간을 기록합니다. 실행 중인 타이머는 그 값부터 다시 셉니다.
pub async fn sync_duration(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    AppJson(req): AppJson<SyncDurationRequest>,
) -> Result<ApiResponse<SessionView>, AppError> {
    if req.duration_seconds < 0 {
        return Err(AppError::invalid(
            "duration_seconds",
            "Duration must not be negative",
        ));
    }

    let session = load_owned_session(&state, &user, &id).await?;
    if session.status.is_terminal() {
        return Err(AppError::Conflict(format!(
            "Session is already {}",
            session.status.as_str()
        )));
    }

    // 실행 중인 타이머의 동기화가 이 값을 덮지 않도록 먼저 멈춥니다.
    let was_running = state.timers.stop(&id).await.is_some();
    db::update_running_duration(&state.pool, &id, req.duration_seconds).await?;
    if was_running {
        state.timers.start(
            &id,
            req.duration_seconds,
            state.sync_every_ticks,
            state.duration_sink.clone(),
        );
    }

    let session = db::get_session(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::ok(session_view(&state, session)?))
}

/// `GET /api/sessions/{id}/checkpoints`
pub async fn list_checkpoints(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<Vec<SessionCheckpoint>>, AppError> {
    load_owned_session(&state, &user, &id).await?;
    let checkpoints = db::list_checkpoints(&state.pool, &id).await?;
    Ok(ApiResponse::ok(checkpoints))
}

/// `POST /api/sessions/{id}/checkpoints` + `{ "note": "Tests green" }`
///
/// 체크포인트 시점부터 컨텍스트 건강도를 다시 계산합니다.
pub async fn create_checkpoint(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    AppJson(req): AppJson<CreateCheckpointRequest>,
) -> Result<ApiResponse<SessionCheckpoint>, AppError> {
    let note = req.note.trim();
    let mut errors = FieldErrors::new();
    if note.is_empty() {
        errors.add("note", "Note is required");
    } else if note.chars().count() > MAX_NOTE_LEN {
        errors.add("note", format!("Note must be at most {MAX_NOTE_LEN} characters"));
    }
    errors.into_result()?;

    let session = load_owned_session(&state, &user, &id).await?;
    if session.status.is_terminal() {
        return Err(AppError::Conflict(format!(
            "Session is already {}",
            session.status.as_str()
        )));
    }

    let elapsed = state
        .timers
        .elapsed(&id)
        .unwrap_or(session.duration_seconds);
    let checkpoint = db::create_checkpoint(&state.pool, &id, note, elapsed).await?;
    Ok(ApiResponse::created(checkpoint))
}
