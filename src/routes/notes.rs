//! # 노트 API 라우트 핸들러
//!
//! | 메서드 | 경로 | 설명 |
//! |--------|------|------|
//! | GET | /api/notes?q=&project_id= | 노트 목록 (검색어로 제목·본문 필터) |
//! | POST | /api/notes | 노트 생성 |
//! | GET/PATCH/DELETE | /api/notes/{id} | 조회 / 부분 수정 / 삭제 |

use axum::extract::{Path, State};

use crate::{
    db,
    error::{AppError, FieldErrors},
    extract::{AppJson, AppQuery},
    middleware::auth::AuthUser,
    models::*,
    response::{ApiResponse, Deleted},
    routes::AppState,
    services::filter::filter_by_query,
};

const MAX_TITLE_LEN: usize = 200;

fn validate_title(errors: &mut FieldErrors, title: &str) {
    let title = title.trim();
    if title.is_empty() {
        errors.add("title", "Title is required");
    } else if title.chars().count() > MAX_TITLE_LEN {
        errors.add("title", format!("Title must be at most {MAX_TITLE_LEN} characters"));
    }
}

/// 노트를 연결할 프로젝트가 내 것인지 확인합니다.
async fn ensure_project(state: &AppState, user: &AuthUser, project_id: &str) -> Result<(), AppError> {
    match db::get_project(&state.pool, project_id).await? {
        Some(project) => user.ensure_owns(&project.user_id),
        None => Err(AppError::invalid("project_id", "Project does not exist")),
    }
}

async fn load_owned_note(state: &AppState, user: &AuthUser, id: &str) -> Result<Note, AppError> {
    let note = db::get_note(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound)?;
    user.ensure_owns(&note.user_id)?;
    Ok(note)
}

pub async fn list_notes(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(query): AppQuery<ListNotesQuery>,
) -> Result<ApiResponse<Vec<Note>>, AppError> {
    let notes = db::list_notes(&state.pool, &user.user_id, query.project_id.as_deref()).await?;
    Ok(ApiResponse::ok(filter_by_query(notes, query.q.as_deref())))
}

pub async fn create_note(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<CreateNoteRequest>,
) -> Result<ApiResponse<Note>, AppError> {
    let mut errors = FieldErrors::new();
    validate_title(&mut errors, &req.title);
    errors.into_result()?;

    if let Some(project_id) = req.project_id.as_deref() {
        ensure_project(&state, &user, project_id).await?;
    }

    let note = db::create_note(&state.pool, &user.user_id, &req).await?;
    Ok(ApiResponse::created(note))
}

pub async fn get_note(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<Note>, AppError> {
    Ok(ApiResponse::ok(load_owned_note(&state, &user, &id).await?))
}

pub async fn update_note(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    AppJson(req): AppJson<UpdateNoteRequest>,
) -> Result<ApiResponse<Note>, AppError> {
    let mut errors = FieldErrors::new();
    if let Some(title) = req.title.as_deref() {
        validate_title(&mut errors, title);
    }
    errors.into_result()?;

    load_owned_note(&state, &user, &id).await?;
    if let Some(Some(project_id)) = req.project_id.as_ref() {
        ensure_project(&state, &user, project_id).await?;
    }

    let note = db::update_note(&state.pool, &id, &req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::ok(note))
}

pub async fn delete_note(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<Deleted>, AppError> {
    load_owned_note(&state, &user, &id).await?;
    if !db::delete_note(&state.pool, &id).await? {
        return Err(AppError::NotFound);
    }
    Ok(ApiResponse::ok(Deleted::new(id)))
}
