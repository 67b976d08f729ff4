//! # 프로젝트 API 라우트 핸들러
//!
//! | 메서드 | 경로 | 설명 |
//! |--------|------|------|
//! | GET | /api/projects | 내 프로젝트 목록 (모멘텀 포함) |
//! | POST | /api/projects | 프로젝트 생성 — 이름으로 slug 생성, 중복이면 409 |
//! | GET | /api/projects/{id} | 프로젝트 조회 |
//! | PATCH | /api/projects/{id} | 이름/설명 변경 |
//! | DELETE | /api/projects/{id} | 삭제 (노트·세션은 연결만 끊김) |

use axum::extract::{Path, State};
use chrono::Utc;

use crate::{
    db,
    error::{AppError, FieldErrors},
    extract::AppJson,
    middleware::auth::AuthUser,
    models::*,
    response::{ApiResponse, Deleted},
    routes::AppState,
    services::{duration::parse_timestamp, momentum::Momentum},
};

const MAX_NAME_LEN: usize = 100;

fn project_view(project: Project) -> Result<ProjectView, AppError> {
    let last_activity = project
        .last_activity_at
        .as_deref()
        .map(parse_timestamp)
        .transpose()?;
    Ok(ProjectView {
        momentum: Momentum::from_last_activity(last_activity, Utc::now()),
        project,
    })
}

/// 이름을 검증하고 (정리된 이름, slug)를 돌려줍니다.
fn validate_name(name: &str) -> Result<(String, String), AppError> {
    let name = name.trim();
    let mut errors = FieldErrors::new();
    if name.is_empty() {
        errors.add("name", "Name is required");
    } else if name.chars().count() > MAX_NAME_LEN {
        errors.add("name", format!("Name must be at most {MAX_NAME_LEN} characters"));
    }

    // slug::slugify: "My Project!" → "my-project"
    let slug = slug::slugify(name);
    if !name.is_empty() && slug.is_empty() {
        errors.add("name", "Name must contain letters or digits");
    }
    errors.into_result()?;

    Ok((name.to_string(), slug))
}

async fn load_owned_project(
    state: &AppState,
    user: &AuthUser,
    id: &str,
) -> Result<Project, AppError> {
    let project = db::get_project(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound)?;
    user.ensure_owns(&project.user_id)?;
    Ok(project)
}

pub async fn list_projects(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<Vec<ProjectView>>, AppError> {
    let projects = db::list_projects(&state.pool, &user.user_id).await?;
    let views = projects
        .into_iter()
        .map(project_view)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ApiResponse::ok(views))
}

pub async fn create_project(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<CreateProjectRequest>,
) -> Result<ApiResponse<ProjectView>, AppError> {
    let (name, slug) = validate_name(&req.name)?;

    // 중복 slug는 DB 제약이 409로 바꿔 줍니다.
    let project = db::create_project(
        &state.pool,
        &user.user_id,
        &name,
        &slug,
        req.description.as_deref(),
    )
    .await?;
    tracing::info!(project_id = %project.id, slug = %project.slug, "Project created");

    Ok(ApiResponse::created(project_view(project)?))
}

pub async fn get_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<ProjectView>, AppError> {
    let project = load_owned_project(&state, &user, &id).await?;
    Ok(ApiResponse::ok(project_view(project)?))
}

/// 이름이 바뀌면 slug도 다시 만들고, 다른 프로젝트와 겹치면 409입니다.
pub async fn update_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    AppJson(req): AppJson<UpdateProjectRequest>,
) -> Result<ApiResponse<ProjectView>, AppError> {
    let project = load_owned_project(&state, &user, &id).await?;

    let (name, slug) = match req.name.as_deref() {
        Some(name) => validate_name(name)?,
        None => (project.name.clone(), project.slug.clone()),
    };

    let description = match req.description {
        Some(d) => d,
        None => project.description.clone(),
    };

    let updated = db::update_project(&state.pool, &id, &name, &slug, description.as_deref())
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::ok(project_view(updated)?))
}

pub async fn delete_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<Deleted>, AppError> {
    load_owned_project(&state, &user, &id).await?;
    if !db::delete_project(&state.pool, &id).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!(project_id = %id, "Project deleted");
    Ok(ApiResponse::ok(Deleted::new(id)))
}
