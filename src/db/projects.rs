//! # 프로젝트 쿼리
//!
//! 프로젝트를 삭제하면 스키마의 `ON DELETE SET NULL`에 의해
//! 연결된 노트와 세션의 `project_id`만 NULL이 됩니다.
//!
//! slug 중복은 `UNIQUE (user_id, slug)` 제약이 판정하고, 위반은 `AppError::Conflict`가 됩니다.

use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::Project;

const PROJECT_COLUMNS: &str =
    "id, user_id, name, slug, description, last_activity_at, created_at, updated_at";

fn slug_conflict(e: sqlx::Error, slug: &str) -> AppError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(format!("A project with slug '{slug}' already exists"))
        }
        _ => AppError::Database(e),
    }
}

pub async fn create_project(
    pool: &SqlitePool,
    user_id: &str,
    name: &str,
    slug: &str,
    description: Option<&str>,
) -> Result<Project, AppError> {
    let id = uuid::Uuid::now_v7().to_string();

    sqlx::query(
        r#"
        INSERT INTO projects (id, user_id, name, slug, description)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(name)
    .bind(slug)
    .bind(description)
    .execute(pool)
    .await
    .map_err(|e| slug_conflict(e, slug))?;

    get_project(pool, &id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created project".to_string()))
}

pub async fn get_project(pool: &SqlitePool, id: &str) -> Result<Option<Project>, AppError> {
    let project = sqlx::query_as::<_, Project>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(project)
}

/// 최근 활동 순 (활동 기록이 없는 프로젝트는 마지막)
pub async fn list_projects(pool: &SqlitePool, user_id: &str) -> Result<Vec<Project>, AppError> {
    let projects = sqlx::query_as::<_, Project>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE user_id = ? \
         ORDER BY last_activity_at IS NULL, last_activity_at DESC, name"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(projects)
}

pub async fn update_project(
    pool: &SqlitePool,
    id: &str,
    name: &str,
    slug: &str,
    description: Option<&str>,
) -> Result<Option<Project>, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE projects
        SET name = ?, slug = ?, description = ?,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ?
        "#,
    )
    .bind(name)
    .bind(slug)
    .bind(description)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| slug_conflict(e, slug))?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_project(pool, id).await
}

/// 마지막 활동 시각을 지금으로 갱신합니다 (세션 시작, 출시 기록 시 호출).
pub async fn touch_project_activity(pool: &SqlitePool, id: &str) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE projects SET last_activity_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?",
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn delete_project(pool: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
