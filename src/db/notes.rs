//! # 노트 쿼리
//!
//! 고정(pinned) 노트가 먼저, 그다음 최근 수정 순으로 정렬합니다.

use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::{CreateNoteRequest, Note, UpdateNoteRequest};

const NOTE_COLUMNS: &str = "id, user_id, project_id, title, content, pinned, created_at, updated_at";

pub async fn create_note(
    pool: &SqlitePool,
    user_id: &str,
    req: &CreateNoteRequest,
) -> Result<Note, AppError> {
    let id = uuid::Uuid::now_v7().to_string();

    sqlx::query(
        r#"
        INSERT INTO notes (id, user_id, project_id, title, content, pinned)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(&req.project_id)
    .bind(req.title.trim())
    .bind(&req.content)
    .bind(req.pinned)
    .execute(pool)
    .await?;

    get_note(pool, &id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created note".to_string()))
}

pub async fn get_note(pool: &SqlitePool, id: &str) -> Result<Option<Note>, AppError> {
    let note = sqlx::query_as::<_, Note>(&format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(note)
}

/// 사용자의 노트를 조회합니다. `project_id`를 주면 그 프로젝트의 노트만.
pub async fn list_notes(
    pool: &SqlitePool,
    user_id: &str,
    project_id: Option<&str>,
) -> Result<Vec<Note>, AppError> {
    let notes = if let Some(pid) = project_id {
        sqlx::query_as::<_, Note>(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE user_id = ? AND project_id = ? \
             ORDER BY pinned DESC, updated_at DESC"
        ))
        .bind(user_id)
        .bind(pid)
        .fetch_all(pool)
        .await?
    } else {
        sqlx::query_as::<_, Note>(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE user_id = ? \
             ORDER BY pinned DESC, updated_at DESC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?
    };

    Ok(notes)
}

/// 부분 업데이트 — 기존 값에 요청 필드를 덮어쓴 뒤 한 번에 저장합니다.
pub async fn update_note(
    pool: &SqlitePool,
    id: &str,
    req: &UpdateNoteRequest,
) -> Result<Option<Note>, AppError> {
    let Some(note) = get_note(pool, id).await? else {
        return Ok(None);
    };

    let title = req.title.as_deref().map(str::trim).unwrap_or(&note.title);
    let content = req.content.as_deref().unwrap_or(&note.content);
    let pinned = req.pinned.unwrap_or(note.pinned);
    let project_id = match &req.project_id {
        Some(p) => p.clone(),
        None => note.project_id.clone(),
    };

    sqlx::query(
        r#"
        UPDATE notes
        SET title = ?, content = ?, pinned = ?, project_id = ?,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ?
        "#,
    )
    .bind(title)
    .bind(content)
    .bind(pinned)
    .bind(project_id)
    .bind(id)
    .execute(pool)
    .await?;

    get_note(pool, id).await
}

pub async fn delete_note(pool: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM notes WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
