//! # 코딩 세션 데이터베이스 쿼리 모듈
//!
//! ## 세션 라이프사이클
//! ```text
//! create_session() → ACTIVE ⇄ PAUSED → update_status(COMPLETED | ABANDONED)
//!                      │
//!                      └─ update_running_duration(): 타이머가 1분마다 경과 시간 기록
//! ```
//!
//! 종료 상태가 된 세션의 `duration_seconds`는 다시 바뀌지 않도록
//! 경과 시간 갱신 쿼리에 `status IN ('ACTIVE', 'PAUSED')` 조건을 붙입니다.

use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::{CodingSession, SessionCheckpoint, SessionStatus};
use crate::services::timer::DurationSink;

const SESSION_COLUMNS: &str = "id, user_id, project_id, title, status, started_at, ended_at, \
                               duration_seconds, initial_health, checkpoint_elapsed";

/// 새 세션을 ACTIVE 상태로 시작합니다. `started_at`은 DB 기본값(현재 UTC)입니다.
pub async fn create_session(
    pool: &SqlitePool,
    user_id: &str,
    project_id: Option<&str>,
    title: Option<&str>,
    initial_health: i64,
) -> Result<CodingSession, AppError> {
    let id = uuid::Uuid::now_v7().to_string();

    sqlx::query(
        r#"
        INSERT INTO coding_sessions (id, user_id, project_id, title, initial_health)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(project_id)
    .bind(title)
    .bind(initial_health)
    .execute(pool)
    .await?;

    get_session(pool, &id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created session".to_string()))
}

pub async fn get_session(pool: &SqlitePool, id: &str) -> Result<Option<CodingSession>, AppError> {
    let session = sqlx::query_as::<_, CodingSession>(&format!(
        "SELECT {SESSION_COLUMNS} FROM coding_sessions WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(session)
}

/// 사용자의 세션을 최신순으로 조회합니다. `status`를 주면 그 상태만 돌려줍니다.
pub async fn list_sessions(
    pool: &SqlitePool,
    user_id: &str,
    status: Option<SessionStatus>,
) -> Result<Vec<CodingSession>, AppError> {
    let sessions = match status {
        Some(status) => {
            sqlx::query_as::<_, CodingSession>(&format!(
                "SELECT {SESSION_COLUMNS} FROM coding_sessions \
                 WHERE user_id = ? AND status = ? ORDER BY started_at DESC"
            ))
            .bind(user_id)
            .bind(status)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, CodingSession>(&format!(
                "SELECT {SESSION_COLUMNS} FROM coding_sessions \
                 WHERE user_id = ? ORDER BY started_at DESC"
            ))
            .bind(user_id)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(sessions)
}

/// 상태·종료 시각·경과 시간을 한 번에 기록합니다.
///
/// 전이가 허용되는지는 호출자가 `SessionStatus::transition`으로 먼저 확인합니다.
pub async fn update_status(
    pool: &SqlitePool,
    id: &str,
    status: SessionStatus,
    ended_at: Option<&str>,
    duration_seconds: i64,
) -> Result<Option<CodingSession>, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE coding_sessions
        SET status = ?, ended_at = ?, duration_seconds = ?
        WHERE id = ?
        "#,
    )
    .bind(status)
    .bind(ended_at)
    .bind(duration_seconds)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_session(pool, id).await
}

/// 진행 중/일시정지 세션의 경과 시간을 갱신합니다.
///
/// 종료된 세션이거나 없는 세션이면 `false`를 돌려줍니다.
pub async fn update_running_duration(
    pool: &SqlitePool,
    id: &str,
    duration_seconds: i64,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE coding_sessions
        SET duration_seconds = ?
        WHERE id = ? AND status IN ('ACTIVE', 'PAUSED')
        "#,
    )
    .bind(duration_seconds)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// 체크포인트를 남기고, 세션의 건강도 기준점(checkpoint_elapsed)을 옮깁니다.
///
/// 두 쓰기는 하나의 트랜잭션으로 묶습니다.
pub async fn create_checkpoint(
    pool: &SqlitePool,
    session_id: &str,
    note: &str,
    elapsed_seconds: i64,
) -> Result<SessionCheckpoint, AppError> {
    let id = uuid::Uuid::now_v7().to_string();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO session_checkpoints (id, session_id, note, elapsed_seconds)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(session_id)
    .bind(note)
    .bind(elapsed_seconds)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE coding_sessions
        SET checkpoint_elapsed = ?, duration_seconds = ?
        WHERE id = ?
        "#,
    )
    .bind(elapsed_seconds)
    .bind(elapsed_seconds)
    .bind(session_id)
    .execute(&mut *tx)
    .await?;

    let checkpoint = sqlx::query_as::<_, SessionCheckpoint>(
        r#"
        SELECT id, session_id, note, elapsed_seconds, created_at
        FROM session_checkpoints
        WHERE id = ?
        "#,
    )
    .bind(&id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(checkpoint)
}

/// 세션의 체크포인트를 오래된 순으로 조회합니다.
pub async fn list_checkpoints(
    pool: &SqlitePool,
    session_id: &str,
) -> Result<Vec<SessionCheckpoint>, AppError> {
    let checkpoints = sqlx::query_as::<_, SessionCheckpoint>(
        r#"
        SELECT id, session_id, note, elapsed_seconds, created_at
        FROM session_checkpoints
        WHERE session_id = ?
        ORDER BY elapsed_seconds, created_at
        "#,
    )
    .bind(session_id)
    .fetch_all(pool)
    .await?;

    Ok(checkpoints)
}

/// 세션 타이머가 경과 시간을 DB에 기록할 때 쓰는 sink
#[derive(Clone)]
pub struct DbDurationSink {
    pool: SqlitePool,
}

impl DbDurationSink {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl DurationSink for DbDurationSink {
    async fn persist(&self, session_id: &str, elapsed_seconds: i64) -> Result<(), AppError> {
        if !update_running_duration(&self.pool, session_id, elapsed_seconds).await? {
            tracing::debug!(session_id, "Skipped duration sync for finished session");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn create_and_finish_session() {
        let pool = test_pool().await;
        let session = create_session(&pool, "u1", None, Some("Refactor parser"), 100)
            .await
            .unwrap();
        assert_eq!(session.status, SessionStatus::Active);
        assert_eq!(session.duration_seconds, 0);
        assert!(session.ended_at.is_none());

        let done = update_status(
            &pool,
            &session.id,
            SessionStatus::Completed,
            Some("2030-01-01T00:00:00.000Z"),
            900,
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(done.status, SessionStatus::Completed);
        assert_eq!(done.duration_seconds, 900);

        // 종료된 세션의 경과 시간은 타이머가 덮어쓰지 못합니다.
        assert!(!update_running_duration(&pool, &session.id, 5).await.unwrap());
        let reloaded = get_session(&pool, &session.id).await.unwrap().unwrap();
        assert_eq!(reloaded.duration_seconds, 900);
    }

    #[tokio::test]
    async fn list_filters_by_status_and_user() {
        let pool = test_pool().await;
        let a = create_session(&pool, "u1", None, None, 100).await.unwrap();
        create_session(&pool, "u1", None, None, 100).await.unwrap();
        create_session(&pool, "u2", None, None, 100).await.unwrap();
        update_status(&pool, &a.id, SessionStatus::Paused, None, 30)
            .await
            .unwrap();

        assert_eq!(list_sessions(&pool, "u1", None).await.unwrap().len(), 2);
        let paused = list_sessions(&pool, "u1", Some(SessionStatus::Paused))
            .await
            .unwrap();
        assert_eq!(paused.len(), 1);
        assert_eq!(paused[0].id, a.id);
    }

    #[tokio::test]
    async fn checkpoint_moves_health_baseline() {
        let pool = test_pool().await;
        let session = create_session(&pool, "u1", None, None, 100).await.unwrap();

        let cp = create_checkpoint(&pool, &session.id, "Tests green", 4000)
            .await
            .unwrap();
        assert_eq!(cp.elapsed_seconds, 4000);

        let reloaded = get_session(&pool, &session.id).await.unwrap().unwrap();
        assert_eq!(reloaded.checkpoint_elapsed, 4000);
        assert_eq!(reloaded.duration_seconds, 4000);
        assert_eq!(list_checkpoints(&pool, &session.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duration_sink_writes_running_sessions() {
        let pool = test_pool().await;
        let session = create_session(&pool, "u1", None, None, 100).await.unwrap();

        let sink = DbDurationSink::new(pool.clone());
        sink.persist(&session.id, 60).await.unwrap();
        sink.persist("missing", 60).await.unwrap();

        let reloaded = get_session(&pool, &session.id).await.unwrap().unwrap();
        assert_eq!(reloaded.duration_seconds, 60);
    }
}
