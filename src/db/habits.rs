use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::{CreateHabitRequest, Habit, UpdateHabitRequest};

pub async fn create_habit(
    pool: &SqlitePool,
    user_id: &str,
    req: &CreateHabitRequest,
) -> Result<Habit, AppError> {
    let id = uuid::Uuid::now_v7().to_string();

    sqlx::query("INSERT INTO habits (id, user_id, name, description) VALUES (?, ?, ?, ?)")
        .bind(&id)
        .bind(user_id)
        .bind(req.name.trim())
        .bind(&req.description)
        .execute(pool)
        .await?;

    get_habit(pool, &id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created habit".to_string()))
}

pub async fn get_habit(pool: &SqlitePool, id: &str) -> Result<Option<Habit>, AppError> {
    let habit = sqlx::query_as::<_, Habit>(
        "SELECT id, user_id, name, description, created_at FROM habits WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(habit)
}

pub async fn list_habits(pool: &SqlitePool, user_id: &str) -> Result<Vec<Habit>, AppError> {
    let habits = sqlx::query_as::<_, Habit>(
        r#"
        SELECT id, user_id, name, description, created_at
        FROM habits
        WHERE user_id = ?
        ORDER BY created_at
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(habits)
}

pub async fn update_habit(
    pool: &SqlitePool,
    id: &str,
    req: &UpdateHabitRequest,
) -> Result<Option<Habit>, AppError> {
    let Some(habit) = get_habit(pool, id).await? else {
        return Ok(None);
    };

    let name = req
        .name
        .as_deref()
        .map(str::trim)
        .unwrap_or(&habit.name)
        .to_string();
    let description = match &req.description {
        Some(d) => d.clone(),
        None => habit.description.clone(),
    };

    sqlx::query("UPDATE habits SET name = ?, description = ? WHERE id = ?")
        .bind(&name)
        .bind(&description)
        .bind(id)
        .execute(pool)
        .await?;

    get_habit(pool, id).await
}

/// 습관을 삭제합니다. 체크 기록은 `ON DELETE CASCADE`로 함께 지워집니다.
pub async fn delete_habit(pool: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM habits WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// 체크 기록을 추가합니다. 이미 체크된 날이면 `false`.
pub async fn check_habit(pool: &SqlitePool, habit_id: &str, date: &str) -> Result<bool, AppError> {
    let result = sqlx::query("INSERT OR IGNORE INTO habit_logs (habit_id, date) VALUES (?, ?)")
        .bind(habit_id)
        .bind(date)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn uncheck_habit(
    pool: &SqlitePool,
    habit_id: &str,
    date: &str,
) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM habit_logs WHERE habit_id = ? AND date = ?")
        .bind(habit_id)
        .bind(date)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// 체크한 날짜들을 최신순으로 (`YYYY-MM-DD`)
pub async fn list_habit_dates(pool: &SqlitePool, habit_id: &str) -> Result<Vec<String>, AppError> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT date FROM habit_logs WHERE habit_id = ? ORDER BY date DESC")
            .bind(habit_id)
            .fetch_all(pool)
            .await?;

    Ok(rows.into_iter().map(|(date,)| date).collect())
}
