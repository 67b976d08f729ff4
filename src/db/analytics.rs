//! # 출시 기록 쿼리
//!
//! `(user_id, date)`가 기본키이므로 하루에 한 행만 존재합니다.
//! 출시할 때마다 `ON CONFLICT ... DO UPDATE`로 그날 행의 수만 늘립니다.

use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::AnalyticsRecord;

/// 그날 출시 수를 `count`만큼 늘리고, 갱신된 행을 돌려줍니다.
pub async fn record_ship(
    pool: &SqlitePool,
    user_id: &str,
    date: &str,
    count: i64,
) -> Result<AnalyticsRecord, AppError> {
    let record = sqlx::query_as::<_, AnalyticsRecord>(
        r#"
        INSERT INTO analytics_records (user_id, date, ship_count)
        VALUES (?, ?, ?)
        ON CONFLICT(user_id, date) DO UPDATE
        SET ship_count = ship_count + excluded.ship_count
        RETURNING user_id, date, ship_count
        "#,
    )
    .bind(user_id)
    .bind(date)
    .bind(count)
    .fetch_one(pool)
    .await?;

    Ok(record)
}

/// 사용자의 모든 기록을 최신 날짜부터 조회합니다 (연속 출시 계산용).
pub async fn list_records(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<AnalyticsRecord>, AppError> {
    let records = sqlx::query_as::<_, AnalyticsRecord>(
        r#"
        SELECT user_id, date, ship_count
        FROM analytics_records
        WHERE user_id = ?
        ORDER BY date DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(records)
}

/// `since`(포함) 이후 기록만 최신순으로 조회합니다.
pub async fn list_records_since(
    pool: &SqlitePool,
    user_id: &str,
    since: &str,
) -> Result<Vec<AnalyticsRecord>, AppError> {
    let records = sqlx::query_as::<_, AnalyticsRecord>(
        r#"
        SELECT user_id, date, ship_count
        FROM analytics_records
        WHERE user_id = ? AND date >= ?
        ORDER BY date DESC
        "#,
    )
    .bind(user_id)
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(records)
}
