use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::double_option;
use crate::services::streak::StreakSummary;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Habit {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
}

/// 습관 + 체크 기록으로 계산한 연속 일수
#[derive(Debug, Clone, Serialize)]
pub struct HabitView {
    #[serde(flatten)]
    pub habit: Habit,
    pub streak: StreakSummary,
    pub checked_today: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateHabitRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateHabitRequest {
    pub name: Option<String>,
    /// 필드 없음 = 그대로, null = 설명 삭제
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

/// `POST|DELETE /api/habits/{id}/check?date=2026-03-10` — date가 없으면 오늘
#[derive(Debug, Default, Deserialize)]
pub struct CheckQuery {
    pub date: Option<NaiveDate>,
}
