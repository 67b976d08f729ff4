//! # 출시(ship) 분석 모델
//!
//! 사용자별·날짜별로 하루 한 행만 존재합니다 (`PRIMARY KEY (user_id, date)`).
//! 그날 첫 출시 때 만들어지고, 이후 출시마다 `ship_count`가 늘어납니다.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::services::streak::ShipDay;

/// `analytics_records` 테이블 한 행
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AnalyticsRecord {
    #[serde(skip_serializing)]
    pub user_id: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub ship_count: i64,
}

impl AnalyticsRecord {
    pub fn to_ship_day(&self) -> Result<ShipDay, AppError> {
        let date = parse_date(&self.date)?;
        // 음수는 출시 없음, u32 범위를 넘는 값은 상한으로 맞춥니다.
        let ship_count = u32::try_from(self.ship_count.max(0)).unwrap_or(u32::MAX);
        Ok(ShipDay::new(date, ship_count))
    }
}

/// DB의 `YYYY-MM-DD` 문자열을 날짜로 파싱합니다.
pub fn parse_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| AppError::Internal(format!("Invalid date '{}': {}", value, e)))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `POST /api/analytics/ship`
#[derive(Debug, Default, Deserialize)]
pub struct ShipRequest {
    /// 한 번에 기록할 출시 수 (기본 1)
    pub count: Option<i64>,
    /// 지정하면 해당 프로젝트의 마지막 활동 시각도 갱신합니다.
    pub project_id: Option<String>,
}

/// `GET /api/analytics/daily?days=30`
#[derive(Debug, Default, Deserialize)]
pub struct DailyQuery {
    pub days: Option<i64>,
}
