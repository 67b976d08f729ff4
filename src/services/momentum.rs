//! # 프로젝트 모멘텀
//!
//! 마지막 활동 시각으로 프로젝트의 "온도"를 HOT / ACTIVE / QUIET 중 하나로 분류합니다.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Momentum {
    /// 24시간 이내 활동
    Hot,
    /// 7일 이내 활동
    Active,
    /// 그보다 오래됐거나 활동 기록 없음
    Quiet,
}

impl Momentum {
    pub fn from_last_activity(last_activity: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        let Some(last) = last_activity else {
            return Momentum::Quiet;
        };
        let since = now - last;
        if since <= Duration::hours(24) {
            Momentum::Hot
        } else if since <= Duration::days(7) {
            Momentum::Active
        } else {
            Momentum::Quiet
        }
    }
}
