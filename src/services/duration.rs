//! # 세션 시간 계산
//!
//! 코딩 세션의 표시용 시간과 "컨텍스트 건강도"를 계산하는 순수 함수들입니다.
//!
//! - 종료된 세션: `ended_at - started_at` (저장된 duration_seconds가 오래됐어도 무시)
//! - 진행 중/일시정지 세션: 외부에서 누적한 `duration_seconds`
//! - 건강도: 경과 1시간마다 10점씩 감소, 0~100 범위로 제한

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::AppError;

const SECONDS_PER_HOUR: i64 = 3600;
const SECONDS_PER_MINUTE: i64 = 60;
/// 한 시간마다 깎이는 건강도
const HEALTH_DECAY_PER_HOUR: i64 = 10;

/// 세션의 표시용 시간(초)을 계산합니다.
///
/// 시계가 뒤로 간 경우 등 음수가 나오면 0으로 맞춥니다.
pub fn session_duration(
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    duration_seconds: i64,
) -> i64 {
    match ended_at {
        Some(ended) => (ended - started_at).num_seconds().max(0),
        None => duration_seconds.max(0),
    }
}

/// 초 단위 시간을 `"1h 2m"` 또는 `"2m"` 형태로 바꿉니다.
///
/// ```text
/// 125  → "2m"
/// 3725 → "1h 2m"
/// ```
pub fn format_duration(total_seconds: i64) -> String {
    let total_seconds = total_seconds.max(0);
    let hours = total_seconds / SECONDS_PER_HOUR;
    let minutes = (total_seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// 컨텍스트 건강도 = clamp(initial - floor(elapsed / 3600 * 10), 0, 100)
///
/// 정수 나눗셈 `elapsed * 10 / 3600`은 음수가 아닌 값에서 floor와 같습니다.
pub fn context_health(initial_health: i64, elapsed_seconds: i64) -> i64 {
    let elapsed = elapsed_seconds.max(0);
    let decay = elapsed.saturating_mul(HEALTH_DECAY_PER_HOUR) / SECONDS_PER_HOUR;
    initial_health.saturating_sub(decay).clamp(0, 100)
}

/// DB에 저장된 ISO-8601 문자열을 UTC 시각으로 파싱합니다.
///
/// SQLite의 `strftime('%Y-%m-%dT%H:%M:%fZ', 'now')` 결과(밀리초 포함)를 읽습니다.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Internal(format!("Invalid timestamp '{}': {}", value, e)))
}

/// UTC 시각을 DB 저장 형식(밀리초, `Z` 접미사)으로 바꿉니다.
pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(s: &str) -> DateTime<Utc> {
        parse_timestamp(s).unwrap()
    }

    #[test]
    fn ended_session_ignores_stale_counter() {
        let start = at("2026-03-10T09:00:00.000Z");
        let end = start + Duration::seconds(5400);
        assert_eq!(session_duration(start, Some(end), 42), 5400);
    }

    #[test]
    fn running_session_uses_counter() {
        let start = at("2026-03-10T09:00:00.000Z");
        assert_eq!(session_duration(start, None, 725), 725);
    }

    #[test]
    fn end_before_start_clamps_to_zero() {
        let start = at("2026-03-10T09:00:00.000Z");
        let end = start - Duration::seconds(30);
        assert_eq!(session_duration(start, Some(end), 0), 0);
    }

    #[test]
    fn formats_minutes_only() {
        assert_eq!(format_duration(125), "2m");
        assert_eq!(format_duration(0), "0m");
        assert_eq!(format_duration(59), "0m");
    }

    #[test]
    fn formats_hours_and_minutes() {
        assert_eq!(format_duration(3725), "1h 2m");
        assert_eq!(format_duration(3600), "1h 0m");
        assert_eq!(format_duration(36000 + 59 * 60), "10h 59m");
    }

    #[test]
    fn health_drops_ten_points_per_hour() {
        assert_eq!(context_health(100, 0), 100);
        assert_eq!(context_health(100, 3599), 100);
        assert_eq!(context_health(100, 3600), 90);
        assert_eq!(context_health(100, 5400), 85);
    }

    #[test]
    fn health_is_clamped() {
        assert_eq!(context_health(100, 36000), 0);
        assert_eq!(context_health(100, 360_000), 0);
        assert_eq!(context_health(150, 0), 100);
        assert_eq!(context_health(100, -50), 100);
    }

    #[test]
    fn timestamp_roundtrips_sqlite_format() {
        let parsed = at("2026-02-16T12:00:00.123Z");
        assert_eq!(format_timestamp(parsed), "2026-02-16T12:00:00.123Z");
    }

    #[test]
    fn bad_timestamp_is_internal_error() {
        assert!(matches!(parse_timestamp("yesterday"), Err(AppError::Internal(_))));
    }
}
