//! # 연속 출시일(Streak) 계산
//!
//! 하루 단위 출시(ship) 기록으로부터 다음 세 값을 계산합니다.
//! - `current_streak`: 오늘부터 거꾸로 끊기지 않고 이어진 일수
//! - `longest_streak`: 기록 전체에서 가장 길었던 연속 일수
//! - `last_ship_date`: 마지막으로 출시한 날짜
//!
//! ## 규칙
//! - 출시 수가 0인 날은 "빈 날"과 같게 취급합니다 (연속이 끊김).
//! - 현재 연속은 반드시 `today`에서 시작합니다. 오늘 기록이 없으면 0입니다.
//! - 입력 순서는 상관없습니다. 내부에서 복사본을 정렬해서 계산합니다.
//!
//! 습관(habit) 체크 기록도 "체크한 날 = 출시 1회"로 바꿔서 같은 함수로 계산합니다.

use chrono::{Days, NaiveDate};
use serde::Serialize;

/// 하루치 출시 기록
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipDay {
    pub date: NaiveDate,
    pub ship_count: u32,
}

impl ShipDay {
    pub fn new(date: NaiveDate, ship_count: u32) -> Self {
        Self { date, ship_count }
    }

    fn shipped(&self) -> bool {
        self.ship_count > 0
    }
}

/// 연속 출시 계산 결과 — `GET /api/analytics/streak`의 `data`에 그대로 담깁니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreakSummary {
    pub current_streak: u32,
    pub longest_streak: u32,
    /// 한 번도 출시하지 않았다면 None (JSON에서는 null)
    pub last_ship_date: Option<NaiveDate>,
}

/// 출시 기록 목록으로 연속 출시 요약을 계산합니다.
///
/// 실패하지 않습니다. 같은 날짜가 중복되면 출시 수가 있는 쪽이 우선합니다.
pub fn compute_streak(records: &[ShipDay], today: NaiveDate) -> StreakSummary {
    if records.is_empty() {
        return StreakSummary::default();
    }

    let mut ascending: Vec<ShipDay> = records.to_vec();
    ascending.sort_by_key(|r| (r.date, r.ship_count));

    StreakSummary {
        current_streak: current_streak(&ascending, today),
        longest_streak: longest_streak(&ascending),
        last_ship_date: ascending.iter().rev().find(|r| r.shipped()).map(|r| r.date),
    }
}

/// 오늘부터 하루씩 거슬러 올라가며 연속 일수를 셉니다.
///
/// 미래 날짜 기록은 건너뜁니다.
fn current_streak(ascending: &[ShipDay], today: NaiveDate) -> u32 {
    let mut expected = today;
    let mut streak = 0;

    for record in ascending.iter().rev().filter(|r| r.date <= today) {
        if record.date > expected {
            // 같은 날짜 중복 (이미 센 날)
            continue;
        }
        if record.date != expected || !record.shipped() {
            break;
        }
        streak += 1;
        expected = match expected.checked_sub_days(Days::new(1)) {
            Some(prev) => prev,
            None => break,
        };
    }

    streak
}

/// 오름차순으로 훑으며 가장 긴 연속 구간을 찾습니다.
fn longest_streak(ascending: &[ShipDay]) -> u32 {
    let mut longest = 0;
    let mut running = 0;
    let mut last_ship: Option<NaiveDate> = None;

    for record in ascending.iter().filter(|r| r.shipped()) {
        running = match last_ship {
            Some(prev) if prev == record.date => running,
            Some(prev) if prev.succ_opt() == Some(record.date) => running + 1,
            _ => 1,
        };
        longest = longest.max(running);
        last_ship = Some(record.date);
    }

    longest
}
