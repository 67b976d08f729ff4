//! # 데이터 모델 모듈
//!
//! DB 행(row)과 요청/응답 본문 구조체들을 도메인별로 나눠 둡니다.
//! - `analytics`: 하루 단위 출시 기록
//! - `habit`: 습관과 체크 기록
//! - `note`: 노트
//! - `project`: 프로젝트와 모멘텀
//! - `session`: 코딩 세션, 상태 전이, 체크포인트
//! - `tracker`: 뮤지션 트래커 (일정, 할 일, 리듀서 동작)

pub mod analytics;
pub mod habit;
pub mod note;
pub mod project;
pub mod session;
pub mod tracker;

pub use analytics::*;
pub use habit::*;
pub use note::*;
pub use project::*;
pub use session::*;
pub use tracker::*;

use serde::{Deserialize, Deserializer};

/// PATCH 요청에서 "필드 없음"과 "null"을 구분하기 위한 역직렬화 함수
///
/// `#[serde(default, deserialize_with = "double_option")]`와 함께 씁니다.
/// - 필드 없음 → `None` (변경 안 함)
/// - `null` → `Some(None)` (값 지우기)
/// - 값 → `Some(Some(v))`
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
