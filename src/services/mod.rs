//! # 도메인 로직
//!
//! DB나 HTTP에 묶이지 않는 계산과 백그라운드 작업입니다.
//! - `duration`: 세션 시간, 시간 포맷, 컨텍스트 건강도
//! - `filter`: 검색어 필터
//! - `momentum`: 프로젝트 모멘텀 분류
//! - `retry`: 지수 백오프 재시도
//! - `streak`: 연속 출시 일수 계산
//! - `timer`: 세션 타이머와 레지스트리
//! - `tracker`: 뮤지션 트래커 리듀서

pub mod duration;
pub mod filter;
pub mod momentum;
pub mod retry;
pub mod streak;
pub mod timer;
pub mod tracker;
