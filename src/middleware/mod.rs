//! # 요청 전처리
//!
//! - `auth`: Bearer JWT 검증과 `AuthUser` 추출기

pub mod auth;
