//! # 요청 추출기
//!
//! axum 기본 `Json`/`Query`와 같지만, 파싱에 실패하면
//! `AppError`의 실패 봉투로 응답합니다.

use axum::extract::FromRequest;
use axum::extract::FromRequestParts;

use crate::error::AppError;

/// JSON 본문
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// 쿼리 문자열
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);
