//! # 에러 처리 모듈
//!
//! 애플리케이션에서 발생할 수 있는 에러 종류를 하나의 `AppError`로 모읍니다.
//! 핸들러가 `Result<T, AppError>`를 반환하면 Axum이 `IntoResponse`를 통해
//! 아래 형태의 실패 봉투(envelope)로 변환합니다.
//!
//! ```text
//! { "success": false, "error": { "code": "...", "message": "...", "fields": {...} } }
//! ```
//!
//! ## 분류
//! - 검증 에러(422): 필드별 메시지를 `fields`에 담아 즉시 반환
//! - 권한 에러(403): 리소스 소유자가 아님. 401은 인증 추출기(`AuthError`)가 직접 응답합니다.
//! - 조회 실패(404), 충돌(409)
//! - 저장소 에러(500): 원인은 로그에만 남기고 클라이언트에는 일반 메시지

use std::collections::BTreeMap;
use std::fmt;

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// 필드 이름 → 에러 메시지 모음
///
/// `BTreeMap`을 쓰므로 응답 JSON의 필드 순서가 항상 같습니다.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// 필드 에러를 추가합니다. 같은 필드에 여러 번 추가하면 처음 메시지가 유지됩니다.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// 에러가 하나도 없으면 `Ok(())`, 있으면 `AppError::Validation`을 반환합니다.
    ///
    /// 핸들러에서 `errors.into_result()?;` 한 줄로 검증을 마무리할 때 사용합니다.
    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// 애플리케이션에서 발생할 수 있는 모든 에러 종류
#[derive(Debug, Error)]
pub enum AppError {
    /// 요청한 리소스를 찾을 수 없음 (HTTP 404)
    #[error("Resource not found")]
    NotFound,

    /// 형식이 잘못된 요청 (HTTP 400) — 쿼리 파라미터 파싱 실패 등
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 필드 단위 검증 실패 (HTTP 422)
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// 인증은 되었지만 리소스 소유자가 아님 (HTTP 403)
    #[error("Forbidden")]
    Forbidden,

    /// 리소스 충돌 (HTTP 409) — 중복, 허용되지 않는 상태 전이 등
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 서버 내부 오류 (HTTP 500)
    #[error("Internal error: {0}")]
    Internal(String),

    /// 데이터베이스 오류 (HTTP 500)
    /// #[from] 덕분에 sqlx 호출 뒤의 `?`가 자동으로 이 variant로 변환됩니다.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// JSON 직렬화 오류 (HTTP 500) — KV 저장소 값 읽기/쓰기에서 발생
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl AppError {
    /// 단일 필드 검증 에러를 바로 만드는 편의 함수
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        AppError::Validation(errors)
    }

    /// HTTP 상태 코드와 기계가 읽을 에러 코드
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::Serde(_) => (StatusCode::INTERNAL_SERVER_ERROR, "serialization_error"),
        }
    }
}

/// `AppJson` 본문 파싱 실패 — 타입이 맞지 않으면 422, 그 외에는 400
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => AppError::invalid("body", e.body_text()),
            other => AppError::BadRequest(other.body_text()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::invalid("query", rejection.body_text())
    }
}

impl IntoResponse for AppError {
    /// AppError를 실패 봉투 JSON 응답으로 변환합니다.
    ///
    /// 500 계열 에러는 실제 원인을 `tracing::error!`로 기록하고,
    /// 클라이언트에는 일반적인 메시지만 돌려줍니다.
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::NotFound | AppError::Forbidden => self.to_string(),
            AppError::BadRequest(msg) | AppError::Conflict(msg) => msg.clone(),
            AppError::Validation(_) => "One or more fields are invalid".to_string(),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                "A database error occurred".to_string()
            }
            AppError::Serde(e) => {
                tracing::error!("Serialization error: {}", e);
                "A serialization error occurred".to_string()
            }
        };

        let mut error = json!({
            "code": code,
            "message": message,
        });
        if let AppError::Validation(fields) = &self {
            error["fields"] = json!(fields);
        }

        let body = Json(json!({
            "success": false,
            "error": error,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_keep_first_message() {
        let mut errors = FieldErrors::new();
        errors.add("name", "Name is required");
        errors.add("name", "Name is too long");
        assert_eq!(errors.get("name"), Some("Name is required"));
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn empty_field_errors_pass() {
        assert!(FieldErrors::new().into_result().is_ok());
    }

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(AppError::NotFound.status_and_code().0, StatusCode::NOT_FOUND);
        assert_eq!(AppError::Forbidden.status_and_code().0, StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::invalid("title", "required").status_and_code().0,
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Conflict("dup".into()).status_and_code().0,
            StatusCode::CONFLICT
        );
    }

    #[tokio::test]
    async fn validation_response_carries_fields() {
        let response = AppError::invalid("title", "Title is required").into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "validation_error");
        assert_eq!(body["error"]["fields"]["title"], "Title is required");
    }
}
