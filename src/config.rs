//! # 애플리케이션 설정(Configuration) 모듈
//!
//! 환경변수(또는 `.env` 파일)에서 서버 설정값을 읽어옵니다.
//!
//! 설정 항목:
//! - `DATABASE_URL`: SQLite 데이터베이스 경로 (필수)
//! - `JWT_SECRET`: 인증 제공자와 공유하는 JWT 서명 키 (필수)
//! - `HOST` / `PORT`: 서버 바인딩 주소와 포트
//! - `SYNC_EVERY_TICKS`: 세션 타이머가 몇 tick(초)마다 경과 시간을 저장할지
//! - `INITIAL_CONTEXT_HEALTH`: 새 세션의 컨텍스트 건강도 시작값 (0~100)

use std::env;

/// 세션 타이머의 기본 동기화 주기 (60 tick = 1분)
pub const DEFAULT_SYNC_EVERY_TICKS: u64 = 60;

/// 컨텍스트 건강도의 최댓값이자 기본 시작값
pub const MAX_CONTEXT_HEALTH: i64 = 100;

/// 애플리케이션 전체 설정
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    /// 0이면 동기화를 끄는 대신 기본값으로 대체됩니다.
    pub sync_every_ticks: u64,
    pub initial_context_health: i64,
}

impl Config {
    /// 환경변수에서 설정값을 읽어 Config를 생성합니다.
    ///
    /// # 에러
    /// `DATABASE_URL`과 `JWT_SECRET`이 없으면 `VarError`를 반환합니다.
    /// 나머지 항목은 값이 없거나 파싱에 실패하면 기본값을 사용합니다.
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            jwt_secret: env::var("JWT_SECRET")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            sync_every_ticks: env::var("SYNC_EVERY_TICKS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n: &u64| n > 0)
                .unwrap_or(DEFAULT_SYNC_EVERY_TICKS),
            initial_context_health: env::var("INITIAL_CONTEXT_HEALTH")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .map(|h| h.clamp(0, MAX_CONTEXT_HEALTH))
                .unwrap_or(MAX_CONTEXT_HEALTH),
        })
    }
}
