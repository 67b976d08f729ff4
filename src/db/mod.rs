//! # 데이터베이스 접근 계층 (Data Access Layer)
//!
//! 라우트 핸들러(routes/)는 이 모듈의 함수로만 DB에 접근합니다.
//!
//! 각 하위 모듈:
//! - `analytics`: 하루 단위 출시 기록 (upsert)
//! - `habits`: 습관 CRUD와 체크 기록
//! - `kv`: 문자열 키 → JSON 값 저장소 (트래커 상태)
//! - `notes`: 노트 CRUD
//! - `projects`: 프로젝트 CRUD와 마지막 활동 시각
//! - `sessions`: 코딩 세션, 체크포인트, 타이머 동기화

pub mod analytics;
pub mod habits;
pub mod kv;
pub mod notes;
pub mod projects;
pub mod sessions;

pub use analytics::*;
pub use habits::*;
pub use notes::*;
pub use projects::*;
pub use sessions::*;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

/// SQLite 연결 풀을 만듭니다.
///
/// 파일이 없으면 새로 만들고, 외래키 제약(ON DELETE CASCADE / SET NULL)을 켭니다.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

/// `migrations/` 폴더의 SQL을 아직 적용되지 않은 것부터 순서대로 실행합니다.
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// 테스트용 인메모리 DB
///
/// 인메모리 SQLite는 연결마다 별도 DB이므로, 연결 하나를 닫지 않고 계속 씁니다.
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();
    migrate(&pool).await.unwrap();
    pool
}
