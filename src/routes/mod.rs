//! # 라우트 핸들러 모듈
//!
//! HTTP 요청을 처리하는 핸들러 함수들을 모아둔 모듈입니다.
//! `/api/health`를 제외한 모든 핸들러는 `AuthUser` 추출기로 로그인한 사용자를 받습니다.
//!
//! 각 하위 모듈:
//! - `analytics`: 출시 기록, 연속 출시 일수, 일별 기록
//! - `habits`: 습관 CRUD와 체크
//! - `health`: 서버 상태 확인 (헬스체크)
//! - `notes`: 노트 CRUD와 검색
//! - `projects`: 프로젝트 CRUD와 모멘텀
//! - `sessions`: 코딩 세션 상태 전이, 경과 시간, 체크포인트
//! - `tracker`: 뮤지션 트래커 상태 조회와 동작 적용

pub mod analytics;
pub mod habits;
pub mod health;
pub mod notes;
pub mod projects;
pub mod sessions;
pub mod tracker;

use std::sync::Arc;

use axum::{
    routing::{get, patch, post, put},
    Router,
};
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db::kv::SqliteKvStore;
use crate::db::DbDurationSink;
use crate::services::timer::TimerRegistry;
use crate::services::tracker::UserLocks;

/// 애플리케이션 공유 상태
///
/// 모든 요청 핸들러가 `State(state): State<AppState>`로 접근합니다.
/// 내부 필드는 모두 clone이 가벼운 핸들입니다 (풀, Arc).
/// 요청 사이에 공유되는 가변 상태는 `timers`와 `tracker_locks`뿐입니다.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    /// JWT 검증용 공유 비밀키
    pub jwt_secret: String,
    /// 실행 중인 세션 타이머들
    pub timers: Arc<TimerRegistry>,
    pub duration_sink: Arc<DbDurationSink>,
    /// 트래커 상태 저장소
    pub kv: SqliteKvStore,
    /// 사용자별 트래커 쓰기 순서를 맞추는 잠금
    pub tracker_locks: Arc<UserLocks>,
    pub sync_every_ticks: u64,
    pub initial_context_health: i64,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: &Config) -> Self {
        Self {
            duration_sink: Arc::new(DbDurationSink::new(pool.clone())),
            kv: SqliteKvStore::new(pool.clone()),
            pool,
            jwt_secret: config.jwt_secret.clone(),
            timers: Arc::new(TimerRegistry::new()),
            tracker_locks: Arc::new(UserLocks::new()),
            sync_every_ticks: config.sync_every_ticks,
            initial_context_health: config.initial_context_health,
        }
    }
}

/// `/api` 아래에 붙일 라우터를 만듭니다.
pub fn api_router(state: AppState) -> Router {
    let session_routes = Router::new()
        .route(
            "/sessions",
            get(sessions::list_sessions).post(sessions::start_session),
        )
        .route(
            "/sessions/{id}",
            get(sessions::get_session).patch(sessions::update_session),
        )
        .route("/sessions/{id}/duration", put(sessions::sync_duration))
        .route(
            "/sessions/{id}/checkpoints",
            get(sessions::list_checkpoints).post(sessions::create_checkpoint),
        );

    let analytics_routes = Router::new()
        .route("/analytics/ship", post(analytics::record_ship))
        .route("/analytics/streak", get(analytics::get_streak))
        .route("/analytics/daily", get(analytics::get_daily));

    let habit_routes = Router::new()
        .route(
            "/habits",
            get(habits::list_habits).post(habits::create_habit),
        )
        .route(
            "/habits/{id}",
            patch(habits::update_habit).delete(habits::delete_habit),
        )
        .route(
            "/habits/{id}/check",
            post(habits::check_habit).delete(habits::uncheck_habit),
        );

    let note_routes = Router::new()
        .route("/notes", get(notes::list_notes).post(notes::create_note))
        .route(
            "/notes/{id}",
            get(notes::get_note)
                .patch(notes::update_note)
                .delete(notes::delete_note),
        );

    let project_routes = Router::new()
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/projects/{id}",
            get(projects::get_project)
                .patch(projects::update_project)
                .delete(projects::delete_project),
        );

    let tracker_routes = Router::new()
        .route(
            "/tracker",
            get(tracker::get_tracker).delete(tracker::reset_tracker),
        )
        .route("/tracker/actions", post(tracker::dispatch_action));

    Router::new()
        .merge(session_routes)
        .merge(analytics_routes)
        .merge(habit_routes)
        .merge(note_routes)
        .merge(project_routes)
        .merge(tracker_routes)
        .route("/health", get(health::health_check))
        .with_state(state)
}

/// 라우터 테스트 공용 도우미
#[cfg(test)]
pub(crate) mod test_support {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::middleware::auth::create_access_token;

    pub const SECRET: &str = "router-test-secret";

    pub struct TestApp {
        pub router: Router,
        pub state: AppState,
    }

    impl TestApp {
        pub async fn new() -> Self {
            let pool = crate::db::test_pool().await;
            let config = Config {
                database_url: "sqlite::memory:".into(),
                jwt_secret: SECRET.into(),
                host: "127.0.0.1".into(),
                port: 0,
                sync_every_ticks: 60,
                initial_context_health: 100,
            };
            let state = AppState::new(pool, &config);
            let router = Router::new().nest("/api", api_router(state.clone()));
            Self { router, state }
        }

        /// `user_id`로 서명한 토큰을 붙여 요청을 보내고 (상태 코드, 본문 JSON)을 돌려줍니다.
        pub async fn call(
            &self,
            method: Method,
            uri: &str,
            user_id: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(user_id) = user_id {
                let token =
                    create_access_token(user_id, SECRET, chrono::Duration::minutes(15)).unwrap();
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let request = match body {
                Some(json) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let json = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap_or(Value::Null)
            };
            (status, json)
        }

        pub async fn get(&self, uri: &str, user_id: &str) -> (StatusCode, Value) {
            self.call(Method::GET, uri, Some(user_id), None).await
        }

        pub async fn post(&self, uri: &str, user_id: &str, body: Value) -> (StatusCode, Value) {
            self.call(Method::POST, uri, Some(user_id), Some(body)).await
        }

        pub async fn patch(&self, uri: &str, user_id: &str, body: Value) -> (StatusCode, Value) {
            self.call(Method::PATCH, uri, Some(user_id), Some(body)).await
        }

        pub async fn put(&self, uri: &str, user_id: &str, body: Value) -> (StatusCode, Value) {
            self.call(Method::PUT, uri, Some(user_id), Some(body)).await
        }

        pub async fn delete(&self, uri: &str, user_id: &str) -> (StatusCode, Value) {
            self.call(Method::DELETE, uri, Some(user_id), None).await
        }
    }

    #[tokio::test]
    async fn health_needs_no_token() {
        let app = TestApp::new().await;
        let (status, body) = app.call(Method::GET, "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "ok");
    }

    #[tokio::test]
    async fn missing_token_is_401_envelope() {
        let app = TestApp::new().await;
        let (status, body) = app.call(Method::GET, "/api/notes", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "missing_token");
    }
}
