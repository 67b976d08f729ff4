//! # devpulse 웹 서버 진입점
//!
//! 이 파일이 수행하는 작업:
//! 1. 환경변수(.env) 로딩
//! 2. 로깅(tracing) 초기화
//! 3. SQLite 데이터베이스 연결 풀 생성과 마이그레이션
//! 4. 공유 상태(AppState)와 API 라우터 설정
//! 5. HTTP 서버 시작, 종료 신호를 받으면 세션 타이머 정리

// ── 모듈 선언 ──
mod config;
mod db;
mod error;
mod extract;
mod middleware;
mod models;
mod response;
mod routes;
mod services;

use std::path::Path;

use anyhow::Result;
use axum::Router;
use config::Config;
use routes::AppState;
use services::timer::DurationSink;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 빌드된 대시보드 프론트엔드 위치 (있을 때만 같은 서버에서 서빙)
const FRONTEND_DIST: &str = "../frontend/dist";

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1단계: 환경변수 로딩 ──
    // .env 파일이 없어도 에러 없이 넘어갑니다.
    dotenvy::dotenv().ok();

    // ── 2단계: 로깅(tracing) 초기화 ──
    // RUST_LOG가 없으면 devpulse, tower_http, axum 모듈을 debug 레벨로 출력합니다.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "devpulse=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // ── 3단계: 설정 로딩 ──
    let config = Config::from_env()?;
    tracing::info!("Starting devpulse server on {}:{}", config.host, config.port);

    // ── 4단계: SQLite 연결 풀 생성과 마이그레이션 ──
    let pool = db::connect(&config.database_url).await?;
    tracing::info!("Running database migrations...");
    db::migrate(&pool).await?;

    // ── 5단계: 애플리케이션 상태(State) 생성 ──
    // 세션 타이머 레지스트리도 여기서 만들어져 모든 핸들러가 공유합니다.
    let state = AppState::new(pool, &config);
    let timers = state.timers.clone();
    let duration_sink = state.duration_sink.clone();

    // ── 6단계: 라우터 설정 ──
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = routes::api_router(state);

    let app = if Path::new(FRONTEND_DIST).exists() {
        tracing::info!("Serving frontend static files from {}", FRONTEND_DIST);

        // SPA이므로 찾을 수 없는 경로는 index.html로 돌려보냅니다.
        let serve_dir = ServeDir::new(FRONTEND_DIST)
            .not_found_service(ServeFile::new(format!("{FRONTEND_DIST}/index.html")));

        Router::new()
            .nest("/api", api_routes)
            .fallback_service(serve_dir)
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    } else {
        tracing::warn!("Frontend dist directory not found, serving API only");

        Router::new()
            .nest("/api", api_routes)
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    };

    // ── 7단계: 서버 시작 ──
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 실행 중이던 타이머를 멈추고, 마지막 동기화 이후의 경과 시간까지 저장합니다.
    let stopped = timers.stop_all().await;
    tracing::info!("Stopped {} session timer(s)", stopped.len());
    for (session_id, elapsed) in stopped {
        if let Err(e) = duration_sink.persist(&session_id, elapsed).await {
            tracing::warn!(session_id = %session_id, "Failed to save final duration: {}", e);
        }
    }

    Ok(())
}

/// Ctrl+C를 기다립니다.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        // 신호를 받을 수 없으면 종료하지 않고 계속 서빙합니다.
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
