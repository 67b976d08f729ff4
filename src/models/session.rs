//! # 코딩 세션 모델 정의
//!
//! 사용자가 "지금부터 작업 시작"을 누르면 세션이 만들어지고,
//! 일시정지/재개/체크포인트/종료 동작으로 상태가 바뀝니다.
//!
//! ## 상태 전이
//! ```text
//! ACTIVE ──▶ PAUSED ──▶ ACTIVE
//!   │           │
//!   ├──▶ COMPLETED ◀──┤
//!   └──▶ ABANDONED ◀──┘
//! ```
//! COMPLETED와 ABANDONED는 종료 상태입니다. 종료 후에는 `duration_seconds`가
//! `ended_at - started_at`으로 고정되고 더 이상 바뀌지 않습니다.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// 세션 상태 — DB에는 `'ACTIVE'` 같은 대문자 문자열로 저장됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Active,
    Paused,
    Completed,
    Abandoned,
}

impl SessionStatus {
    /// 종료 상태인지 (더 이상 전이할 수 없음)
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Abandoned)
    }

    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        use SessionStatus::*;
        matches!(
            (self, next),
            (Active, Paused | Completed | Abandoned) | (Paused, Active | Completed | Abandoned)
        )
    }

    /// 전이를 검사하고, 허용되지 않으면 409 Conflict를 돌려줍니다.
    pub fn transition(self, next: SessionStatus) -> Result<SessionStatus, AppError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(AppError::Conflict(format!(
                "Cannot move session from {} to {}",
                self.as_str(),
                next.as_str()
            )))
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Active => "ACTIVE",
            SessionStatus::Paused => "PAUSED",
            SessionStatus::Completed => "COMPLETED",
            SessionStatus::Abandoned => "ABANDONED",
        }
    }
}

/// 코딩 세션 엔티티 — `coding_sessions` 테이블 한 행
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CodingSession {
    pub id: String,
    pub user_id: String,
    pub project_id: Option<String>,
    pub title: Option<String>,
    pub status: SessionStatus,
    pub started_at: String,
    /// None이면 아직 끝나지 않은 세션
    pub ended_at: Option<String>,
    /// 진행 중에는 외부에서 누적한 경과 시간, 종료 후에는 `ended_at - started_at`
    pub duration_seconds: i64,
    pub initial_health: i64,
    pub checkpoint_elapsed: i64,
}

/// 세션 응답 — 저장된 값에 표시용 계산값을 덧붙입니다.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub session: CodingSession,
    /// 화면에 보여줄 시간(초). 실행 중인 타이머가 있으면 그 값을 씁니다.
    pub elapsed_seconds: i64,
    /// `"1h 2m"` 형식
    pub formatted_duration: String,
    /// 0~100
    pub context_health: i64,
    pub timer_running: bool,
}

/// 세션 체크포인트 — `session_checkpoints` 테이블 한 행
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SessionCheckpoint {
    pub id: String,
    pub session_id: String,
    pub note: String,
    pub elapsed_seconds: i64,
    pub created_at: String,
}

/// `POST /api/sessions`
#[derive(Debug, Default, Deserialize)]
pub struct StartSessionRequest {
    pub title: Option<String>,
    pub project_id: Option<String>,
    /// 없으면 서버 설정값(INITIAL_CONTEXT_HEALTH)
    pub initial_health: Option<i64>,
}

/// 세션에 가할 수 있는 동작
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionAction {
    Pause,
    Resume,
    Complete,
    Abandon,
}

impl SessionAction {
    pub fn target(self) -> SessionStatus {
        match self {
            SessionAction::Pause => SessionStatus::Paused,
            SessionAction::Resume => SessionStatus::Active,
            SessionAction::Complete => SessionStatus::Completed,
            SessionAction::Abandon => SessionStatus::Abandoned,
        }
    }
}

/// `PATCH /api/sessions/{id}` — `{ "action": "pause" }`
#[derive(Debug, Deserialize)]
pub struct UpdateSessionRequest {
    pub action: SessionAction,
    /// 클라이언트가 따로 센 경과 시간 (서버 타이머가 없을 때만 사용)
    pub duration_seconds: Option<i64>,
}

/// `PUT /api/sessions/{id}/duration`
#[derive(Debug, Deserialize)]
pub struct SyncDurationRequest {
    pub duration_seconds: i64,
}

/// `POST /api/sessions/{id}/checkpoints`
#[derive(Debug, Deserialize)]
pub struct CreateCheckpointRequest {
    pub note: String,
}

/// `GET /api/sessions?status=ACTIVE`
#[derive(Debug, Default, Deserialize)]
pub struct ListSessionsQuery {
    pub status: Option<SessionStatus>,
}
